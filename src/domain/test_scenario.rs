use crate::domain::summary::{summarize, Summary};
use serde::{Deserialize, Serialize};

/// Value of `actualResult` (and the status label) before a scenario is executed.
pub const NOT_RUN: &str = "NOT RUN";
/// Step used when a scenario arrives without any steps.
pub const DEFAULT_STEP: &str = "1. Execute test case";
pub const DEFAULT_SCENARIO_TYPE: &str = "Functional";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Unknown or blank labels fall back to `Medium`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" | "p1" => Priority::High,
            "low" | "p3" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        Priority::parse_lenient(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ScenarioStatus {
    #[default]
    #[serde(rename = "NOT RUN")]
    NotRun,
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "BLOCKED")]
    Blocked,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::NotRun => NOT_RUN,
            ScenarioStatus::Pass => "PASS",
            ScenarioStatus::Fail => "FAIL",
            ScenarioStatus::Blocked => "BLOCKED",
        }
    }

    pub fn parse_lenient(value: &str) -> Self {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "pass" | "passed" => ScenarioStatus::Pass,
            "fail" | "failed" => ScenarioStatus::Fail,
            "blocked" => ScenarioStatus::Blocked,
            _ => ScenarioStatus::NotRun,
        }
    }
}

impl From<String> for ScenarioStatus {
    fn from(value: String) -> Self {
        ScenarioStatus::parse_lenient(&value)
    }
}

/// One row of generated QA output, serialized with the vendor field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScenario {
    #[serde(rename = "testCaseID")]
    pub id: String,
    #[serde(rename = "testObjective", default)]
    pub objective: String,
    #[serde(rename = "testCaseDescription", default)]
    pub description: String,
    #[serde(default)]
    pub precondition: String,
    #[serde(default = "default_steps")]
    pub steps: Vec<String>,
    #[serde(default)]
    pub test_data: String,
    #[serde(default)]
    pub expected_result: String,
    #[serde(default = "not_run_label")]
    pub actual_result: String,
    #[serde(default)]
    pub status: ScenarioStatus,
    #[serde(default = "default_scenario_type")]
    pub scenario_type: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub comments: String,
}

impl TestScenario {
    pub fn new(id: impl Into<String>, objective: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            objective: objective.into(),
            description: String::new(),
            precondition: String::new(),
            steps: default_steps(),
            test_data: String::new(),
            expected_result: String::new(),
            actual_result: not_run_label(),
            status: ScenarioStatus::NotRun,
            scenario_type: default_scenario_type(),
            priority: Priority::Medium,
            comments: String::new(),
        }
    }

    /// Replaces the steps, keeping the synthetic step when `steps` is empty.
    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = if steps.is_empty() { default_steps() } else { steps };
        self
    }
}

/// Sequential identifier used when a vendor id is missing: `TS001`, `TS002`, ...
pub fn synthetic_id(position: usize) -> String {
    format!("TS{:03}", position)
}

fn default_steps() -> Vec<String> {
    vec![DEFAULT_STEP.to_string()]
}

fn not_run_label() -> String {
    NOT_RUN.to_string()
}

fn default_scenario_type() -> String {
    DEFAULT_SCENARIO_TYPE.to_string()
}

/// Output of one generation run. The summary is always derived from `scenarios`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResultSetInput")]
pub struct ResultSet {
    #[serde(rename = "testScenarios")]
    scenarios: Vec<TestScenario>,
    summary: Summary,
}

#[derive(Deserialize)]
struct ResultSetInput {
    #[serde(rename = "testScenarios", default)]
    scenarios: Vec<TestScenario>,
}

impl From<ResultSetInput> for ResultSet {
    fn from(input: ResultSetInput) -> Self {
        ResultSet::new(input.scenarios)
    }
}

impl ResultSet {
    pub fn new(scenarios: Vec<TestScenario>) -> Self {
        let summary = summarize(&scenarios);
        Self { scenarios, summary }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn scenarios(&self) -> &[TestScenario] {
        &self.scenarios
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// `true` is the user-visible "no scenarios generated" state, not an error.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn into_scenarios(self) -> Vec<TestScenario> {
        self.scenarios
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::empty()
    }
}
