use crate::domain::test_scenario::{Priority, TestScenario};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityBreakdown {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    fn record(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "totalScenarios")]
    pub total: usize,
    #[serde(rename = "functionalTests")]
    pub functional_count: usize,
    #[serde(rename = "edgeCases")]
    pub edge_case_count: usize,
    #[serde(rename = "priorityBreakdown")]
    pub priority_breakdown: PriorityBreakdown,
}

/// Recomputes the aggregate from scratch on every call.
pub fn summarize(scenarios: &[TestScenario]) -> Summary {
    let mut summary = Summary {
        total: scenarios.len(),
        ..Summary::default()
    };

    for scenario in scenarios {
        match classify(&scenario.scenario_type) {
            ScenarioClass::Functional => summary.functional_count += 1,
            ScenarioClass::EdgeCase => summary.edge_case_count += 1,
            ScenarioClass::Other => {}
        }
        summary.priority_breakdown.record(scenario.priority);
    }

    summary
}

enum ScenarioClass {
    Functional,
    EdgeCase,
    Other,
}

// "Positive" scenarios count as functional.
fn classify(scenario_type: &str) -> ScenarioClass {
    let key: String = scenario_type
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match key.as_str() {
        "functional" | "positive" => ScenarioClass::Functional,
        "edgecase" | "edgecases" | "boundary" => ScenarioClass::EdgeCase,
        _ => ScenarioClass::Other,
    }
}
