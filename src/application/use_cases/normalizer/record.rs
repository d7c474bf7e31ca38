use crate::domain::test_scenario::{synthetic_id, Priority, TestScenario, DEFAULT_SCENARIO_TYPE, NOT_RUN};
use crate::shared::json_fields::{array_field, non_blank_field, text_field, text_list};
use serde_json::Value;

pub(super) fn fallback_objective(position: usize) -> String {
    format!("Test Case {}", position)
}

/// Scenarios from a decoded vendor document, or `None` when there are none.
pub(super) fn scenarios_from_document(document: &Value) -> Option<Vec<TestScenario>> {
    let scenarios: Vec<TestScenario> = array_field(document, "testScenarios")
        .iter()
        .enumerate()
        .filter_map(|(index, item)| scenario_from_value(item, index + 1))
        .collect();

    if scenarios.is_empty() {
        None
    } else {
        Some(scenarios)
    }
}

/// Builds one scenario, defaulting every absent or mistyped field.
/// Non-object entries are skipped. Status always starts as not run.
pub(super) fn scenario_from_value(item: &Value, position: usize) -> Option<TestScenario> {
    if !item.is_object() {
        return None;
    }

    let id = non_blank_field(item, "testCaseID").unwrap_or_else(|| synthetic_id(position));
    let objective = text_field(item, "testObjective").unwrap_or_else(|| fallback_objective(position));
    let steps: Vec<String> = text_list(item, "steps")
        .into_iter()
        .filter(|step| !step.trim().is_empty())
        .collect();

    let mut scenario = TestScenario::new(id, objective).with_steps(steps);
    scenario.description = text_field(item, "testCaseDescription").unwrap_or_default();
    scenario.precondition = text_field(item, "precondition").unwrap_or_default();
    scenario.test_data = text_field(item, "testData").unwrap_or_default();
    scenario.expected_result = text_field(item, "expectedResult").unwrap_or_default();
    scenario.actual_result = non_blank_field(item, "actualResult").unwrap_or_else(|| NOT_RUN.to_string());
    scenario.scenario_type =
        non_blank_field(item, "scenarioType").unwrap_or_else(|| DEFAULT_SCENARIO_TYPE.to_string());
    scenario.priority = text_field(item, "priority")
        .map(|label| Priority::parse_lenient(&label))
        .unwrap_or_default();
    scenario.comments = text_field(item, "comments").unwrap_or_default();

    Some(scenario)
}
