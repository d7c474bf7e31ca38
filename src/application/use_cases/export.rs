use crate::domain::error::{AppError, Result};
use crate::domain::test_scenario::ResultSet;
use chrono::{DateTime, Local};
use std::fmt::Write;

pub const SPREADSHEET_HEADERS: [&str; 12] = [
    "Test Case ID",
    "Test Objective",
    "Test Case Description",
    "Scenario Type",
    "Priority",
    "Precondition",
    "Steps",
    "Test Data",
    "Expected Result",
    "Actual Result",
    "Status",
    "Comments",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Text,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(AppError::ValidationError(format!("Unknown export format: {}", other))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Text => "text/plain; charset=utf-8",
        }
    }

    pub fn file_name(&self) -> String {
        format!("test_scenarios.{}", self.extension())
    }
}

/// Renders `result` in `format`. Text reports are stamped with the current local time.
pub fn render(result: &ResultSet, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => to_csv(result),
        ExportFormat::Json => to_pretty_json(result),
        ExportFormat::Text => Ok(to_text_report(result, &Local::now())),
    }
}

/// Header row followed by one row per scenario, steps joined by newlines.
pub fn spreadsheet_rows(result: &ResultSet) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(result.len() + 1);
    rows.push(SPREADSHEET_HEADERS.iter().map(|h| h.to_string()).collect());

    for scenario in result.scenarios() {
        rows.push(vec![
            scenario.id.clone(),
            scenario.objective.clone(),
            scenario.description.clone(),
            scenario.scenario_type.clone(),
            scenario.priority.as_str().to_string(),
            scenario.precondition.clone(),
            scenario.steps.join("\n"),
            scenario.test_data.clone(),
            scenario.expected_result.clone(),
            scenario.actual_result.clone(),
            scenario.status.as_str().to_string(),
            scenario.comments.clone(),
        ]);
    }

    rows
}

pub fn to_csv(result: &ResultSet) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in spreadsheet_rows(result) {
        writer
            .write_record(&row)
            .map_err(|e| AppError::Internal(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))
}

pub fn to_pretty_json(result: &ResultSet) -> Result<String> {
    serde_json::to_string_pretty(result)
        .map_err(|e| AppError::Internal(format!("Failed to serialize scenarios: {}", e)))
}

pub fn to_text_report(result: &ResultSet, generated_on: &DateTime<Local>) -> String {
    let summary = result.summary();
    let mut text = String::new();

    writeln!(text, "TEST SCENARIOS GENERATION REPORT").unwrap();
    writeln!(text, "Generated on: {}", generated_on.format("%Y-%m-%d %H:%M:%S")).unwrap();
    writeln!(text, "Total Scenarios: {}", summary.total).unwrap();
    writeln!(text, "Edge Cases: {}\n", summary.edge_case_count).unwrap();
    writeln!(text, "TEST SCENARIOS:").unwrap();

    for (index, scenario) in result.scenarios().iter().enumerate() {
        writeln!(text, "\n{}. Test Case ID: {}", index + 1, scenario.id).unwrap();
        writeln!(text, "   Test Objective: {}", scenario.objective).unwrap();
        writeln!(text, "   TESTCASE: {}", scenario.description).unwrap();
        writeln!(text, "   Precondition: {}", scenario.precondition).unwrap();
        writeln!(text, "   Steps:").unwrap();
        for (step_index, step) in scenario.steps.iter().enumerate() {
            writeln!(text, "     {}. {}", step_index + 1, step).unwrap();
        }
        writeln!(text, "   Test Data: {}", scenario.test_data).unwrap();
        writeln!(text, "   Expected Result: {}", scenario.expected_result).unwrap();
        writeln!(text, "   Actual Result: {}", scenario.actual_result).unwrap();
        writeln!(text, "   STATUS: {}", scenario.status.as_str()).unwrap();
        writeln!(text, "   Scenario Type: {}", scenario.scenario_type).unwrap();
        writeln!(text, "   Comments: {}", scenario.comments).unwrap();
    }

    text
}
