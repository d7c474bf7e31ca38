//! Field-by-field recovery when no decodable document exists.
//!
//! Every `"testCaseID": "..."` occurrence in the unsliced input anchors one
//! scenario. The other fields are looked up in a window around the anchor:
//! first in the text after it (up to 2000 bytes, stopping at the `}` that
//! closes the anchor's object or at the next anchor), then in the text before
//! it (up to 1000 bytes, starting after the last `}` since the previous
//! anchor), taking the occurrence nearest the anchor.

use super::record::fallback_objective;
use super::Attempt;
use crate::domain::test_scenario::{synthetic_id, Priority, TestScenario, DEFAULT_SCENARIO_TYPE};
use crate::shared::text::{ceil_char_boundary, floor_char_boundary};
use once_cell::sync::Lazy;
use regex::Regex;

const WINDOW_BEFORE: usize = 1000;
const WINDOW_AFTER: usize = 2000;

static TEST_CASE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"testCaseID"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());

static STEPS_OPEN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)"steps"\s*:\s*\["#).unwrap());

static QUOTED_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap());

struct FieldPatterns {
    objective: Regex,
    description: Regex,
    precondition: Regex,
    test_data: Regex,
    expected_result: Regex,
    actual_result: Regex,
    scenario_type: Regex,
    priority: Regex,
    comments: Regex,
}

static FIELDS: Lazy<FieldPatterns> = Lazy::new(|| FieldPatterns {
    objective: string_field_pattern("testObjective"),
    description: string_field_pattern("testCaseDescription"),
    precondition: string_field_pattern("precondition"),
    test_data: string_field_pattern("testData"),
    expected_result: string_field_pattern("expectedResult"),
    actual_result: string_field_pattern("actualResult"),
    scenario_type: string_field_pattern("scenarioType"),
    priority: string_field_pattern("priority"),
    comments: string_field_pattern("comments"),
});

fn string_field_pattern(name: &str) -> Regex {
    Regex::new(&format!(r#"(?i)"{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, name)).unwrap()
}

/// Text around one anchor, split at the anchor itself.
struct Window<'a> {
    ahead: &'a str,
    behind: &'a str,
}

impl Window<'_> {
    fn string(&self, pattern: &Regex) -> Option<String> {
        pattern
            .captures(self.ahead)
            .or_else(|| pattern.captures_iter(self.behind).last())
            .and_then(|caps| caps.get(1))
            .map(|value| unescape(value.as_str()))
    }

    fn steps(&self) -> Vec<String> {
        extract_steps(self.ahead)
            .or_else(|| extract_steps(self.behind))
            .unwrap_or_default()
    }
}

pub(super) fn attempt(raw: &str) -> Attempt {
    let anchors: Vec<(usize, usize, String)> = TEST_CASE_ID_PATTERN
        .captures_iter(raw)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(1).map(|id| unescape(id.as_str())).unwrap_or_default();
            Some((whole.start(), whole.end(), id))
        })
        .collect();

    if anchors.is_empty() {
        return Attempt::declined("no testCaseID occurrences");
    }

    let scenarios = anchors
        .iter()
        .enumerate()
        .map(|(index, (start, end, id))| {
            let previous_end = if index == 0 { 0 } else { anchors[index - 1].1 };
            let next_start = anchors.get(index + 1).map_or(raw.len(), |next| next.0);

            let object_start = previous_end + last_closing_brace(&raw[previous_end..*start]);
            let object_end = end + closing_brace(&raw[*end..next_start]);

            let ahead_end = ceil_char_boundary(raw, (start + WINDOW_AFTER).min(object_end).max(*end));
            let behind_start =
                floor_char_boundary(raw, start.saturating_sub(WINDOW_BEFORE).max(object_start));
            let window = Window {
                ahead: &raw[*end..ahead_end],
                behind: &raw[behind_start..*start],
            };

            build_scenario(&window, id, index + 1)
        })
        .collect();

    Attempt::Accepted(scenarios)
}

fn build_scenario(window: &Window<'_>, id: &str, position: usize) -> TestScenario {
    let fields = &*FIELDS;
    let id = if id.trim().is_empty() {
        synthetic_id(position)
    } else {
        id.trim().to_string()
    };
    let objective = window
        .string(&fields.objective)
        .unwrap_or_else(|| fallback_objective(position));

    let mut scenario = TestScenario::new(id, objective).with_steps(window.steps());
    scenario.description = window.string(&fields.description).unwrap_or_default();
    scenario.precondition = window.string(&fields.precondition).unwrap_or_default();
    scenario.test_data = window.string(&fields.test_data).unwrap_or_default();
    scenario.expected_result = window.string(&fields.expected_result).unwrap_or_default();
    if let Some(actual) = window.string(&fields.actual_result).filter(|value| !value.trim().is_empty()) {
        scenario.actual_result = actual;
    }
    scenario.scenario_type = window
        .string(&fields.scenario_type)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SCENARIO_TYPE.to_string());
    scenario.priority = window
        .string(&fields.priority)
        .map(|label| Priority::parse_lenient(&label))
        .unwrap_or_default();
    scenario.comments = window.string(&fields.comments).unwrap_or_default();
    scenario
}

/// Items of the first `"steps": [ ... ]` list in `text`, `None` without one.
///
/// Quoted items are preferred so commas inside a step survive; an unquoted
/// list falls back to a plain comma split.
fn extract_steps(text: &str) -> Option<Vec<String>> {
    let open = STEPS_OPEN_PATTERN.find(text)?;
    let body = bracket_body(&text[open.end()..]);

    let quoted: Vec<String> = QUOTED_PATTERN
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|item| unescape(item.as_str()))
        .filter(|item| !item.trim().is_empty())
        .collect();
    if !quoted.is_empty() {
        return Some(quoted);
    }

    Some(
        body.split(',')
            .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

// Text up to the `]` that closes the list, ignoring brackets inside strings.
// An unclosed list runs to the end of the text.
fn bracket_body(text: &str) -> &str {
    match unquoted_chars(text).find(|&(_, c)| c == ']') {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

// Offset of the `}` closing the object that `text` starts inside, skipping
// nested objects. Without one the whole text counts.
fn closing_brace(text: &str) -> usize {
    let mut depth = 0usize;
    for (index, c) in unquoted_chars(text) {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return index,
            '}' => depth -= 1,
            _ => {}
        }
    }
    text.len()
}

// Offset just past the last `}` in `text`, or 0.
fn last_closing_brace(text: &str) -> usize {
    unquoted_chars(text)
        .filter(|&(_, c)| c == '}')
        .last()
        .map_or(0, |(index, _)| index + 1)
}

/// Characters of `text` outside double-quoted strings. `text` must not start
/// inside a string.
fn unquoted_chars(text: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut in_string = false;
    let mut escaped = false;
    text.char_indices().filter(move |&(_, c)| {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            false
        } else if c == '"' {
            in_string = true;
            false
        } else {
            true
        }
    })
}

fn unescape(value: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", value))
        .unwrap_or_else(|_| value.replace("\\\"", "\""))
}
