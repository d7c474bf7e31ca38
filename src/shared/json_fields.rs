//! Lenient readers over `serde_json::Value`.
//!
//! LLM output and scraped page descriptors are untrusted: any key may be absent
//! or carry the wrong type. These helpers turn "wrong type" into "absent" so the
//! callers can apply their own defaults.

use serde_json::Value;

/// Renders scalars as text. Objects, arrays and `null` yield `None`.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn text_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(value_to_text)
}

/// Like [`text_field`], but treats whitespace-only text as absent.
pub fn non_blank_field(value: &Value, key: &str) -> Option<String> {
    text_field(value, key).filter(|text| !text.trim().is_empty())
}

/// Reads a list of scalars. A lone scalar becomes a one-element list.
pub fn text_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(value_to_text).collect(),
        Some(other) => value_to_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

pub fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Length of an array field, or the value of a numeric one.
pub fn count_field(value: &Value, key: &str) -> usize {
    match value.get(key) {
        Some(Value::Array(items)) => items.len(),
        Some(Value::Number(number)) => number.as_u64().unwrap_or(0) as usize,
        _ => 0,
    }
}
