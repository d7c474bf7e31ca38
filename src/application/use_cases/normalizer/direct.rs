use super::record::scenarios_from_document;
use super::Attempt;
use serde_json::Value;

/// Text between the first `{` and the last `}`, inclusive.
pub(super) fn boundary_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Strict decode of a candidate document.
pub(super) fn decode_candidate(candidate: &str) -> Attempt {
    match serde_json::from_str::<Value>(candidate) {
        Ok(document) => match scenarios_from_document(&document) {
            Some(scenarios) => Attempt::Accepted(scenarios),
            None => Attempt::declined("testScenarios missing or empty"),
        },
        Err(err) => Attempt::declined(format!("decode failed: {}", err)),
    }
}

pub(super) fn attempt(raw: &str) -> Attempt {
    match boundary_slice(raw) {
        Some(candidate) => decode_candidate(candidate),
        None => Attempt::declined("no JSON object boundaries"),
    }
}
