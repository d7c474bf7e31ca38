//! Textual repairs for near-JSON vendor output.
//!
//! The repairs run in a fixed order on the boundary slice, followed by one
//! strict decode. They are heuristics over text, not a parser: the inner-quote
//! escape in particular can damage values that legitimately contain `",` or
//! `":` sequences.

use super::direct::{boundary_slice, decode_candidate};
use super::Attempt;
use once_cell::sync::Lazy;
use regex::Regex;

static BARE_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)(\s*):").unwrap());

static TRAILING_COMMA_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());

pub(super) fn attempt(raw: &str) -> Attempt {
    match boundary_slice(raw) {
        Some(candidate) => match decode_candidate(&repair(candidate)) {
            Attempt::Declined(reason) => Attempt::declined(format!("after repair, {}", reason)),
            accepted => accepted,
        },
        None => Attempt::declined("no JSON object boundaries"),
    }
}

pub(super) fn repair(candidate: &str) -> String {
    let repaired = quote_bare_keys(candidate);
    let repaired = remove_trailing_commas(&repaired);
    let repaired = requote_single_quoted(&repaired);
    escape_inner_quotes(&repaired)
}

/// Quotes `key:` after `{` or `,`, leaving double-quoted strings untouched.
fn quote_bare_keys(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        let outside = rest.find('"').unwrap_or(rest.len());
        out.push_str(&BARE_KEY_PATTERN.replace_all(&rest[..outside], "${1}\"${2}\"${3}:"));
        rest = &rest[outside..];

        let literal = string_literal_len(rest);
        out.push_str(&rest[..literal]);
        rest = &rest[literal..];
    }

    out
}

// Byte length of the double-quoted string `text` starts with, quotes included.
// An unterminated string runs to the end.
fn string_literal_len(text: &str) -> usize {
    let mut escaped = false;
    for (index, c) in text.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return index + 1,
            _ => {}
        }
    }
    text.len()
}

fn remove_trailing_commas(text: &str) -> String {
    TRAILING_COMMA_PATTERN.replace_all(text, "$1").into_owned()
}

/// Rewrites `'...'` strings found outside double-quoted strings as `"..."`.
/// Apostrophes inside double-quoted strings are left alone.
fn requote_single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    let mut in_double = false;

    while let Some(c) = chars.next() {
        if in_double {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_double = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_double = true;
                out.push(c);
            }
            '\'' => {
                out.push('"');
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => match chars.next() {
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => {}
                        },
                        '\'' => break,
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            _ => out.push(c),
        }
    }

    out
}

/// Escapes a `"` inside a string unless the next non-space character could
/// legally follow a closing quote (`,` `:` `}` `]` or end of text).
fn escape_inner_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut index = 0;

    while index < chars.len() {
        let c = chars[index];
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        } else {
            match c {
                '\\' => {
                    out.push(c);
                    if let Some(&escaped) = chars.get(index + 1) {
                        out.push(escaped);
                        index += 1;
                    }
                }
                '"' if closes_string(&chars[index + 1..]) => {
                    in_string = false;
                    out.push(c);
                }
                '"' => out.push_str("\\\""),
                other => out.push(other),
            }
        }
        index += 1;
    }

    out
}

fn closes_string(rest: &[char]) -> bool {
    rest.iter()
        .find(|c| !c.is_whitespace())
        .map_or(true, |next| matches!(next, ',' | ':' | '}' | ']'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn quotes_bare_keys_only_after_delimiters() {
        let fixed = quote_bare_keys(r#"{name: "x", "url": "http://a", nested: {deep_key : 1}}"#);
        assert_eq!(
            fixed,
            r#"{"name": "x", "url": "http://a", "nested": {"deep_key" : 1}}"#
        );
    }

    #[test]
    fn colons_inside_string_values_are_not_keys() {
        let text = r#"{"comments":"Edge case, note: verify", id: "x \", y: z"}"#;
        assert_eq!(
            quote_bare_keys(text),
            r#"{"comments":"Edge case, note: verify", "id": "x \", y: z"}"#
        );
    }

    #[test]
    fn drops_trailing_commas() {
        assert_eq!(remove_trailing_commas("[1, 2, ]"), "[1, 2 ]");
        assert_eq!(remove_trailing_commas("{\"a\": 1,\n}"), "{\"a\": 1\n}");
    }

    #[test]
    fn requotes_single_quoted_strings() {
        let fixed = requote_single_quoted(r#"{'a': 'it\'s', "b": "don't"}"#);
        assert_eq!(fixed, r#"{"a": "it's", "b": "don't"}"#);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["b"], "don't");
    }

    #[test]
    fn single_quoted_values_escape_double_quotes() {
        let fixed = requote_single_quoted(r#"{'a': 'say "hi"'}"#);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["a"], "say \"hi\"");
    }

    #[test]
    fn escapes_quotes_inside_values() {
        let fixed = escape_inner_quotes(r#"{"comments": "Click "Save" now", "b": ["x", "y"]}"#);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["comments"], "Click \"Save\" now");
        assert_eq!(value["b"][1], "y");
    }

    #[test]
    fn valid_json_survives_all_repairs() {
        let original = r#"{"testScenarios": [{"testCaseID": "TS001", "steps": ["1. Open", "2. Close"]}]}"#;
        assert_eq!(repair(original), original);
    }

    #[test]
    fn combined_repairs_produce_decodable_json() {
        let broken = "{testScenarios: [{testCaseID: 'TS001', steps: ['a', 'b',],},]}";
        let value: Value = serde_json::from_str(&repair(broken)).unwrap();
        assert_eq!(value["testScenarios"][0]["testCaseID"], "TS001");
        assert_eq!(value["testScenarios"][0]["steps"][1], "b");
    }
}
