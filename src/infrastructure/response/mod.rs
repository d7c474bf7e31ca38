use once_cell::sync::Lazy;
use regex::Regex;

// `<think>`, `<thinking>`, `<reasoning>` and `<internal>` blocks, plus the
// self-closing `<think/>` some models emit when reasoning is disabled.
static REASONING_BLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:think|thinking|reasoning|internal)>.*?</(?:think|thinking|reasoning|internal)>|<think\s*/>")
        .unwrap()
});

/// Removes reasoning blocks that some models prepend to their answer.
///
/// Runs before normalization so braces or numbered lines inside a model's
/// reasoning are never mistaken for the answer.
pub fn strip_reasoning(response: &str) -> String {
    REASONING_BLOCK_PATTERN.replace_all(response, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_think_block() {
        let input = "<think>Maybe {\"testScenarios\": []}?</think>\n{\"testScenarios\": [1]}";
        assert_eq!(strip_reasoning(input), "{\"testScenarios\": [1]}");
    }

    #[test]
    fn test_strip_self_closing_think() {
        assert_eq!(strip_reasoning("<think />1. Check login"), "1. Check login");
    }

    #[test]
    fn test_strip_multiline_reasoning_case_insensitive() {
        let input = "<Reasoning>\n1. first\n2. second\n</Reasoning>\nAnswer";
        assert_eq!(strip_reasoning(input), "Answer");
    }

    #[test]
    fn test_strip_several_blocks() {
        let input = "<thinking>a</thinking>x<internal>b</internal>y";
        assert_eq!(strip_reasoning(input), "xy");
    }

    #[test]
    fn test_preserves_plain_text() {
        let input = "Here are the scenarios: 1. Login";
        assert_eq!(strip_reasoning(input), input);
    }
}
