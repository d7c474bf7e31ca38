//! Last-resort reading of a numbered plain-text list.
//!
//! Every `N.` line starts a scenario. The lines that follow fill the
//! description first, then up to [`MAX_STEPS`] steps, then the comments.
//! Nothing here can tell priorities or types apart, so every scenario keeps
//! the `Medium` / `Functional` defaults.

use super::Attempt;
use crate::domain::test_scenario::{synthetic_id, TestScenario};
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_STEPS: usize = 5;

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());

struct Draft {
    objective: String,
    description: Option<String>,
    steps: Vec<String>,
    comments: Vec<String>,
}

impl Draft {
    fn new(objective: &str) -> Self {
        Self {
            objective: objective.to_string(),
            description: None,
            steps: Vec::new(),
            comments: Vec::new(),
        }
    }

    fn push(&mut self, line: &str) {
        if self.description.is_none() {
            self.description = Some(line.to_string());
        } else if self.steps.len() < MAX_STEPS {
            self.steps.push(line.to_string());
        } else {
            self.comments.push(line.to_string());
        }
    }

    fn finish(self, position: usize) -> TestScenario {
        let mut scenario = TestScenario::new(synthetic_id(position), self.objective).with_steps(self.steps);
        scenario.description = self.description.unwrap_or_default();
        scenario.comments = self.comments.join(" ");
        scenario
    }
}

pub(super) fn attempt(raw: &str) -> Attempt {
    let mut scenarios = Vec::new();
    let mut current: Option<Draft> = None;

    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(marker) = NUMBERED.find(line) {
            if let Some(draft) = current.take() {
                scenarios.push(draft.finish(scenarios.len() + 1));
            }
            current = Some(Draft::new(&line[marker.end()..]));
        } else if let Some(draft) = current.as_mut() {
            draft.push(line);
        }
    }

    if let Some(draft) = current {
        scenarios.push(draft.finish(scenarios.len() + 1));
    }

    if scenarios.is_empty() {
        Attempt::declined("no numbered lines")
    } else {
        Attempt::Accepted(scenarios)
    }
}
