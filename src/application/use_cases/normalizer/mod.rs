//! Turns raw vendor text into a [`ResultSet`].
//!
//! The vendor is asked for JSON but routinely answers with prose-wrapped,
//! truncated or slightly malformed output. Normalization runs an ordered chain
//! of stages, most trusted first, and keeps the first one that yields at least
//! one scenario:
//!
//! 1. [`Stage::Direct`]: decode the boundary slice (first `{` to last `}`).
//! 2. [`Stage::Repair`]: apply textual repairs to the slice and decode again.
//! 3. [`Stage::FieldScan`]: regex-scan the whole input text around each `testCaseID`.
//! 4. [`Stage::LineScan`]: read a numbered plain-text list.
//!
//! When every stage declines the result is an empty set. Normalization has no
//! error path.

mod direct;
mod field_scan;
mod line_scan;
mod record;
mod repair;

use crate::domain::test_scenario::{ResultSet, TestScenario};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Direct,
    Repair,
    FieldScan,
    LineScan,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Direct => "direct",
            Stage::Repair => "repair",
            Stage::FieldScan => "field_scan",
            Stage::LineScan => "line_scan",
        }
    }
}

/// Which stages ran for one input, and why the declined ones declined.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageTrace {
    pub attempted: Vec<Stage>,
    pub accepted: Option<Stage>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Normalized {
    pub result: ResultSet,
    pub trace: StageTrace,
}

pub(crate) enum Attempt {
    Accepted(Vec<TestScenario>),
    Declined(String),
}

impl Attempt {
    fn declined(reason: impl Into<String>) -> Self {
        Attempt::Declined(reason.into())
    }
}

type StageFn = fn(&str) -> Attempt;

const PIPELINE: [(Stage, StageFn); 4] = [
    (Stage::Direct, direct::attempt),
    (Stage::Repair, repair::attempt),
    (Stage::FieldScan, field_scan::attempt),
    (Stage::LineScan, line_scan::attempt),
];

pub fn normalize(raw: &str) -> ResultSet {
    normalize_traced(raw).result
}

pub fn normalize_traced(raw: &str) -> Normalized {
    let mut trace = StageTrace::default();

    // Blank input has nothing to decode; go straight to the scanning stages.
    let skip = if raw.trim().is_empty() {
        trace.notes.push("guard: empty response text".to_string());
        2
    } else {
        0
    };

    for (stage, attempt) in PIPELINE.iter().skip(skip) {
        trace.attempted.push(*stage);
        match attempt(raw) {
            Attempt::Accepted(scenarios) => {
                tracing::debug!(
                    stage = stage.label(),
                    scenarios = scenarios.len(),
                    "normalization stage accepted"
                );
                trace.accepted = Some(*stage);
                return Normalized {
                    result: ResultSet::new(ensure_unique_ids(scenarios)),
                    trace,
                };
            }
            Attempt::Declined(reason) => {
                tracing::debug!(stage = stage.label(), reason = %reason, "normalization stage declined");
                trace.notes.push(format!("{}: {}", stage.label(), reason));
            }
        }
    }

    tracing::debug!("no scenarios recoverable from response");
    Normalized {
        result: ResultSet::empty(),
        trace,
    }
}

/// Repeated ids get a numeric suffix (`TS001`, `TS001-2`, ...), first one wins.
fn ensure_unique_ids(mut scenarios: Vec<TestScenario>) -> Vec<TestScenario> {
    let mut used: HashSet<String> = HashSet::with_capacity(scenarios.len());
    for scenario in &mut scenarios {
        if !used.insert(scenario.id.clone()) {
            let mut suffix = 2;
            let mut candidate = format!("{}-{}", scenario.id, suffix);
            while used.contains(&candidate) {
                suffix += 1;
                candidate = format!("{}-{}", scenario.id, suffix);
            }
            used.insert(candidate.clone());
            scenario.id = candidate;
        }
    }
    scenarios
}
