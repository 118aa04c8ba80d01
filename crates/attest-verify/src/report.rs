//! Per-fact outcomes and the run report.

use attest_facts::Fact;
use serde::Serialize;

/// What a single check concluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { message: String },
    /// The check could not be performed; neither a pass nor a failure.
    Skipped { reason: String },
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped { .. })
    }

    /// The failure message or skip reason.
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed { message } => Some(message),
            Outcome::Skipped { reason } => Some(reason),
        }
    }
}

/// The verdict on one fact: the `(name, outcome, message)` a test reporter consumes.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Display name, e.g. `@CheckConstructor com.example.App`.
    pub name: String,
    pub fact: Fact,
    pub outcome: Outcome,
    /// Advisory findings that did not fail the check.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CheckResult {
    pub fn new(fact: &Fact, outcome: Outcome) -> Self {
        Self {
            name: format!("@{} {}", fact.annotation().simple_name(), fact.annotated_element),
            fact: fact.clone(),
            outcome,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// All results of one verification run, in fact order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub results: Vec<CheckResult>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| r.outcome.is_failed())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for result in &self.results {
            let status = match &result.outcome {
                Outcome::Passed => "PASS",
                Outcome::Failed { .. } => "FAIL",
                Outcome::Skipped { .. } => "SKIP",
            };
            writeln!(f, "{} {}", status, result.name)?;
            if let Some(message) = result.outcome.message() {
                for line in message.lines() {
                    writeln!(f, "    {}", line)?;
                }
            }
        }
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}
