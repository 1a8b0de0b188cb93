//! Mutant outcome kinds and the records carrying them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::AggregateError;

/// Outcome of running the test suite against one mutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    /// Tests failed (mutant killed).
    Killed,
    /// Tests passed (mutant survived).
    Survived,
    /// No test covered the mutated line.
    NoCoverage,
    /// Tests did not finish in time.
    TimedOut,
    /// The mutant could not be executed.
    RunError,
}

impl OutcomeKind {
    /// All kinds, in declaration order.
    pub const ALL: [OutcomeKind; 5] = [
        Self::Killed,
        Self::Survived,
        Self::NoCoverage,
        Self::TimedOut,
        Self::RunError,
    ];

    /// Worst-wins rank used to summarize a line. Higher wins.
    pub fn priority(self) -> u8 {
        match self {
            Self::Survived => 4,
            Self::TimedOut => 3,
            Self::Killed => 2,
            Self::NoCoverage => 1,
            Self::RunError => 0,
        }
    }

    /// Lowercase token used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Killed => "killed",
            Self::Survived => "survived",
            Self::NoCoverage => "no_coverage",
            Self::TimedOut => "timed_out",
            Self::RunError => "run_error",
        }
    }

    /// Summarize a line's records: the highest-priority kind present wins.
    ///
    /// Fails with [`AggregateError::EmptyLine`] when `records` is empty.
    pub fn summarize<'a, I>(records: I) -> Result<OutcomeKind, AggregateError>
    where
        I: IntoIterator<Item = &'a MutationRecord>,
    {
        records
            .into_iter()
            .map(|record| record.outcome)
            .max_by_key(|kind| kind.priority())
            .ok_or(AggregateError::EmptyLine)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an outcome token is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mutation outcome: {0}")]
pub struct ParseOutcomeError(pub String);

impl FromStr for OutcomeKind {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "killed" => Ok(Self::Killed),
            "survived" => Ok(Self::Survived),
            "no_coverage" | "nocoverage" => Ok(Self::NoCoverage),
            "timed_out" | "timedout" | "timeout" => Ok(Self::TimedOut),
            "run_error" | "runerror" => Ok(Self::RunError),
            _ => Err(ParseOutcomeError(s.to_string())),
        }
    }
}

/// One mutant reported by the mutation tool, located on a source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Mutated method.
    pub method: String,
    /// 0-based source line.
    pub line_number: u64,
    /// Execution outcome.
    pub outcome: OutcomeKind,
    /// Mutator description.
    pub description: String,
}

impl MutationRecord {
    /// Build a record.
    pub fn new(
        method: impl Into<String>,
        line_number: u64,
        outcome: OutcomeKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            line_number,
            outcome,
            description: description.into(),
        }
    }

    /// Diff equality: outcome and description only.
    pub fn same_result(&self, other: &MutationRecord) -> bool {
        self.outcome == other.outcome && self.description == other.description
    }
}
