//! Errors raised while folding records into a run.

use thiserror::Error;

/// Aggregation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// A record was routed to a line aggregator keyed by a different line.
    #[error("record for line {line} routed to line {expected}")]
    InvalidLine {
        /// Line number carried by the record.
        line: u64,
        /// Line number of the aggregator it was appended to.
        expected: u64,
    },
    /// Line numbers are 0-based and never negative.
    #[error("negative line number {0}")]
    NegativeLine(i64),
    /// A summary was requested over zero records.
    #[error("no mutations recorded for line")]
    EmptyLine,
}

impl AggregateError {
    /// True for the invariant violations that callers must treat as fatal.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::EmptyLine | Self::InvalidLine { .. })
    }
}
