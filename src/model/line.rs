//! Per-line folding of mutation records.

use serde::Serialize;

use super::error::AggregateError;
use super::outcome::{MutationRecord, OutcomeKind};

/// All mutations recorded against one source line within a run.
///
/// Created alongside its first record, so the cached summary always exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAggregator {
    line_number: u64,
    records: Vec<MutationRecord>,
    summary: OutcomeKind,
}

/// The previous run's view of a line whose records changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiff {
    /// Previous run's summary for the line.
    pub previous_summary: OutcomeKind,
    /// Previous run's records, in arrival order.
    pub previous_records: Vec<MutationRecord>,
}

impl LineAggregator {
    /// Start a line from its first record.
    pub fn new(first: MutationRecord) -> Self {
        Self {
            line_number: first.line_number,
            summary: first.outcome,
            records: vec![first],
        }
    }

    /// Line number this aggregator is keyed by.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Records in arrival order.
    pub fn records(&self) -> &[MutationRecord] {
        &self.records
    }

    /// Append a record for the same line.
    pub fn append(&mut self, record: MutationRecord) -> Result<(), AggregateError> {
        if record.line_number != self.line_number {
            return Err(AggregateError::InvalidLine {
                line: record.line_number,
                expected: self.line_number,
            });
        }
        if record.outcome.priority() > self.summary.priority() {
            self.summary = record.outcome;
        }
        self.records.push(record);
        Ok(())
    }

    /// Move every record of `other` (same line) after this line's records.
    pub(crate) fn absorb(&mut self, other: LineAggregator) {
        debug_assert_eq!(self.line_number, other.line_number);
        if other.summary.priority() > self.summary.priority() {
            self.summary = other.summary;
        }
        self.records.extend(other.records);
    }

    /// Worst-wins outcome over the line's records.
    pub fn summary(&self) -> OutcomeKind {
        self.summary
    }

    /// True if both lines carry the same outcomes and descriptions in the same order.
    pub fn same_records(&self, other: &LineAggregator) -> bool {
        self.records.len() == other.records.len()
            && self
                .records
                .iter()
                .zip(&other.records)
                .all(|(a, b)| a.same_result(b))
    }

    /// Compare against the matching line from the previous run.
    ///
    /// `None` when there is no previous line or nothing changed.
    pub fn diff_against(&self, previous: Option<&LineAggregator>) -> Option<LineDiff> {
        let previous = previous?;
        if self.same_records(previous) {
            return None;
        }
        Some(LineDiff {
            previous_summary: previous.summary,
            previous_records: previous.records.clone(),
        })
    }
}
