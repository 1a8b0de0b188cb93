//! Strategies for mutation records and record streams.

use proptest::prelude::*;

use crate::model::error::AggregateError;
use crate::model::file::FileId;
use crate::model::outcome::OutcomeKind;
use crate::model::run::{RunRecorder, RunSnapshot};

/// One generated mutation, ready to feed to a [`RunRecorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInput {
    /// Dotted package.
    pub package: String,
    /// File identifier.
    pub file_id: FileId,
    /// 0-based line.
    pub line_number: u64,
    /// Outcome.
    pub outcome: OutcomeKind,
    /// Mutator description.
    pub description: String,
}

impl RecordInput {
    /// Record into `recorder`.
    pub fn apply(&self, recorder: &RunRecorder) -> Result<(), AggregateError> {
        recorder.record(
            &self.package,
            self.file_id.clone(),
            self.outcome,
            self.line_number as i64,
            self.description.clone(),
            "generated",
        )
    }
}

/// Seal a fresh run over `records`.
pub fn seal_records(records: &[RecordInput]) -> Result<RunSnapshot, AggregateError> {
    let recorder = RunRecorder::new();
    for record in records {
        record.apply(&recorder)?;
    }
    Ok(recorder.seal())
}

/// Any outcome kind.
pub fn outcome_kind() -> impl Strategy<Value = OutcomeKind> {
    prop::sample::select(OutcomeKind::ALL.to_vec())
}

/// Dotted package of up to `max_depth` segments drawn from a small alphabet,
/// so generated trees share prefixes. May be empty (root package).
pub fn package_name(max_depth: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..=max_depth)
        .prop_map(|segments| segments.join("."))
}

/// A single record with small line numbers so lines collide often.
pub fn record_input() -> impl Strategy<Value = RecordInput> {
    (
        package_name(3),
        prop::sample::select(vec!["A.java", "B.java", "c/C.java"]),
        0u64..12,
        outcome_kind(),
        prop::sample::select(vec!["negate", "remove call", "return null"]),
    )
        .prop_map(|(package, file, line_number, outcome, description)| RecordInput {
            package,
            file_id: FileId::new(file),
            line_number,
            outcome,
            description: description.to_string(),
        })
}

/// Record streams of `len` records.
pub fn record_stream(
    len: impl Into<prop::collection::SizeRange>,
) -> impl Strategy<Value = Vec<RecordInput>> {
    prop::collection::vec(record_input(), len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn package_names_stay_within_depth(name in package_name(2)) {
            let depth = if name.is_empty() { 0 } else { name.split('.').count() };
            prop_assert!(depth <= 2);
        }

        #[test]
        fn generated_streams_always_seal(records in record_stream(0..40)) {
            let snapshot = seal_records(&records).expect("generated records are valid");
            prop_assert!(snapshot.line_count() <= records.len());
        }
    }
}
