//! Per-file aggregation of line outcomes.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::AggregateError;
use super::line::{LineAggregator, LineDiff};
use super::outcome::{MutationRecord, OutcomeKind};
use super::score::Score;

/// Opaque identifier of a source file, typically its project-relative path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Wrap a file identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Full identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name: the last path segment (`"a/b/Foo.java"` gives `"Foo.java"`).
    pub fn name(&self) -> &str {
        self.0.rsplit(['/', '\\']).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FileId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Convert an ingested line number, rejecting negatives.
pub(crate) fn checked_line(line_number: i64) -> Result<u64, AggregateError> {
    u64::try_from(line_number).map_err(|_| AggregateError::NegativeLine(line_number))
}

/// One line as seen while iterating a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineView<'a> {
    /// 0-based line number.
    pub line_number: u64,
    /// Worst-wins outcome for the line.
    pub summary: OutcomeKind,
    /// Records in arrival order.
    pub records: &'a [MutationRecord],
    /// Previous run's state when the line changed.
    pub diff: Option<LineDiff>,
}

/// All lines of one file touched by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAggregator {
    package: String,
    file_id: FileId,
    lines: BTreeMap<u64, LineAggregator>,
    arrival: Vec<u64>,
}

impl FileAggregator {
    /// Empty aggregator for `file_id` in dotted `package`.
    pub fn new(package: impl Into<String>, file_id: FileId) -> Self {
        Self {
            package: package.into(),
            file_id,
            lines: BTreeMap::new(),
            arrival: Vec::new(),
        }
    }

    /// Dotted package name.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// File identifier.
    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    /// Route a mutation to its line, creating the line on first touch.
    pub fn record(
        &mut self,
        line_number: i64,
        outcome: OutcomeKind,
        description: impl Into<String>,
        method: impl Into<String>,
    ) -> Result<(), AggregateError> {
        let line_number = checked_line(line_number)?;
        self.append(MutationRecord::new(method, line_number, outcome, description))
    }

    /// Append an already-built record.
    pub fn append(&mut self, record: MutationRecord) -> Result<(), AggregateError> {
        match self.lines.get_mut(&record.line_number) {
            Some(line) => line.append(record),
            None => {
                let line_number = record.line_number;
                self.lines.insert(line_number, LineAggregator::new(record));
                self.arrival.push(line_number);
                Ok(())
            }
        }
    }

    /// Fold another aggregator for the same file into this one.
    pub fn absorb(&mut self, other: FileAggregator) {
        for (line_number, line) in other.lines {
            match self.lines.entry(line_number) {
                Entry::Occupied(mut existing) => existing.get_mut().absorb(line),
                Entry::Vacant(slot) => {
                    slot.insert(line);
                    self.arrival.push(line_number);
                }
            }
        }
    }

    /// Line aggregator for `line_number`, if touched.
    pub fn line(&self, line_number: u64) -> Option<&LineAggregator> {
        self.lines.get(&line_number)
    }

    /// Number of distinct lines touched.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line numbers in the order they were first touched.
    pub fn lines_in_arrival_order(&self) -> &[u64] {
        &self.arrival
    }

    /// Iterate lines in ascending order, diffing each against `previous`.
    ///
    /// Each call starts a fresh pass.
    pub fn visit_lines<'a>(
        &'a self,
        previous: Option<&'a FileAggregator>,
    ) -> impl Iterator<Item = LineView<'a>> + 'a {
        self.lines.values().map(move |line| LineView {
            line_number: line.line_number(),
            summary: line.summary(),
            records: line.records(),
            diff: previous
                .and_then(|prev| line.diff_against(prev.line(line.line_number()))),
        })
    }

    /// One unit per line, in the bucket of the line's summary.
    pub fn score(&self) -> Score {
        self.lines
            .values()
            .map(|line| Score::of(line.summary()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> FileAggregator {
        FileAggregator::new("a.b", FileId::new("a/b/Foo.java"))
    }

    #[test]
    fn file_id_name_is_last_segment() {
        assert_eq!(FileId::new("a/b/Foo.java").name(), "Foo.java");
        assert_eq!(FileId::new("a\\b\\Foo.java").name(), "Foo.java");
        assert_eq!(FileId::new("Foo.java").name(), "Foo.java");
    }

    #[test]
    fn score_counts_lines_not_mutants() {
        let mut f = file();
        f.record(5, OutcomeKind::Survived, "a", "m").expect("record");
        f.record(5, OutcomeKind::Killed, "b", "m").expect("record");
        f.record(5, OutcomeKind::Killed, "c", "m").expect("record");
        f.record(9, OutcomeKind::Killed, "d", "m").expect("record");

        let score = f.score();
        assert_eq!(score.total(), 2);
        assert_eq!(score.survived, 1);
        assert_eq!(score.killed, 1);
        assert_eq!(f.line_count(), 2);
    }

    #[test]
    fn negative_lines_are_rejected() {
        let mut f = file();
        let err = f
            .record(-1, OutcomeKind::Killed, "a", "m")
            .expect_err("negative line should fail");
        assert_eq!(err, AggregateError::NegativeLine(-1));
        assert_eq!(f.line_count(), 0);
    }

    #[test]
    fn lines_beyond_u32_range_are_kept() {
        let mut f = file();
        let wide = 5_000_000_000_i64;
        f.record(wide, OutcomeKind::Survived, "a", "m").expect("wide line should be accepted");
        f.record(i64::MAX, OutcomeKind::Killed, "b", "m").expect("max line should be accepted");

        let line = f.line(5_000_000_000).expect("wide line recorded");
        assert_eq!(line.line_number(), 5_000_000_000);
        assert_eq!(line.summary(), OutcomeKind::Survived);
        assert_eq!(f.lines_in_arrival_order(), &[5_000_000_000, i64::MAX as u64]);
    }

    #[test]
    fn visit_lines_is_ascending_and_restartable() {
        let mut f = file();
        for line in [30, 2, 17, 2] {
            f.record(line, OutcomeKind::Killed, "x", "m").expect("record");
        }
        let first: Vec<u64> = f.visit_lines(None).map(|v| v.line_number).collect();
        let second: Vec<u64> = f.visit_lines(None).map(|v| v.line_number).collect();
        assert_eq!(first, vec![2, 17, 30]);
        assert_eq!(first, second);
        assert_eq!(f.lines_in_arrival_order(), &[30, 2, 17]);
    }

    #[test]
    fn visit_lines_reports_changed_lines_only() {
        let mut previous = file();
        previous.record(1, OutcomeKind::Survived, "x", "m").expect("record");
        previous.record(2, OutcomeKind::Killed, "y", "m").expect("record");

        let mut current = file();
        current.record(1, OutcomeKind::Killed, "x", "m").expect("record");
        current.record(2, OutcomeKind::Killed, "y", "m").expect("record");
        current.record(3, OutcomeKind::Killed, "z", "m").expect("record");

        let views: Vec<LineView<'_>> = current.visit_lines(Some(&previous)).collect();
        assert_eq!(views.len(), 3);
        let diff = views[0].diff.as_ref().expect("line 1 changed");
        assert_eq!(diff.previous_summary, OutcomeKind::Survived);
        assert!(views[1].diff.is_none());
        assert!(views[2].diff.is_none(), "new lines have no previous data");
    }
}
