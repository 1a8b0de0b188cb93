//! Run ingestion and the sealed, queryable snapshot it produces.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, trace};

use super::error::AggregateError;
use super::file::{FileAggregator, FileId, checked_line};
use super::line::{LineAggregator, LineDiff};
use super::outcome::{MutationRecord, OutcomeKind};
use super::package::{PackageNode, package_segments};
use super::score::Score;
use super::traverse::{DisplayChoices, TreeVisitor, traverse};

type FileSlot = Arc<Mutex<FileAggregator>>;

/// Collects the records of one run. Safe to feed from several threads.
///
/// Appends to the same file are serialized; different files proceed
/// independently. Nothing can be read until [`RunRecorder::seal`].
#[derive(Debug, Default)]
pub struct RunRecorder {
    previous: Option<Weak<RunSnapshot>>,
    files: RwLock<HashMap<String, HashMap<FileId, FileSlot>>>,
    records: AtomicUsize,
}

impl RunRecorder {
    /// Recorder with no previous run to diff against.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder that will diff against `previous` without keeping it alive.
    pub fn with_previous(previous: &Arc<RunSnapshot>) -> Self {
        Self {
            previous: Some(Arc::downgrade(previous)),
            ..Self::default()
        }
    }

    /// Record one mutant reported for `file_id` in dotted `package`.
    pub fn record(
        &self,
        package: &str,
        file_id: FileId,
        outcome: OutcomeKind,
        line_number: i64,
        description: impl Into<String>,
        method: impl Into<String>,
    ) -> Result<(), AggregateError> {
        let line_number = checked_line(line_number)?;
        let package = package_segments(package).join(".");
        let record = MutationRecord::new(method, line_number, outcome, description);
        trace!(%package, file = %file_id, line = line_number, %outcome, "recording mutation");

        let slot = self.slot(package, file_id);
        slot.lock().append(record)?;
        self.records.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn slot(&self, package: String, file_id: FileId) -> FileSlot {
        if let Some(slot) = self
            .files
            .read()
            .get(&package)
            .and_then(|files| files.get(&file_id))
        {
            return Arc::clone(slot);
        }

        let mut files = self.files.write();
        let package_files = files.entry(package.clone()).or_default();
        Arc::clone(package_files.entry(file_id).or_insert_with_key(|id| {
            debug!(%package, file = %id, "first mutation for file");
            Arc::new(Mutex::new(FileAggregator::new(package.clone(), id.clone())))
        }))
    }

    /// Number of records accepted so far.
    pub fn record_count(&self) -> usize {
        self.records.load(Ordering::Relaxed)
    }

    /// End ingestion: build the package tree and compute rollup scores once.
    pub fn seal(self) -> RunSnapshot {
        let mut root = PackageNode::root();
        for (package, files) in self.files.into_inner() {
            let path = package_segments(&package);
            for (_, slot) in files {
                let file = match Arc::try_unwrap(slot) {
                    Ok(mutex) => mutex.into_inner(),
                    Err(shared) => shared.lock().clone(),
                };
                root.adopt(&path, file);
            }
        }
        let score = root.rollup();
        let snapshot = RunSnapshot {
            root,
            score,
            previous: self.previous,
        };
        info!(
            records = self.records.into_inner(),
            files = snapshot.file_count(),
            lines = snapshot.line_count(),
            killed = score.killed,
            survived = score.survived,
            percentage = score.percentage(),
            "sealed mutation run"
        );
        snapshot
    }
}

/// A line whose records differ from the previous run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedLine {
    /// Dotted package.
    pub package: String,
    /// File identifier.
    pub file_id: FileId,
    /// 0-based line.
    pub line_number: u64,
    /// Current summary.
    pub summary: OutcomeKind,
    /// Previous state of the line.
    pub diff: LineDiff,
}

/// Immutable result of one completed run.
#[derive(Debug)]
pub struct RunSnapshot {
    root: PackageNode,
    score: Score,
    previous: Option<Weak<RunSnapshot>>,
}

impl RunSnapshot {
    /// Root of the package tree.
    pub fn root(&self) -> &PackageNode {
        &self.root
    }

    /// Rollup score of the whole run.
    pub fn score(&self) -> Score {
        self.score
    }

    /// The preceding run on the same inputs, if it is still alive.
    pub fn previous(&self) -> Option<Arc<RunSnapshot>> {
        self.previous.as_ref().and_then(Weak::upgrade)
    }

    /// File in dotted `package`.
    pub fn file(&self, package: &str, file_id: &FileId) -> Option<&FileAggregator> {
        self.root.find(&package_segments(package))?.file(file_id)
    }

    /// One line of one file.
    pub fn line(&self, package: &str, file_id: &FileId, line_number: u64) -> Option<&LineAggregator> {
        self.file(package, file_id)?.line(line_number)
    }

    /// Files touched by the run.
    pub fn file_count(&self) -> usize {
        self.root.file_count()
    }

    /// Distinct lines touched by the run.
    pub fn line_count(&self) -> usize {
        self.root.line_count()
    }

    /// True if any package level holds more than one child, files and sub-packages alike.
    pub fn has_multiple_packages(&self) -> bool {
        fn branches(node: &PackageNode) -> bool {
            node.package_count() + node.files().count() > 1 || node.packages().any(branches)
        }
        branches(&self.root)
    }

    /// Diff one line against the previous run. `None` if unchanged or no previous data.
    pub fn diff_line(&self, package: &str, file_id: &FileId, line_number: u64) -> Option<LineDiff> {
        let current = self.line(package, file_id, line_number)?;
        let previous = self.previous()?;
        current.diff_against(previous.line(package, file_id, line_number))
    }

    /// Score the same file had in the previous run.
    pub fn previous_file_score(&self, package: &str, file_id: &FileId) -> Option<Score> {
        let previous = self.previous()?;
        previous.file(package, file_id).map(FileAggregator::score)
    }

    /// Every changed line, ordered by package, file and line.
    pub fn changed_lines(&self) -> Vec<ChangedLine> {
        let Some(previous) = self.previous() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        collect_changes(&self.root, previous.root(), &mut out);
        out
    }

    /// Walk the tree depth-first in the order given by `choices`.
    pub fn traverse(&self, choices: &DisplayChoices, root_label: &str, visitor: &mut dyn TreeVisitor) {
        let previous = self.previous();
        traverse(
            &self.root,
            previous.as_deref().map(RunSnapshot::root),
            choices,
            root_label,
            visitor,
        );
    }
}

fn collect_changes(node: &PackageNode, previous_root: &PackageNode, out: &mut Vec<ChangedLine>) {
    for file in node.files() {
        let previous = previous_root
            .find(&package_segments(file.package()))
            .and_then(|pkg| pkg.file(file.file_id()));
        for view in file.visit_lines(previous) {
            if let Some(diff) = view.diff {
                out.push(ChangedLine {
                    package: file.package().to_string(),
                    file_id: file.file_id().clone(),
                    line_number: view.line_number,
                    summary: view.summary,
                    diff,
                });
            }
        }
    }
    for pkg in node.packages() {
        collect_changes(pkg, previous_root, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(recorder: &RunRecorder) {
        recorder
            .record("a.b", FileId::new("F1"), OutcomeKind::Survived, 5, "negate", "run")
            .expect("record");
        recorder
            .record("a.b", FileId::new("F1"), OutcomeKind::Killed, 5, "remove call", "run")
            .expect("record");
        recorder
            .record("a.c", FileId::new("F2"), OutcomeKind::Killed, 1, "negate", "go")
            .expect("record");
    }

    #[test]
    fn seal_rolls_up_line_counts() {
        let recorder = RunRecorder::new();
        scenario(&recorder);
        assert_eq!(recorder.record_count(), 3);
        let snapshot = recorder.seal();

        let score = snapshot.score();
        assert_eq!(score.killed, 1);
        assert_eq!(score.survived, 1);
        assert_eq!(score.total(), 2);
        assert_eq!(snapshot.file_count(), 2);
        assert_eq!(snapshot.line_count(), 2);
        assert!(snapshot.has_multiple_packages());
        assert_eq!(
            snapshot
                .line("a.b", &FileId::new("F1"), 5)
                .expect("line exists")
                .summary(),
            OutcomeKind::Survived
        );
    }

    #[test]
    fn identical_rerun_has_no_diffs() {
        let first = Arc::new({
            let recorder = RunRecorder::new();
            scenario(&recorder);
            recorder.seal()
        });
        let recorder = RunRecorder::with_previous(&first);
        scenario(&recorder);
        let second = recorder.seal();

        assert!(second.previous().is_some());
        assert_eq!(second.diff_line("a.b", &FileId::new("F1"), 5), None);
        assert!(second.changed_lines().is_empty());
        assert_eq!(
            second.previous_file_score("a.c", &FileId::new("F2")),
            Some(Score::of(OutcomeKind::Killed))
        );
    }

    #[test]
    fn changed_lines_surface_against_previous_run() {
        let first = Arc::new({
            let recorder = RunRecorder::new();
            scenario(&recorder);
            recorder.seal()
        });
        let recorder = RunRecorder::with_previous(&first);
        recorder
            .record("a.b", FileId::new("F1"), OutcomeKind::Killed, 5, "negate", "run")
            .expect("record");
        recorder
            .record("a.b", FileId::new("F1"), OutcomeKind::Killed, 5, "remove call", "run")
            .expect("record");
        let second = recorder.seal();

        let changes = second.changed_lines();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].line_number, 5);
        assert_eq!(changes[0].summary, OutcomeKind::Killed);
        assert_eq!(changes[0].diff.previous_summary, OutcomeKind::Survived);
    }

    #[test]
    fn dropped_previous_degrades_to_no_diff() {
        let first = Arc::new({
            let recorder = RunRecorder::new();
            scenario(&recorder);
            recorder.seal()
        });
        let recorder = RunRecorder::with_previous(&first);
        recorder
            .record("a.b", FileId::new("F1"), OutcomeKind::Killed, 5, "other", "run")
            .expect("record");
        drop(first);
        let second = recorder.seal();
        assert!(second.previous().is_none());
        assert_eq!(second.diff_line("a.b", &FileId::new("F1"), 5), None);
    }

    #[test]
    fn package_names_are_normalized() {
        let recorder = RunRecorder::new();
        recorder
            .record("a..b.", FileId::new("F"), OutcomeKind::Killed, 0, "d", "m")
            .expect("record");
        recorder
            .record("a.b", FileId::new("F"), OutcomeKind::Survived, 0, "d", "m")
            .expect("record");
        let snapshot = recorder.seal();
        let file = snapshot.file("a.b", &FileId::new("F")).expect("file exists");
        assert_eq!(file.line(0).expect("line 0").records().len(), 2);
        assert_eq!(file.package(), "a.b");
    }

    #[test]
    fn rejected_records_are_not_counted() {
        let recorder = RunRecorder::new();
        let err = recorder
            .record("a", FileId::new("F"), OutcomeKind::Killed, -4, "d", "m")
            .expect_err("negative line");
        assert_eq!(err, AggregateError::NegativeLine(-4));
        assert_eq!(recorder.record_count(), 0);
        assert_eq!(recorder.seal().file_count(), 0);
    }

    #[test]
    fn multiple_packages_counts_files_as_branches() {
        let single = RunRecorder::new();
        single
            .record("a.b", FileId::new("F1"), OutcomeKind::Killed, 1, "d", "m")
            .expect("record");
        assert!(!single.seal().has_multiple_packages());

        let siblings = RunRecorder::new();
        for file in ["F1", "F2"] {
            siblings
                .record("a.b", FileId::new(file), OutcomeKind::Killed, 1, "d", "m")
                .expect("record");
        }
        assert!(siblings.seal().has_multiple_packages());

        let mixed = RunRecorder::new();
        mixed
            .record("a", FileId::new("F1"), OutcomeKind::Killed, 1, "d", "m")
            .expect("record");
        mixed
            .record("a.b", FileId::new("F2"), OutcomeKind::Killed, 1, "d", "m")
            .expect("record");
        assert!(mixed.seal().has_multiple_packages());

        assert!(!RunRecorder::new().seal().has_multiple_packages());
    }

    #[test]
    fn lines_beyond_u32_range_are_recorded() {
        let recorder = RunRecorder::new();
        recorder
            .record("a", FileId::new("F"), OutcomeKind::Survived, 5_000_000_000, "d", "m")
            .expect("wide line should be accepted");
        let snapshot = recorder.seal();
        let line = snapshot
            .line("a", &FileId::new("F"), 5_000_000_000)
            .expect("wide line recorded");
        assert_eq!(line.line_number(), 5_000_000_000);
        assert_eq!(snapshot.line_count(), 1);
    }
}
