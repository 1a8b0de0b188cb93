//! Invariant assertions over sealed runs.

use std::sync::Arc;

use crate::model::outcome::OutcomeKind;
use crate::model::package::PackageNode;
use crate::model::run::{RunRecorder, RunSnapshot};
use crate::model::score::Score;
use crate::model::traverse::{DisplayChoices, FileView, PackageDiver, PackageView, TreeVisitor};

use super::generators::RecordInput;

/// Assert the run score counts exactly one unit per distinct line.
pub fn assert_score_counts_lines(snapshot: &RunSnapshot) {
    assert_eq!(
        snapshot.score().total() as usize,
        snapshot.line_count(),
        "score total does not match distinct lines"
    );
}

/// Assert every package score is the sum of its files and sub-packages.
pub fn assert_rollup_consistent(node: &PackageNode) {
    let files: Score = node.files().map(|file| file.score()).sum();
    let packages: Score = node.packages().map(PackageNode::score).sum();
    assert_eq!(
        node.score(),
        files + packages,
        "rollup mismatch at package {:?}",
        node.qualified_name()
    );
    node.packages().for_each(assert_rollup_consistent);
}

/// Assert each line summary is the highest-priority outcome among its records.
pub fn assert_worst_outcome_wins(snapshot: &RunSnapshot) {
    struct Check;
    impl TreeVisitor for Check {
        fn on_file(&mut self, file: FileView<'_>) {
            for line in file.lines() {
                let worst = line
                    .records
                    .iter()
                    .map(|record| record.outcome)
                    .max_by_key(|outcome| outcome.priority());
                assert_eq!(
                    Some(line.summary),
                    worst,
                    "line {} of {} has the wrong summary",
                    line.line_number,
                    file.file_id()
                );
                if line.records.iter().any(|r| r.outcome == OutcomeKind::Survived) {
                    assert_eq!(line.summary, OutcomeKind::Survived);
                }
            }
        }

        fn on_package(&mut self, _package: PackageView<'_>, children: PackageDiver<'_>) {
            children.apply(self);
        }
    }
    snapshot.traverse(&DisplayChoices::default(), "", &mut Check);
}

#[derive(Default)]
struct Labels(Vec<String>);

impl TreeVisitor for Labels {
    fn on_file(&mut self, file: FileView<'_>) {
        self.0.push(format!("file:{}", file.file_id()));
    }

    fn on_package(&mut self, package: PackageView<'_>, children: PackageDiver<'_>) {
        self.0.push(format!("pkg:{}", package.qualified_name()));
        children.apply(self);
    }
}

/// Node sequence of a full traversal.
pub fn traversal_order(snapshot: &RunSnapshot, choices: &DisplayChoices) -> Vec<String> {
    let mut labels = Labels::default();
    snapshot.traverse(choices, "root", &mut labels);
    labels.0
}

/// Assert repeated traversals with the same choices yield the same sequence.
pub fn assert_traversal_stable(snapshot: &RunSnapshot, choices: &DisplayChoices) {
    assert_eq!(
        traversal_order(snapshot, choices),
        traversal_order(snapshot, choices),
        "traversal order changed between passes"
    );
}

/// Assert re-recording `records` against the run sealed from them shows no changed lines.
pub fn assert_identical_rerun_unchanged(previous: &Arc<RunSnapshot>, records: &[RecordInput]) {
    let recorder = RunRecorder::with_previous(previous);
    for record in records {
        record.apply(&recorder).expect("generated records are valid");
    }
    let rerun = recorder.seal();
    assert!(
        rerun.changed_lines().is_empty(),
        "identical rerun reported changes: {:?}",
        rerun.changed_lines()
    );
    assert_eq!(rerun.score(), previous.score());
}
