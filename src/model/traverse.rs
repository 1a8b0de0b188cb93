//! Depth-first traversal of a package tree in a chosen display order.
//!
//! The engine never descends on its own past a package: each package is handed
//! to [`TreeVisitor::on_package`] together with a [`PackageDiver`], and the
//! visitor decides whether (and with which visitor) to walk the children.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::file::{FileAggregator, FileId, LineView};
use super::package::{PackageNode, TreeNode, package_segments};
use super::score::Score;

/// Which package levels appear in the traversal output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Every package level.
    #[default]
    Package,
    /// Only packages that directly contain files.
    CodeOnly,
    /// No packages below the root; files listed flat.
    None,
}

/// Sort key applied to the children of every package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Display label, case-sensitive lexicographic.
    #[default]
    Project,
    /// Rollup percentage, ties broken by label.
    Score,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Lowest first.
    #[default]
    Asc,
    /// Highest first.
    Desc,
}

/// Grouping and ordering of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayChoices {
    /// Package levels to emit.
    pub group_by: GroupBy,
    /// Sort key.
    pub sort_by: SortBy,
    /// Sort direction.
    pub direction: Direction,
    /// Show single-child package chains as one dotted label (package grouping only).
    pub collapse_packages: bool,
}

impl Default for DisplayChoices {
    fn default() -> Self {
        Self {
            group_by: GroupBy::default(),
            sort_by: SortBy::default(),
            direction: Direction::default(),
            collapse_packages: true,
        }
    }
}

/// A file as handed to [`TreeVisitor::on_file`].
#[derive(Debug, Clone, Copy)]
pub struct FileView<'a> {
    file: &'a FileAggregator,
    previous: Option<&'a FileAggregator>,
    score: Score,
}

impl<'a> FileView<'a> {
    /// File identifier.
    pub fn file_id(&self) -> &'a FileId {
        self.file.file_id()
    }

    /// Display label (file name).
    pub fn label(&self) -> &'a str {
        self.file.file_id().name()
    }

    /// Dotted package the file belongs to.
    pub fn package(&self) -> &'a str {
        self.file.package()
    }

    /// Line score of the file.
    pub fn score(&self) -> Score {
        self.score
    }

    /// Same file's score in the previous run, if it was there.
    pub fn previous_score(&self) -> Option<Score> {
        self.previous.map(FileAggregator::score)
    }

    /// Underlying aggregator.
    pub fn aggregator(&self) -> &'a FileAggregator {
        self.file
    }

    /// Lines in ascending order with their diffs against the previous run.
    pub fn lines(&self) -> impl Iterator<Item = LineView<'a>> + 'a {
        self.file.visit_lines(self.previous)
    }
}

/// A package as handed to [`TreeVisitor::on_package`].
#[derive(Debug, Clone)]
pub struct PackageView<'a> {
    label: String,
    node: &'a PackageNode,
    previous: Option<&'a PackageNode>,
}

impl<'a> PackageView<'a> {
    /// Display label: root label, segment, collapsed chain or qualified name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Dotted path of the package; empty for the root.
    pub fn qualified_name(&self) -> &'a str {
        self.node.qualified_name()
    }

    /// Rollup score.
    pub fn score(&self) -> Score {
        self.node.score()
    }

    /// Same package's rollup score in the previous run, if it was there.
    pub fn previous_score(&self) -> Option<Score> {
        self.previous.map(PackageNode::score)
    }

    /// True for the root node.
    pub fn is_root(&self) -> bool {
        self.node.is_root()
    }

    /// True if files sit directly in this package.
    pub fn has_files(&self) -> bool {
        self.node.has_files()
    }
}

/// Receives nodes in depth-first, parent-before-children order.
pub trait TreeVisitor {
    /// A file (terminal node).
    fn on_file(&mut self, file: FileView<'_>);

    /// A package. Call [`PackageDiver::apply`] to walk its children.
    fn on_package(&mut self, package: PackageView<'_>, children: PackageDiver<'_>);
}

#[derive(Debug, Clone, Copy)]
enum DiveTarget<'a> {
    Children(&'a PackageNode),
    FlatFiles(&'a PackageNode),
}

/// Walks one package's children with any visitor.
#[derive(Debug, Clone, Copy)]
pub struct PackageDiver<'a> {
    walker: &'a Walker<'a>,
    target: DiveTarget<'a>,
}

impl PackageDiver<'_> {
    /// Visit the children in display order.
    pub fn apply(&self, visitor: &mut dyn TreeVisitor) {
        match self.target {
            DiveTarget::Children(node) => self.walker.emit_children(node, visitor),
            DiveTarget::FlatFiles(node) => self.walker.emit_flat(node, visitor),
        }
    }
}

/// Walk `root` in the order given by `choices`, starting with the root package.
///
/// `previous` is the matching root of the preceding run, used for diffs.
pub fn traverse(
    root: &PackageNode,
    previous: Option<&PackageNode>,
    choices: &DisplayChoices,
    root_label: &str,
    visitor: &mut dyn TreeVisitor,
) {
    let walker = Walker {
        choices: *choices,
        previous,
    };
    let target = match choices.group_by {
        GroupBy::None => DiveTarget::FlatFiles(root),
        GroupBy::Package | GroupBy::CodeOnly => DiveTarget::Children(root),
    };
    let view = PackageView {
        label: root_label.to_string(),
        node: root,
        previous,
    };
    visitor.on_package(
        view,
        PackageDiver {
            walker: &walker,
            target,
        },
    );
}

struct Entry<'a> {
    node: TreeNode<'a>,
    // False for package levels the grouping hides; their children are spliced in.
    emit: bool,
    label: String,
    percentage: f64,
    score: Score,
}

impl Entry<'_> {
    fn kind_rank(&self) -> u8 {
        match self.node {
            TreeNode::Package(_) => 0,
            TreeNode::File(_) => 1,
        }
    }

    fn full_id(&self) -> &str {
        match self.node {
            TreeNode::Package(node) => node.qualified_name(),
            TreeNode::File(file) => file.file_id().as_str(),
        }
    }
}

#[derive(Debug)]
struct Walker<'a> {
    choices: DisplayChoices,
    previous: Option<&'a PackageNode>,
}

impl<'a> Walker<'a> {
    fn previous_package(&self, node: &PackageNode) -> Option<&'a PackageNode> {
        self.previous?.find(&package_segments(node.qualified_name()))
    }

    fn previous_file(&self, file: &FileAggregator) -> Option<&'a FileAggregator> {
        self.previous?
            .find(&package_segments(file.package()))?
            .file(file.file_id())
    }

    fn file_entry(file: &'a FileAggregator) -> Entry<'a> {
        let score = file.score();
        Entry {
            node: TreeNode::File(file),
            emit: true,
            label: file.file_id().name().to_string(),
            percentage: score.percentage(),
            score,
        }
    }

    fn package_entry(&self, node: &'a PackageNode) -> Entry<'a> {
        let (node, label, emit) = match self.choices.group_by {
            GroupBy::Package if self.choices.collapse_packages => {
                let (target, label) = collapse_chain(node);
                (target, label, true)
            }
            GroupBy::Package => (node, node.name().to_string(), true),
            GroupBy::CodeOnly => (node, node.qualified_name().to_string(), node.has_files()),
            GroupBy::None => (node, node.name().to_string(), false),
        };
        let score = node.score();
        Entry {
            node: TreeNode::Package(node),
            emit,
            label,
            percentage: score.percentage(),
            score,
        }
    }

    fn sort(&self, entries: &mut [Entry<'a>]) {
        let choices = self.choices;
        entries.sort_by(|a, b| {
            let primary = match choices.sort_by {
                SortBy::Project => Ordering::Equal,
                SortBy::Score => a.percentage.total_cmp(&b.percentage),
            };
            let ordering = primary
                .then_with(|| a.label.cmp(&b.label))
                .then_with(|| a.kind_rank().cmp(&b.kind_rank()))
                .then_with(|| a.full_id().cmp(b.full_id()))
                .then_with(|| a.score.total().cmp(&b.score.total()));
            match choices.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        });
    }

    fn emit_file(&self, file: &'a FileAggregator, score: Score, visitor: &mut dyn TreeVisitor) {
        visitor.on_file(FileView {
            file,
            previous: self.previous_file(file),
            score,
        });
    }

    fn emit_children(&self, node: &'a PackageNode, visitor: &mut dyn TreeVisitor) {
        let mut entries: Vec<Entry<'a>> = node
            .children()
            .into_iter()
            .map(|child| match child {
                TreeNode::File(file) => Self::file_entry(file),
                TreeNode::Package(pkg) => self.package_entry(pkg),
            })
            .collect();
        self.sort(&mut entries);

        for entry in entries {
            match entry.node {
                TreeNode::File(file) => self.emit_file(file, entry.score, visitor),
                TreeNode::Package(node) if entry.emit => {
                    let view = PackageView {
                        label: entry.label,
                        node,
                        previous: self.previous_package(node),
                    };
                    visitor.on_package(
                        view,
                        PackageDiver {
                            walker: self,
                            target: DiveTarget::Children(node),
                        },
                    );
                }
                TreeNode::Package(node) => self.emit_children(node, visitor),
            }
        }
    }

    fn emit_flat(&self, node: &'a PackageNode, visitor: &mut dyn TreeVisitor) {
        let mut files = Vec::new();
        collect_files(node, &mut files);
        let mut entries: Vec<Entry<'a>> = files.into_iter().map(Self::file_entry).collect();
        self.sort(&mut entries);
        for entry in entries {
            if let TreeNode::File(file) = entry.node {
                self.emit_file(file, entry.score, visitor);
            }
        }
    }
}

fn collect_files<'a>(node: &'a PackageNode, out: &mut Vec<&'a FileAggregator>) {
    out.extend(node.files());
    for pkg in node.packages() {
        collect_files(pkg, out);
    }
}

/// Follow single-child chains of file-less packages: `a` -> `b` -> `c` shows as `a.b.c`.
fn collapse_chain(node: &PackageNode) -> (&PackageNode, String) {
    let mut label = node.name().to_string();
    let mut current = node;
    while !current.has_files() && current.package_count() == 1 {
        let Some(only) = current.packages().next() else {
            break;
        };
        label.push('.');
        label.push_str(only.name());
        current = only;
    }
    (current, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::outcome::OutcomeKind;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl TreeVisitor for Recorder {
        fn on_file(&mut self, file: FileView<'_>) {
            self.events.push(format!("file:{}", file.label()));
        }

        fn on_package(&mut self, package: PackageView<'_>, children: PackageDiver<'_>) {
            self.events.push(format!("pkg:{}", package.label()));
            children.apply(self);
        }
    }

    fn tree(records: &[(&str, &str, i64, OutcomeKind)]) -> PackageNode {
        let mut root = PackageNode::root();
        for (pkg, file, line, outcome) in records {
            root.insert(
                &package_segments(pkg),
                FileId::new(*file),
                *line,
                *outcome,
                "d",
                "m",
            )
            .expect("insert");
        }
        root.rollup();
        root
    }

    fn visit(root: &PackageNode, choices: DisplayChoices) -> Vec<String> {
        let mut recorder = Recorder::default();
        traverse(root, None, &choices, "root", &mut recorder);
        recorder.events
    }

    fn sample() -> PackageNode {
        tree(&[
            ("a.b", "F1.java", 5, OutcomeKind::Survived),
            ("a.b", "F1.java", 5, OutcomeKind::Killed),
            ("a.c", "F2.java", 1, OutcomeKind::Killed),
        ])
    }

    #[test]
    fn score_desc_puts_best_package_first() {
        let choices = DisplayChoices {
            sort_by: SortBy::Score,
            direction: Direction::Desc,
            ..DisplayChoices::default()
        };
        assert_eq!(
            visit(&sample(), choices),
            vec![
                "pkg:root",
                "pkg:a",
                "pkg:c",
                "file:F2.java",
                "pkg:b",
                "file:F1.java"
            ]
        );
    }

    #[test]
    fn project_sort_is_case_sensitive() {
        let root = tree(&[
            ("", "b.java", 1, OutcomeKind::Killed),
            ("", "B.java", 1, OutcomeKind::Killed),
            ("", "a.java", 1, OutcomeKind::Killed),
        ]);
        assert_eq!(
            visit(&root, DisplayChoices::default()),
            vec!["pkg:root", "file:B.java", "file:a.java", "file:b.java"]
        );
        let desc = DisplayChoices {
            direction: Direction::Desc,
            ..DisplayChoices::default()
        };
        assert_eq!(
            visit(&root, desc),
            vec!["pkg:root", "file:b.java", "file:a.java", "file:B.java"]
        );
    }

    #[test]
    fn collapse_merges_single_child_chains() {
        let root = tree(&[
            ("com.acme.core", "A.java", 1, OutcomeKind::Killed),
            ("com.acme.util", "B.java", 1, OutcomeKind::Killed),
        ]);
        assert_eq!(
            visit(&root, DisplayChoices::default()),
            vec![
                "pkg:root",
                "pkg:com.acme",
                "pkg:core",
                "file:A.java",
                "pkg:util",
                "file:B.java"
            ]
        );
        let expanded = DisplayChoices {
            collapse_packages: false,
            ..DisplayChoices::default()
        };
        assert_eq!(visit(&root, expanded)[1..3], ["pkg:com", "pkg:acme"]);
    }

    #[test]
    fn code_only_skips_file_less_packages() {
        let root = tree(&[
            ("com.acme", "A.java", 1, OutcomeKind::Killed),
            ("com.acme.util", "B.java", 1, OutcomeKind::Killed),
        ]);
        let choices = DisplayChoices {
            group_by: GroupBy::CodeOnly,
            ..DisplayChoices::default()
        };
        assert_eq!(
            visit(&root, choices),
            vec![
                "pkg:root",
                "pkg:com.acme",
                "file:A.java",
                "pkg:com.acme.util",
                "file:B.java"
            ]
        );
    }

    #[test]
    fn flat_grouping_lists_files_only() {
        let root = tree(&[
            ("x.y", "Z.java", 1, OutcomeKind::Survived),
            ("x", "A.java", 1, OutcomeKind::Killed),
            ("q", "M.java", 1, OutcomeKind::Killed),
        ]);
        let choices = DisplayChoices {
            group_by: GroupBy::None,
            sort_by: SortBy::Score,
            direction: Direction::Asc,
            ..DisplayChoices::default()
        };
        assert_eq!(
            visit(&root, choices),
            vec!["pkg:root", "file:Z.java", "file:A.java", "file:M.java"]
        );
    }

    #[test]
    fn empty_tree_emits_only_root() {
        let root = tree(&[]);
        assert_eq!(visit(&root, DisplayChoices::default()), vec!["pkg:root"]);
    }

    #[test]
    fn visitor_can_stop_descending() {
        struct TopOnly(Vec<String>);
        impl TreeVisitor for TopOnly {
            fn on_file(&mut self, file: FileView<'_>) {
                self.0.push(file.label().to_string());
            }
            fn on_package(&mut self, package: PackageView<'_>, children: PackageDiver<'_>) {
                self.0.push(package.label().to_string());
                if package.is_root() {
                    children.apply(self);
                }
            }
        }
        let mut visitor = TopOnly(Vec::new());
        traverse(&sample(), None, &DisplayChoices::default(), "root", &mut visitor);
        assert_eq!(visitor.0, vec!["root", "a"]);
    }

    #[test]
    fn previous_scores_are_resolved_by_path() {
        let previous = tree(&[("a.b", "F1.java", 5, OutcomeKind::Killed)]);
        let current = sample();

        struct Scores(Vec<(String, Option<f64>)>);
        impl TreeVisitor for Scores {
            fn on_file(&mut self, file: FileView<'_>) {
                let prev = file.previous_score().map(|s| s.percentage());
                self.0.push((file.label().to_string(), prev));
            }
            fn on_package(&mut self, package: PackageView<'_>, children: PackageDiver<'_>) {
                let prev = package.previous_score().map(|s| s.percentage());
                self.0.push((package.qualified_name().to_string(), prev));
                children.apply(self);
            }
        }
        let mut visitor = Scores(Vec::new());
        traverse(
            &current,
            Some(&previous),
            &DisplayChoices::default(),
            "root",
            &mut visitor,
        );
        assert_eq!(
            visitor.0,
            vec![
                ("".to_string(), Some(100.0)),
                ("a".to_string(), Some(100.0)),
                ("a.b".to_string(), Some(100.0)),
                ("F1.java".to_string(), Some(100.0)),
                ("a.c".to_string(), None),
                ("F2.java".to_string(), None),
            ]
        );
    }
}
