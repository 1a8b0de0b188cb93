//! Package tree keyed by dotted package segments.

use std::collections::BTreeMap;

use tracing::trace;

use super::error::AggregateError;
use super::file::{FileAggregator, FileId, checked_line};
use super::outcome::{MutationRecord, OutcomeKind};
use super::score::Score;

/// Split a dotted package name into segments. The default package has none.
pub fn package_segments(package: &str) -> Vec<&str> {
    package.split('.').filter(|s| !s.is_empty()).collect()
}

/// A child of a package node: either a file or a sub-package.
#[derive(Debug, Clone, Copy)]
pub enum TreeNode<'a> {
    /// Terminal file.
    File(&'a FileAggregator),
    /// Nested package.
    Package(&'a PackageNode),
}

impl<'a> TreeNode<'a> {
    /// Label used for name sorting: file name or package segment.
    pub fn label(&self) -> &'a str {
        match *self {
            TreeNode::File(file) => file.file_id().name(),
            TreeNode::Package(pkg) => pkg.name(),
        }
    }

    /// Rollup score for packages, line score for files.
    pub fn score(&self) -> Score {
        match self {
            TreeNode::File(file) => file.score(),
            TreeNode::Package(pkg) => pkg.score(),
        }
    }
}

/// One package level in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageNode {
    name: String,
    qualified_name: String,
    packages: BTreeMap<String, PackageNode>,
    files: BTreeMap<FileId, FileAggregator>,
    score: Score,
}

impl PackageNode {
    /// The root ("all packages") node.
    pub fn root() -> Self {
        Self::default()
    }

    fn child(parent_qualified_name: &str, segment: &str) -> Self {
        trace!(package = parent_qualified_name, segment, "creating package node");
        let qualified_name = if parent_qualified_name.is_empty() {
            segment.to_string()
        } else {
            format!("{parent_qualified_name}.{segment}")
        };
        Self {
            name: segment.to_string(),
            qualified_name,
            ..Self::default()
        }
    }

    /// Segment name; empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path from the root; empty for the root.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// True for the root node.
    pub fn is_root(&self) -> bool {
        self.qualified_name.is_empty()
    }

    /// Rollup score. Zero until [`PackageNode::rollup`] has run.
    pub fn score(&self) -> Score {
        self.score
    }

    /// Child packages, by segment.
    pub fn packages(&self) -> impl Iterator<Item = &PackageNode> {
        self.packages.values()
    }

    /// Files directly in this package.
    pub fn files(&self) -> impl Iterator<Item = &FileAggregator> {
        self.files.values()
    }

    /// Number of direct child packages.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// True if at least one file sits directly in this package.
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Files and packages as one list, unsorted.
    pub fn children(&self) -> Vec<TreeNode<'_>> {
        self.packages
            .values()
            .map(TreeNode::Package)
            .chain(self.files.values().map(TreeNode::File))
            .collect()
    }

    /// Direct child package by segment.
    pub fn package(&self, segment: &str) -> Option<&PackageNode> {
        self.packages.get(segment)
    }

    /// Direct child file.
    pub fn file(&self, file_id: &FileId) -> Option<&FileAggregator> {
        self.files.get(file_id)
    }

    /// Package reached by walking `path` from this node.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&PackageNode> {
        path.iter()
            .try_fold(self, |node, segment| node.package(segment.as_ref()))
    }

    /// Files in this node and every package beneath it.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.packages.values().map(PackageNode::file_count).sum::<usize>()
    }

    /// Distinct lines in this node and every package beneath it.
    pub fn line_count(&self) -> usize {
        self.files.values().map(FileAggregator::line_count).sum::<usize>()
            + self.packages.values().map(PackageNode::line_count).sum::<usize>()
    }

    fn descend_or_create<S: AsRef<str>>(&mut self, path: &[S]) -> &mut PackageNode {
        let mut node = self;
        for segment in path {
            let segment = segment.as_ref();
            let parent_qualified_name = &node.qualified_name;
            node = node
                .packages
                .entry(segment.to_string())
                .or_insert_with(|| PackageNode::child(parent_qualified_name, segment));
        }
        node
    }

    /// Route one mutation to the file under `path`, creating nodes on first touch.
    pub fn insert<S: AsRef<str>>(
        &mut self,
        path: &[S],
        file_id: FileId,
        line_number: i64,
        outcome: OutcomeKind,
        description: impl Into<String>,
        method: impl Into<String>,
    ) -> Result<(), AggregateError> {
        let line_number = checked_line(line_number)?;
        let record = MutationRecord::new(method, line_number, outcome, description);
        let node = self.descend_or_create(path);
        let package = node.qualified_name.clone();
        node.files
            .entry(file_id)
            .or_insert_with_key(|id| FileAggregator::new(package, id.clone()))
            .append(record)
    }

    /// Place a whole file under `path`, merging into an existing file of the same id.
    pub fn adopt<S: AsRef<str>>(&mut self, path: &[S], file: FileAggregator) {
        let node = self.descend_or_create(path);
        match node.files.get_mut(file.file_id()) {
            Some(existing) => existing.absorb(file),
            None => {
                node.files.insert(file.file_id().clone(), file);
            }
        }
    }

    /// Fold scores bottom-up; every node's score becomes the sum of its children.
    pub fn rollup(&mut self) -> Score {
        let files: Score = self.files.values().map(FileAggregator::score).sum();
        let packages: Score = self.packages.values_mut().map(PackageNode::rollup).sum();
        self.score = files + packages;
        self.score
    }
}
