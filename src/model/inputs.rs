//! The set of inputs a run was executed over.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum length of [`InputSet::report_name`].
pub const MAX_REPORT_NAME_LENGTH: usize = 24;

/// Kind of input path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputCategory {
    /// Source file under mutation.
    SourceFile,
    /// Test file exercised against mutants.
    TestFile,
    /// Source package directory.
    SourcePackage,
    /// Test package directory.
    TestPackage,
}

impl InputCategory {
    /// All categories.
    pub const ALL: [InputCategory; 4] = [
        Self::SourceFile,
        Self::TestFile,
        Self::SourcePackage,
        Self::TestPackage,
    ];

    /// True for test inputs.
    pub fn is_test(self) -> bool {
        matches!(self, Self::TestFile | Self::TestPackage)
    }

    /// True for package inputs.
    pub fn is_package(self) -> bool {
        matches!(self, Self::SourcePackage | Self::TestPackage)
    }
}

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Inputs are project-relative.
    #[error("input path must be relative: {0}")]
    AbsolutePath(String),
}

/// Project-relative inputs of a run. Two runs over equal sets are the same
/// logical run, the later one superseding the earlier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InputSet {
    source_files: BTreeSet<String>,
    test_files: BTreeSet<String>,
    source_packages: BTreeSet<String>,
    test_packages: BTreeSet<String>,
}

impl InputSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, category: InputCategory) -> &BTreeSet<String> {
        match category {
            InputCategory::SourceFile => &self.source_files,
            InputCategory::TestFile => &self.test_files,
            InputCategory::SourcePackage => &self.source_packages,
            InputCategory::TestPackage => &self.test_packages,
        }
    }

    fn bucket_mut(&mut self, category: InputCategory) -> &mut BTreeSet<String> {
        match category {
            InputCategory::SourceFile => &mut self.source_files,
            InputCategory::TestFile => &mut self.test_files,
            InputCategory::SourcePackage => &mut self.source_packages,
            InputCategory::TestPackage => &mut self.test_packages,
        }
    }

    /// Add one relative path.
    pub fn add(&mut self, category: InputCategory, path: impl Into<String>) -> Result<&mut Self, InputError> {
        let path = path.into();
        if path.starts_with('/') {
            return Err(InputError::AbsolutePath(path));
        }
        self.bucket_mut(category).insert(path);
        Ok(self)
    }

    /// Builder form of [`InputSet::add`].
    pub fn with(mut self, category: InputCategory, path: impl Into<String>) -> Result<Self, InputError> {
        self.add(category, path)?;
        Ok(self)
    }

    /// Sorted paths of the categories matching `filter`.
    pub fn paths(&self, filter: impl Fn(InputCategory) -> bool) -> Vec<&str> {
        let mut out: Vec<&str> = InputCategory::ALL
            .into_iter()
            .filter(|c| filter(*c))
            .flat_map(|c| self.bucket(c).iter().map(String::as_str))
            .collect();
        out.sort_unstable();
        out
    }

    /// True if no category matching `filter` has entries.
    pub fn is_empty_for(&self, filter: impl Fn(InputCategory) -> bool) -> bool {
        InputCategory::ALL
            .into_iter()
            .filter(|c| filter(*c))
            .all(|c| self.bucket(c).is_empty())
    }

    /// A run needs at least one source input and one test input.
    pub fn is_runnable(&self) -> bool {
        !self.is_empty_for(|c| !c.is_test()) && !self.is_empty_for(InputCategory::is_test)
    }

    /// Short label with the default length limit.
    pub fn default_report_name(&self) -> String {
        self.report_name(MAX_REPORT_NAME_LENGTH)
    }

    /// Comma-separated stems of the source inputs (test inputs if there are no
    /// sources), cut to `max_len` characters with a `...` marker.
    pub fn report_name(&self, max_len: usize) -> String {
        let name = short_name(&self.stems(|c| !c.is_test()), max_len);
        if name.is_empty() {
            short_name(&self.stems(InputCategory::is_test), max_len)
        } else {
            name
        }
    }

    fn stems(&self, filter: impl Fn(InputCategory) -> bool) -> Vec<String> {
        let mut stems: Vec<String> = self.paths(filter).into_iter().map(stem).collect();
        stems.sort();
        stems
    }
}

/// `"a/b/Foo.java"` gives `"Foo"`.
fn stem(path: &str) -> String {
    let without_ext = match path.rfind('.') {
        Some(ix) => &path[..ix],
        None => path,
    };
    without_ext
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_ext)
        .to_string()
}

fn short_name(parts: &[String], max_len: usize) -> String {
    let mut out = String::new();
    let mut len = 0usize;
    for part in parts {
        if !out.is_empty() {
            out.push(',');
            len += 1;
        }
        let left = max_len.saturating_sub(len);
        if left == 0 {
            out.push_str("...");
            break;
        }
        let part_len = part.chars().count();
        if part_len > left {
            out.extend(part.chars().take(left));
            out.push_str("...");
            break;
        }
        out.push_str(part);
        len += part_len;
    }
    out
}
