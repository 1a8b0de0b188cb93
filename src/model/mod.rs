//! Aggregation engine: mutation records folded into lines, files and a package tree.

pub mod error;
pub mod file;
pub mod inputs;
pub mod line;
pub mod outcome;
pub mod package;
pub mod registry;
pub mod run;
pub mod score;
pub mod traverse;

pub use error::AggregateError;
pub use file::{FileAggregator, FileId, LineView};
pub use inputs::{InputCategory, InputError, InputSet, MAX_REPORT_NAME_LENGTH};
pub use line::{LineAggregator, LineDiff};
pub use outcome::{MutationRecord, OutcomeKind, ParseOutcomeError};
pub use package::{PackageNode, TreeNode, package_segments};
pub use registry::{RunEntry, RunMeta, RunRegistry, RunState};
pub use run::{ChangedLine, RunRecorder, RunSnapshot};
pub use score::Score;
pub use traverse::{
    Direction, DisplayChoices, FileView, GroupBy, PackageDiver, PackageView, SortBy,
    TreeVisitor, traverse,
};
