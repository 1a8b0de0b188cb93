//! Prelude module for convenient imports.
//!
//! ```rust
//! use mutascope::prelude::*;
//! ```

pub use crate::config::ViewConfig;
pub use crate::ingest::{IngestError, IngestStats, read_records, read_records_from_path};
pub use crate::model::{
    AggregateError, ChangedLine, Direction, DisplayChoices, FileAggregator, FileId, FileView,
    GroupBy, InputCategory, InputSet, LineAggregator, LineDiff, MutationRecord, OutcomeKind,
    PackageDiver, PackageNode, PackageView, RunMeta, RunRecorder, RunRegistry, RunSnapshot,
    RunState, Score, SortBy, TreeVisitor,
};
pub use crate::report::{ReportFormat, render_report};

#[cfg(feature = "testing")]
pub use crate::testing::{
    RecordInput, assert_rollup_consistent, assert_score_counts_lines, record_stream, seal_records,
};
