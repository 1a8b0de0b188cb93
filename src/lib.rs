//! # mutascope
//!
//! `mutascope` folds the outcomes of a mutation-testing run into a scored,
//! navigable package tree and diffs it against the previous run over the same
//! inputs. It is organized around:
//! - `model`: line, file and package aggregation, sealed run snapshots, the
//!   display-ordered traversal engine and the per-project run registry
//! - `config`: view configuration (grouping, sorting, labels)
//! - `ingest`: line-delimited JSON record reader
//! - `report`: Markdown, JSON and SARIF rendering
//! - `testing`: proptest strategies and run invariants (feature `testing`)
//!
//! Running the mutation tool itself is out of scope; records arrive already
//! produced.
//!
//! ```rust
//! use mutascope::prelude::*;
//!
//! let recorder = RunRecorder::new();
//! recorder
//!     .record("com.acme", FileId::new("com/acme/Foo.java"), OutcomeKind::Survived, 12, "negated conditional", "apply")
//!     .unwrap();
//! recorder
//!     .record("com.acme", FileId::new("com/acme/Foo.java"), OutcomeKind::Killed, 12, "removed call", "apply")
//!     .unwrap();
//! let snapshot = recorder.seal();
//! assert_eq!(snapshot.score().survived, 1);
//! assert_eq!(snapshot.score().total(), 1);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod config;
pub mod ingest;
pub mod model;
pub mod prelude;
pub mod report;

#[cfg(any(test, feature = "testing"))]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod testing;

pub use config::ViewConfig;
pub use ingest::{IngestError, IngestStats, read_records, read_records_from_path};
pub use report::{ReportFormat, render_report};
