//! Line-delimited JSON record reader.
//!
//! Each non-blank line is one mutation:
//!
//! ```text
//! {"package":"com.acme","file":"com/acme/Foo.java","outcome":"SURVIVED","line":12,
//!  "description":"negated conditional","method":"apply"}
//! ```
//!
//! `package`, `description` and `method` may be omitted.

use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::error::AggregateError;
use crate::model::file::FileId;
use crate::model::outcome::OutcomeKind;
use crate::model::run::RunRecorder;

/// Ingestion errors. Bad input lines are counted, not raised.
#[derive(Debug, Error)]
pub enum IngestError {
    /// IO failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Internal aggregation invariant broken.
    #[error("aggregation error: {0}")]
    Aggregate(#[from] AggregateError),
}

/// Counters from one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Records accepted by the recorder.
    pub records: usize,
    /// Lines that were not a valid record.
    pub malformed: usize,
    /// Well-formed records the recorder refused (negative line numbers).
    pub rejected: usize,
}

#[derive(Debug, Deserialize)]
struct RecordLine {
    #[serde(default)]
    package: String,
    file: String,
    outcome: String,
    line: i64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    method: String,
}

/// Feed every record in `reader` into `recorder`.
pub fn read_records<R: BufRead>(reader: R, recorder: &RunRecorder) -> Result<IngestStats, IngestError> {
    let mut stats = IngestStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;

        let parsed = match serde_json::from_str::<RecordLine>(&line) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(line = line_no, error = %err, "skipping malformed record");
                stats.malformed += 1;
                continue;
            }
        };
        let outcome = match parsed.outcome.parse::<OutcomeKind>() {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(line = line_no, error = %err, "skipping record with unknown outcome");
                stats.malformed += 1;
                continue;
            }
        };

        match recorder.record(
            &parsed.package,
            FileId::new(parsed.file),
            outcome,
            parsed.line,
            parsed.description,
            parsed.method,
        ) {
            Ok(()) => stats.records += 1,
            Err(err) if err.is_internal() => return Err(err.into()),
            Err(err) => {
                warn!(line = line_no, error = %err, "rejected record");
                stats.rejected += 1;
            }
        }
    }

    debug!(
        records = stats.records,
        malformed = stats.malformed,
        rejected = stats.rejected,
        "ingested record stream"
    );
    Ok(stats)
}

/// Open `path` and feed its records into `recorder`.
pub fn read_records_from_path(path: &Path, recorder: &RunRecorder) -> Result<IngestStats, IngestError> {
    let file = std::fs::File::open(path)?;
    read_records(BufReader::new(file), recorder)
}
