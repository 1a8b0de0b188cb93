use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use mutascope::model::{Direction, GroupBy, RunRecorder, RunSnapshot, SortBy};
use mutascope::{ReportFormat, ViewConfig, read_records_from_path, render_report};

#[derive(Debug, Parser)]
#[command(name = "mutascope")]
#[command(about = "Aggregate, score and diff mutation-testing results")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a report for a record file.
    Report {
        /// Line-delimited JSON mutation records.
        records: PathBuf,
        /// Records of the previous run over the same inputs.
        #[arg(long)]
        previous: Option<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value = "md")]
        format: OutputFormat,
        /// JSON view configuration; flags below override it.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Package levels to show.
        #[arg(long, value_enum)]
        group_by: Option<GroupArg>,
        /// Sort key.
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Sort direction.
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,
        /// Show every package level instead of collapsing single-child chains.
        #[arg(long)]
        no_collapse: bool,
        /// Label of the root node.
        #[arg(long)]
        root_label: Option<String>,
    },
    /// List lines whose mutations changed since the previous run.
    Diff {
        /// Line-delimited JSON mutation records.
        records: PathBuf,
        /// Records of the previous run over the same inputs.
        #[arg(long)]
        previous: PathBuf,
        /// Emit JSON output.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Markdown
    Md,
    /// JSON
    Json,
    /// SARIF 2.1.0
    Sarif,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupArg {
    /// Every package level
    Package,
    /// Only packages holding files
    Code,
    /// Flat file list
    None,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    /// Label
    Project,
    /// Mutation score
    Score,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

fn load_run(path: &Path, previous: Option<&Arc<RunSnapshot>>) -> Result<RunSnapshot> {
    let recorder = match previous {
        Some(previous) => RunRecorder::with_previous(previous),
        None => RunRecorder::new(),
    };
    let stats = read_records_from_path(path, &recorder)
        .with_context(|| format!("failed to read records from {}", path.display()))?;
    info!(
        path = %path.display(),
        records = stats.records,
        malformed = stats.malformed,
        rejected = stats.rejected,
        "loaded run"
    );
    Ok(recorder.seal())
}

fn load_previous(path: Option<&Path>) -> Result<Option<Arc<RunSnapshot>>> {
    path.map(|path| load_run(path, None).map(Arc::new))
        .transpose()
}

fn make_config(
    config: Option<&Path>,
    group_by: Option<GroupArg>,
    sort: Option<SortArg>,
    direction: Option<DirectionArg>,
    no_collapse: bool,
    root_label: Option<String>,
) -> Result<ViewConfig> {
    let mut view = match config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read view config {}", path.display()))?;
            ViewConfig::from_json_str(&raw)
                .with_context(|| format!("invalid view config {}", path.display()))?
        }
        None => ViewConfig::default(),
    };
    if let Some(group_by) = group_by {
        view = view.with_group_by(match group_by {
            GroupArg::Package => GroupBy::Package,
            GroupArg::Code => GroupBy::CodeOnly,
            GroupArg::None => GroupBy::None,
        });
    }
    if let Some(sort) = sort {
        view = view.with_sort_by(match sort {
            SortArg::Project => SortBy::Project,
            SortArg::Score => SortBy::Score,
        });
    }
    if let Some(direction) = direction {
        view = view.with_direction(match direction {
            DirectionArg::Asc => Direction::Asc,
            DirectionArg::Desc => Direction::Desc,
        });
    }
    if no_collapse {
        view = view.with_collapse_packages(false);
    }
    if let Some(label) = root_label {
        view = view.with_root_label(label);
    }
    Ok(view)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Report {
            records,
            previous,
            format,
            config,
            group_by,
            sort,
            direction,
            no_collapse,
            root_label,
        } => {
            let view = make_config(
                config.as_deref(),
                group_by,
                sort,
                direction,
                no_collapse,
                root_label,
            )?;
            let previous = load_previous(previous.as_deref())?;
            let snapshot = load_run(&records, previous.as_ref())?;
            let format = match format {
                OutputFormat::Md => ReportFormat::Markdown,
                OutputFormat::Json => ReportFormat::Json,
                OutputFormat::Sarif => ReportFormat::Sarif,
            };
            println!("{}", render_report(&snapshot, &view, format));
        }
        Command::Diff {
            records,
            previous,
            json,
        } => {
            let previous = Arc::new(load_run(&previous, None)?);
            let snapshot = load_run(&records, Some(&previous))?;
            let changes = snapshot.changed_lines();
            if json {
                println!("{}", serde_json::to_string_pretty(&changes)?);
            } else {
                for change in &changes {
                    println!(
                        "{}\t{}\t{}\t{} -> {}",
                        change.package,
                        change.file_id,
                        change.line_number,
                        change.diff.previous_summary,
                        change.summary
                    );
                }
                println!("changed lines: {}", changes.len());
            }
        }
    }

    Ok(())
}
