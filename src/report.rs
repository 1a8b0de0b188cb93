//! Human-readable and machine-friendly report generation.

use serde_json::{Value, json};

use crate::config::ViewConfig;
use crate::model::outcome::OutcomeKind;
use crate::model::run::RunSnapshot;
use crate::model::score::Score;
use crate::model::traverse::{FileView, PackageDiver, PackageView, TreeVisitor};

/// Supported output formats for run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown tree with a changed-lines section.
    Markdown,
    /// JSON tree with per-line details inline.
    Json,
    /// SARIF format for GitHub Code Scanning.
    Sarif,
}

/// Render a sealed run in the requested format.
pub fn render_report(snapshot: &RunSnapshot, config: &ViewConfig, format: ReportFormat) -> String {
    match format {
        ReportFormat::Markdown => render_markdown_report(snapshot, config),
        ReportFormat::Json => render_json_report(snapshot, config),
        ReportFormat::Sarif => render_sarif_report(snapshot, config),
    }
}

fn score_json(score: Score) -> Value {
    json!({
        "killed": score.killed,
        "survived": score.survived,
        "no_coverage": score.no_coverage,
        "timed_out": score.timed_out,
        "run_error": score.run_error,
        "total": score.total(),
        "percentage": score.percentage(),
    })
}

fn score_cell(score: Score) -> String {
    format!("{:.2}% ({}/{})", score.percentage(), score.killed, score.total())
}

fn trend(current: Score, previous: Option<Score>) -> String {
    match previous {
        Some(previous) if previous != current => {
            format!(" (was {:.2}%)", previous.percentage())
        }
        _ => String::new(),
    }
}

struct MarkdownTree<'o> {
    out: &'o mut String,
    depth: usize,
}

impl TreeVisitor for MarkdownTree<'_> {
    fn on_file(&mut self, file: FileView<'_>) {
        self.out.push_str(&format!(
            "{}- {}: {}{}\n",
            "  ".repeat(self.depth),
            file.label(),
            score_cell(file.score()),
            trend(file.score(), file.previous_score())
        ));
    }

    fn on_package(&mut self, package: PackageView<'_>, children: PackageDiver<'_>) {
        self.out.push_str(&format!(
            "{}- **{}**: {}{}\n",
            "  ".repeat(self.depth),
            package.label(),
            score_cell(package.score()),
            trend(package.score(), package.previous_score())
        ));
        children.apply(&mut MarkdownTree {
            out: &mut *self.out,
            depth: self.depth + 1,
        });
    }
}

fn render_markdown_report(snapshot: &RunSnapshot, config: &ViewConfig) -> String {
    let score = snapshot.score();
    let mut out = format!("# Mutation Report: {}\n\n", config.root_label);

    out.push_str(&format!(
        "- files: {}\n- lines: {}\n- {}\n\n",
        snapshot.file_count(),
        snapshot.line_count(),
        score.describe()
    ));

    out.push_str("## Summary\n\n| outcome | lines |\n|---|---:|\n");
    for kind in OutcomeKind::ALL {
        out.push_str(&format!("| {} | {} |\n", kind, score.count(kind)));
    }
    out.push_str(&format!("| mutation score | {:.2}% |\n", score.percentage()));

    out.push_str("\n## Tree\n\n");
    snapshot.traverse(
        &config.display_choices(),
        &config.root_label,
        &mut MarkdownTree {
            out: &mut out,
            depth: 0,
        },
    );

    out.push_str("\n## Changed lines\n\n");
    if snapshot.previous().is_none() {
        out.push_str("No previous run to compare against.\n");
        return out;
    }
    let changes = snapshot.changed_lines();
    if changes.is_empty() {
        out.push_str("No changed lines.\n");
        return out;
    }
    out.push_str("| package | file | line | now | before |\n|---|---|---:|---|---|\n");
    for change in &changes {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            change.package,
            change.file_id,
            change.line_number,
            change.summary,
            change.diff.previous_summary
        ));
    }
    out
}

#[derive(Default)]
struct JsonTree {
    nodes: Vec<Value>,
}

impl TreeVisitor for JsonTree {
    fn on_file(&mut self, file: FileView<'_>) {
        let lines: Vec<Value> = file
            .lines()
            .map(|line| {
                json!({
                    "line": line.line_number,
                    "summary": line.summary,
                    "mutations": line.records,
                    "diff": line.diff,
                })
            })
            .collect();
        self.nodes.push(json!({
            "kind": "file",
            "label": file.label(),
            "file": file.file_id(),
            "package": file.package(),
            "score": score_json(file.score()),
            "previous_score": file.previous_score().map(score_json),
            "lines": lines,
        }));
    }

    fn on_package(&mut self, package: PackageView<'_>, children: PackageDiver<'_>) {
        let mut nested = JsonTree::default();
        children.apply(&mut nested);
        self.nodes.push(json!({
            "kind": "package",
            "label": package.label(),
            "package": package.qualified_name(),
            "score": score_json(package.score()),
            "previous_score": package.previous_score().map(score_json),
            "children": nested.nodes,
        }));
    }
}

fn render_json_report(snapshot: &RunSnapshot, config: &ViewConfig) -> String {
    let mut tree = JsonTree::default();
    snapshot.traverse(&config.display_choices(), &config.root_label, &mut tree);
    let root = tree.nodes.pop().unwrap_or(Value::Null);

    serde_json::to_string_pretty(&json!({
        "view": config,
        "files": snapshot.file_count(),
        "lines": snapshot.line_count(),
        "score": score_json(snapshot.score()),
        "has_previous": snapshot.previous().is_some(),
        "tree": root,
        "changed_lines": snapshot.changed_lines(),
    }))
    .expect("report JSON should serialize")
}

#[derive(Default)]
struct Survivors {
    results: Vec<Value>,
}

impl TreeVisitor for Survivors {
    fn on_file(&mut self, file: FileView<'_>) {
        for line in file.lines() {
            if line.summary != OutcomeKind::Survived {
                continue;
            }
            let descriptions: Vec<&str> = line
                .records
                .iter()
                .filter(|record| record.outcome == OutcomeKind::Survived)
                .map(|record| record.description.as_str())
                .collect();
            self.results.push(json!({
                "ruleId": "survived-mutant",
                "level": "warning",
                "message": {
                    "text": format!(
                        "Mutation survived in {} at line {}: {}",
                        file.file_id(),
                        line.line_number,
                        descriptions.join("; ")
                    )
                },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": {
                            "uri": file.file_id().as_str()
                        },
                        "region": {
                            "startLine": line.line_number.saturating_add(1)
                        }
                    }
                }]
            }));
        }
    }

    fn on_package(&mut self, _package: PackageView<'_>, children: PackageDiver<'_>) {
        children.apply(self);
    }
}

fn render_sarif_report(snapshot: &RunSnapshot, config: &ViewConfig) -> String {
    let mut survivors = Survivors::default();
    snapshot.traverse(&config.display_choices(), &config.root_label, &mut survivors);
    let score = snapshot.score();

    serde_json::to_string_pretty(&json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "rules": [{
                        "id": "survived-mutant",
                        "shortDescription": {
                            "text": "Survived Mutant"
                        },
                        "fullDescription": {
                            "text": "A source line where at least one mutation was not caught by any test."
                        },
                        "defaultConfiguration": {
                            "level": "warning"
                        }
                    }]
                }
            },
            "results": survivors.results,
            "properties": {
                "mutationScore": score.percentage(),
                "lines": score.total(),
                "killed": score.killed,
                "survived": score.survived
            }
        }]
    }))
    .expect("SARIF JSON should serialize")
}
