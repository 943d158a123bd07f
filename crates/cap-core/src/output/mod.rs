//! Command payloads and their renderings.
//!
//! Every command builds a serializable report and renders it in the format
//! chosen with `--format`. Reports go to stdout; diagnostics go to stderr.

pub mod tables;

use cap_config::ConfigSnapshot;
use cap_math::{
    FilterStep, FilterThresholds, Label, LabelRange, StateAnalysis, StateStats, StepCounts,
    STATS_COLUMNS,
};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Schema version of the JSON payloads.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON (default)
    #[default]
    Json,

    /// Human-readable Markdown
    Md,

    /// One-line summary for quick status checks
    Summary,

    /// Plain whitespace-separated tables, same layout as the written files
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Md => write!(f, "md"),
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

// ============================================================================
// Filter
// ============================================================================

/// One traced index of a filter run.
#[derive(Debug, Clone, Serialize)]
pub struct TracedIndex {
    pub index: usize,
    pub label: Label,
    pub filtered: Label,
    #[serde(flatten)]
    pub step: FilterStep,
}

/// Result of `capcalc filter`.
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub thresholds: FilterThresholds,
    pub timepoints: usize,
    /// Number of indices whose label was rewritten.
    pub changed: usize,
    pub filtered: Vec<Label>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<StepCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TracedIndex>>,
}

/// Render a filter report.
pub fn render_filter(report: &FilterReport, format: OutputFormat) -> serde_json::Result<String> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)? + "\n",
        OutputFormat::Summary => format!(
            "[{}] filter {}: {} timepoints, {} changed (minlength={}, minhold={})\n",
            report.run_id,
            report.source,
            report.timepoints,
            report.changed,
            report.thresholds.minlength,
            report.thresholds.minhold
        ),
        OutputFormat::Text => match &report.trace {
            Some(trace) => {
                let mut out = String::from("# index label filtered step\n");
                for t in trace {
                    let _ = writeln!(out, "{} {} {} {}", t.index, t.label, t.filtered, t.step);
                }
                out
            }
            None => crate::labels::format_labels(&report.filtered),
        },
        OutputFormat::Md => render_filter_md(report),
    };
    Ok(text)
}

fn render_filter_md(report: &FilterReport) -> String {
    let mut out = String::from("# State Filter\n\n");
    let _ = writeln!(out, "- Source: `{}`", report.source);
    let _ = writeln!(
        out,
        "- Thresholds: minlength={}, minhold={}",
        report.thresholds.minlength, report.thresholds.minhold
    );
    let _ = writeln!(out, "- Timepoints: {}", report.timepoints);
    let _ = writeln!(out, "- Changed: {}", report.changed);
    if let Some(counts) = &report.counts {
        let _ = writeln!(
            out,
            "- Steps: {} continue, {} patch, {} fill, {} switch",
            counts.continued, counts.patched, counts.filled, counts.switched
        );
    }
    out.push('\n');

    match &report.trace {
        Some(trace) => {
            out.push_str("| index | label | filtered | step |\n|---|---|---|---|\n");
            for t in trace {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    t.index, t.label, t.filtered, t.step
                );
            }
        }
        None => {
            out.push_str("```\n");
            out.push_str(&crate::labels::format_labels(&report.filtered));
            out.push_str("```\n");
        }
    }
    out
}

// ============================================================================
// Stats
// ============================================================================

/// Statistics record of one state, tagged with its label.
#[derive(Debug, Clone, Serialize)]
pub struct StateRecord {
    pub label: Label,
    #[serde(flatten)]
    pub stats: StateStats,
}

/// Results for one analysed label file.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    pub source: String,
    pub timepoints: usize,
    pub range: LabelRange,
    pub thresholds: FilterThresholds,
    /// Indices rewritten by the filter pre-stage.
    pub changed: usize,
    pub transitions: Vec<Vec<u64>>,
    pub probabilities: Vec<Vec<f64>>,
    pub states: Vec<StateRecord>,
    pub run_lengths: Vec<Vec<usize>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    /// Plain-text tables, kept for the `text` rendering.
    #[serde(skip)]
    pub tables: [String; 3],
}

impl SubjectReport {
    /// Build the report for `analysis` of `labels` read from `source`.
    pub fn new(source: String, labels: &[Label], analysis: &StateAnalysis) -> Self {
        let changed = labels
            .iter()
            .zip(&analysis.filtered)
            .filter(|(raw, out)| raw != out)
            .count();
        let states = analysis
            .range
            .labels()
            .zip(&analysis.stats)
            .map(|(label, stats)| StateRecord {
                label,
                stats: *stats,
            })
            .collect();

        SubjectReport {
            source,
            timepoints: analysis.len(),
            range: analysis.range,
            thresholds: analysis.thresholds,
            changed,
            transitions: analysis.transitions.to_rows(),
            probabilities: analysis.transitions.probabilities(),
            states,
            run_lengths: analysis.run_lengths.clone().into_inner(),
            outputs: Vec::new(),
            tables: [
                tables::statestats_table(analysis),
                tables::transmat_table(analysis),
                tables::runlengths_table(analysis),
            ],
        }
    }

    /// Number of label changes after filtering.
    pub fn state_changes(&self) -> u64 {
        self.transitions
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |(j, _)| *j != i)
                    .map(|(_, c)| *c)
            })
            .sum()
    }
}

/// A label file that could not be analysed.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectFailure {
    pub source: String,
    pub code: u32,
    pub kind: &'static str,
    pub message: String,
}

/// Result of `capcalc stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub config: ConfigSnapshot,
    pub subjects: Vec<SubjectReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SubjectFailure>,
}

/// Render a statistics report.
pub fn render_stats(report: &StatsReport, format: OutputFormat) -> serde_json::Result<String> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)? + "\n",
        OutputFormat::Summary => render_stats_summary(report),
        OutputFormat::Text => render_stats_text(report),
        OutputFormat::Md => render_stats_md(report),
    };
    Ok(text)
}

fn render_stats_summary(report: &StatsReport) -> String {
    let mut out = format!(
        "[{}] stats: {} ok, {} failed (minlength={}, minhold={})\n",
        report.run_id,
        report.subjects.len(),
        report.failures.len(),
        report.config.minlength,
        report.config.minhold
    );
    for subject in &report.subjects {
        let _ = writeln!(
            out,
            "  {}: {} timepoints, {} states, {} state changes, {} relabelled",
            subject.source,
            subject.timepoints,
            subject.range.numlabels(),
            subject.state_changes(),
            subject.changed
        );
    }
    for failure in &report.failures {
        let _ = writeln!(out, "  {}: FAILED {}", failure.source, failure.message);
    }
    out
}

fn render_stats_text(report: &StatsReport) -> String {
    let multiple = report.subjects.len() > 1;
    let mut out = String::new();
    for subject in &report.subjects {
        if multiple {
            let _ = writeln!(out, "## {}", subject.source);
        }
        for table in &subject.tables {
            out.push_str(table);
        }
    }
    out
}

fn render_stats_md(report: &StatsReport) -> String {
    let mut out = String::from("# State Statistics\n\n");
    let _ = writeln!(out, "- Run: `{}`", report.run_id);
    let _ = writeln!(out, "- Config: {}", report.config.source);
    let _ = writeln!(
        out,
        "- Thresholds: minlength={}, minhold={}",
        report.config.minlength, report.config.minhold
    );

    for subject in &report.subjects {
        let _ = write!(
            out,
            "\n## {}\n\n{} timepoints, labels {}..={}, {} relabelled by the filter\n\n",
            subject.source,
            subject.timepoints,
            subject.range.minlabel(),
            subject.range.maxlabel(),
            subject.changed
        );

        out.push_str("| state | ");
        out.push_str(&STATS_COLUMNS.join(" | "));
        out.push_str(" |\n|---|");
        out.push_str(&"---|".repeat(STATS_COLUMNS.len()));
        out.push('\n');
        for record in &subject.states {
            let s = &record.stats;
            let _ = writeln!(
                out,
                "| {} | {:.2} | {} | {} | {} | {} | {:.2} | {} | {:.3} |",
                record.label, s.percentage, s.runs, s.total, s.min, s.max, s.mean, s.median, s.std
            );
        }

        out.push_str("\n### Transitions\n\n| from \\ to |");
        for record in &subject.states {
            let _ = write!(out, " {} |", record.label);
        }
        out.push_str("\n|---|");
        out.push_str(&"---|".repeat(subject.states.len()));
        out.push('\n');
        for (record, row) in subject.states.iter().zip(&subject.transitions) {
            let _ = write!(out, "| {} |", record.label);
            for count in row {
                let _ = write!(out, " {} |", count);
            }
            out.push('\n');
        }

        if !subject.outputs.is_empty() {
            out.push_str("\nWritten:\n");
            for path in &subject.outputs {
                let _ = writeln!(out, "- `{}`", path);
            }
        }
    }

    if !report.failures.is_empty() {
        out.push_str("\n## Failures\n\n");
        for failure in &report.failures {
            let _ = writeln!(out, "- `{}`: {}", failure.source, failure.message);
        }
    }
    out
}
