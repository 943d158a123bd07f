//! Plain-text result tables.
//!
//! Three whitespace-separated tables are written per analysed sequence:
//!
//! - `<root>_statestats.txt`: one row per state, columns in
//!   [`STATS_COLUMNS`] order
//! - `<root>_transmat.txt`: the transition count matrix, row = source state
//! - `<root>_runlengths.txt`: one line per state listing its run lengths in
//!   order of occurrence (blank when the state never occurs)
//!
//! Each table starts with a `#` header line so it stays loadable by tools
//! that skip comments.

use cap_math::{StateAnalysis, STATS_COLUMNS};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Suffixes of the files written by [`write_tables`].
pub const TABLE_SUFFIXES: [&str; 3] = ["_statestats.txt", "_transmat.txt", "_runlengths.txt"];

/// Statistics table text.
pub fn statestats_table(analysis: &StateAnalysis) -> String {
    let mut out = format!("# {}\n", STATS_COLUMNS.join(" "));
    for stats in &analysis.stats {
        let row: Vec<String> = stats.as_row().iter().map(|v| v.to_string()).collect();
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    out
}

/// Transition matrix text.
pub fn transmat_table(analysis: &StateAnalysis) -> String {
    let mut out = state_header(analysis);
    for row in analysis.transitions.rows() {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

/// Run-length lists text.
pub fn runlengths_table(analysis: &StateAnalysis) -> String {
    let mut out = state_header(analysis);
    for lengths in analysis.run_lengths.iter() {
        let cells: Vec<String> = lengths.iter().map(|l| l.to_string()).collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

fn state_header(analysis: &StateAnalysis) -> String {
    let mut out = String::from("# states");
    for label in analysis.range.labels() {
        let _ = write!(out, " {}", label);
    }
    out.push('\n');
    out
}

/// Path of one table for output root `root`.
pub fn table_path(root: &Path, suffix: &str) -> PathBuf {
    let mut name = root.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write all three tables next to `root`, creating the parent directory.
///
/// Returns the written paths in [`TABLE_SUFFIXES`] order.
pub fn write_tables(analysis: &StateAnalysis, root: &Path) -> std::io::Result<Vec<PathBuf>> {
    if let Some(parent) = root.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let contents = [
        statestats_table(analysis),
        transmat_table(analysis),
        runlengths_table(analysis),
    ];

    let mut written = Vec::with_capacity(TABLE_SUFFIXES.len());
    for (suffix, content) in TABLE_SUFFIXES.iter().zip(contents) {
        let path = table_path(root, suffix);
        std::fs::write(&path, content)?;
        written.push(path);
    }

    tracing::debug!(root = %root.display(), files = written.len(), "wrote result tables");
    Ok(written)
}
