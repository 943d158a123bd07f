//! Batch driver for `capcalc stats`.
//!
//! Each label file is analysed independently. A failure on one file is
//! recorded and logged, and the remaining files are still processed.

use crate::exit_codes::ExitCode;
use crate::labels::{read_labels, LabelFileError};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::output::tables::write_tables;
use crate::output::{SubjectFailure, SubjectReport};
use cap_config::AnalysisConfig;
use cap_math::{Label, StateAnalysis, StateError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why one label file could not be analysed.
#[derive(Debug, Error)]
pub enum SubjectError {
    #[error(transparent)]
    Labels(#[from] LabelFileError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("failed to write tables for {}: {source}", .root.display())]
    Write {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SubjectError {
    /// Stable numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            SubjectError::Labels(e) => e.code(),
            SubjectError::State(e) => e.code(),
            SubjectError::Write { .. } => 43,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubjectError::Labels(LabelFileError::Io { .. }) => "label_file_io",
            SubjectError::Labels(LabelFileError::InvalidToken { .. }) => "invalid_token",
            SubjectError::Labels(LabelFileError::Empty { .. }) => "empty_label_file",
            SubjectError::State(e) => e.kind(),
            SubjectError::Write { .. } => "write_failed",
        }
    }

    /// Process exit code for a run that failed with this error alone.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SubjectError::Labels(e) if e.is_io() => ExitCode::IoError,
            SubjectError::Labels(_) => ExitCode::InvalidLabels,
            SubjectError::State(StateError::InvalidConfiguration { .. }) => ExitCode::ArgsError,
            SubjectError::State(_) => ExitCode::InvalidLabels,
            SubjectError::Write { .. } => ExitCode::IoError,
        }
    }
}

/// Analyse an in-memory label sequence with `config`.
pub fn analyze_labels(
    labels: &[Label],
    config: &AnalysisConfig,
) -> Result<StateAnalysis, StateError> {
    let range = config.label_range(labels)?;
    let thresholds = config.thresholds()?;
    StateAnalysis::compute(labels, range, thresholds)
}

/// Read, analyse and optionally write tables for one label file.
pub fn analyze_file(
    path: &Path,
    config: &AnalysisConfig,
    output_root: Option<&Path>,
) -> Result<SubjectReport, SubjectError> {
    let labels = read_labels(path)?;
    let analysis = analyze_labels(&labels, config)?;
    let mut report = SubjectReport::new(path.display().to_string(), &labels, &analysis);

    if let Some(root) = output_root {
        let written = write_tables(&analysis, root).map_err(|source| SubjectError::Write {
            root: root.to_path_buf(),
            source,
        })?;
        report.outputs = written.iter().map(|p| p.display().to_string()).collect();
    }
    Ok(report)
}

/// Output root for each input.
///
/// A single input uses `root` as-is. Several inputs use `<root>_<stem>`,
/// with `_<position>` appended when two inputs share a file stem.
pub fn output_roots(root: &Path, inputs: &[PathBuf]) -> Vec<PathBuf> {
    if inputs.len() == 1 {
        return vec![root.to_path_buf()];
    }

    let stems: Vec<String> = inputs
        .iter()
        .map(|p| {
            p.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "labels".to_string())
        })
        .collect();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *seen.entry(stem.as_str()).or_default() += 1;
    }

    stems
        .iter()
        .enumerate()
        .map(|(i, stem)| {
            let mut name = root.as_os_str().to_os_string();
            name.push("_");
            name.push(stem);
            if seen.get(stem.as_str()).copied().unwrap_or(0) > 1 {
                name.push(format!("_{}", i + 1));
            }
            PathBuf::from(name)
        })
        .collect()
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub subjects: Vec<SubjectReport>,
    pub failures: Vec<SubjectFailure>,
    first_error: Option<ExitCode>,
}

impl BatchOutcome {
    /// Clean when nothing failed, partial when something succeeded, and the
    /// first failure's code when everything failed.
    pub fn exit_code(&self) -> ExitCode {
        match self.first_error {
            None => ExitCode::Clean,
            Some(_) if !self.subjects.is_empty() => ExitCode::PartialFail,
            Some(code) => code,
        }
    }

    fn record_failure(&mut self, source: &Path, error: &SubjectError) {
        self.first_error.get_or_insert(error.exit_code());
        self.failures.push(SubjectFailure {
            source: source.display().to_string(),
            code: error.code(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }
}

/// Analyse every input, isolating per-file failures.
pub fn run_batch(
    inputs: &[PathBuf],
    config: &AnalysisConfig,
    output_root: Option<&Path>,
    ctx: &LogContext,
) -> BatchOutcome {
    let roots = output_root.map(|root| output_roots(root, inputs));
    let mut outcome = BatchOutcome::default();

    for (i, path) in inputs.iter().enumerate() {
        let root = roots.as_ref().and_then(|r| r.get(i)).map(PathBuf::as_path);
        match analyze_file(path, config, root) {
            Ok(report) => {
                log_event!(
                    ctx,
                    INFO,
                    event_names::STATS_FINISHED,
                    Stage::Stats,
                    "statistics computed",
                    source = report.source.as_str(),
                    timepoints = report.timepoints,
                    numlabels = report.range.numlabels()
                );
                if !report.outputs.is_empty() {
                    log_event!(
                        ctx,
                        DEBUG,
                        event_names::TABLES_WRITTEN,
                        Stage::Write,
                        "result tables written",
                        source = report.source.as_str(),
                        files = report.outputs.len()
                    );
                }
                outcome.subjects.push(report);
            }
            Err(error) => {
                log_event!(
                    ctx,
                    WARN,
                    event_names::SUBJECT_FAILED,
                    Stage::Stats,
                    "label file skipped",
                    source = tracing::field::display(path.display()),
                    code = error.code(),
                    error = tracing::field::display(&error)
                );
                outcome.record_failure(path, &error);
            }
        }
    }

    outcome
}
