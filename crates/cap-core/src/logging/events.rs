//! Structured event definitions for logging.
//!
//! Events carry the invocation's run_id and the pipeline stage so JSONL logs
//! from a batch can be grouped per subject.

use serde::{Deserialize, Serialize};

/// Processing stages of a capcalc run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading label files.
    Load,
    /// State filter pre-stage.
    Filter,
    /// Transition and run-length statistics.
    Stats,
    /// Writing tables and reports.
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Filter => "filter",
            Stage::Stats => "stats",
            Stage::Write => "write",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const LABELS_LOADED: &str = "load.labels";
    pub const FILTER_FINISHED: &str = "filter.finished";
    pub const STATS_FINISHED: &str = "stats.finished";
    pub const SUBJECT_FAILED: &str = "stats.subject_failed";
    pub const TABLES_WRITTEN: &str = "write.tables";
}

/// Correlation context shared by every event of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }
}
