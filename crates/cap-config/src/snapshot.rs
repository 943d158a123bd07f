//! Configuration snapshots for result provenance.
//!
//! A snapshot records the effective configuration an analysis ran with, so
//! a statistics table can be traced back to its thresholds and source file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ResolvedConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    pub schema_version: String,

    /// Where the configuration came from.
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the config file content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numlabels: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minlabel: Option<i64>,

    pub minlength: usize,
    pub minhold: usize,
}

impl ConfigSnapshot {
    /// Snapshot the effective values of a resolved configuration.
    pub fn from_resolved(resolved: &ResolvedConfig) -> Self {
        let config = &resolved.config;
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            source: resolved.source.to_string(),
            path: resolved.path.as_ref().map(|p| p.display().to_string()),
            content_hash: resolved.content_hash.clone(),
            numlabels: config.labels.numlabels,
            minlabel: config.labels.minlabel,
            minlength: config.filter.minlength,
            minhold: config.filter.minhold,
        }
    }
}

/// Hex-encoded SHA-256 of `content`.
pub fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
