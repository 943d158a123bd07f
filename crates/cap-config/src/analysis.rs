//! Analysis configuration types.
//!
//! The configuration describes the label range the clustering step produced
//! and the thresholds for the state filter pre-stage. It can be written as
//! TOML or JSON:
//!
//! ```toml
//! schema_version = "1.0.0"
//!
//! [labels]
//! numlabels = 8
//! minlabel = 0
//!
//! [filter]
//! minlength = 2
//! minhold = 2
//! ```

use crate::validate::{ValidationError, ValidationResult};
use cap_math::{FilterThresholds, Label, LabelRange, StateError};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_threshold() -> usize {
    1
}

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub labels: LabelSection,

    #[serde(default)]
    pub filter: FilterSection,
}

/// Declared label range. Missing values are inferred from the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numlabels: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minlabel: Option<Label>,
}

/// State filter thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSection {
    /// Patch threshold. `minout` is accepted as an alias.
    #[serde(default = "default_threshold", alias = "minout")]
    pub minlength: usize,

    /// Fill threshold.
    #[serde(default = "default_threshold")]
    pub minhold: usize,
}

impl Default for FilterSection {
    fn default() -> Self {
        FilterSection {
            minlength: default_threshold(),
            minhold: default_threshold(),
        }
    }
}

/// Per-field overrides, usually from CLI flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub numlabels: Option<usize>,
    pub minlabel: Option<Label>,
    pub minlength: Option<usize>,
    pub minhold: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            schema_version: default_schema_version(),
            labels: LabelSection::default(),
            filter: FilterSection::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_str_for_path(&content, path)
    }

    /// Parse `content` in the format implied by `path`'s extension.
    pub fn from_str_for_path(content: &str, path: &Path) -> ValidationResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(content),
            Some("json") => Self::from_json_str(content),
            other => Err(ValidationError::UnsupportedFormat(format!(
                "{} (extension {:?}, expected .toml or .json)",
                path.display(),
                other.unwrap_or("")
            ))),
        }
    }

    pub fn from_json_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    pub fn from_toml_str(text: &str) -> ValidationResult<Self> {
        toml::from_str(text).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    /// Apply overrides field by field.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(numlabels) = overrides.numlabels {
            self.labels.numlabels = Some(numlabels);
        }
        if let Some(minlabel) = overrides.minlabel {
            self.labels.minlabel = Some(minlabel);
        }
        if let Some(minlength) = overrides.minlength {
            self.filter.minlength = minlength;
        }
        if let Some(minhold) = overrides.minhold {
            self.filter.minhold = minhold;
        }
    }

    /// Filter thresholds, validated.
    pub fn thresholds(&self) -> Result<FilterThresholds, StateError> {
        FilterThresholds::new(self.filter.minlength, self.filter.minhold)
    }

    /// Label range for `labels`.
    ///
    /// Declared values win. A missing `minlabel` defaults to 0 when
    /// `numlabels` is declared; a missing `numlabels` covers up to the largest
    /// observed label. With neither declared the range is inferred from the
    /// observed minimum and maximum.
    pub fn label_range(&self, labels: &[Label]) -> Result<LabelRange, StateError> {
        match (self.labels.minlabel, self.labels.numlabels) {
            (Some(minlabel), Some(numlabels)) => LabelRange::new(minlabel, numlabels),
            (None, Some(numlabels)) => LabelRange::new(0, numlabels),
            (Some(minlabel), None) => {
                let max = labels.iter().copied().max().unwrap_or(minlabel).max(minlabel);
                LabelRange::spanning(minlabel, max)
            }
            (None, None) => LabelRange::from_labels(labels),
        }
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> ValidationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ValidationError::ParseError(e.to_string()))
    }
}
