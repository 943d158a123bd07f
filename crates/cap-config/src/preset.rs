//! Named threshold presets.
//!
//! - Passthrough: no filtering, statistics of the raw label sequence
//! - Smoothed: single-timepoint excursions are patched or filled

use crate::analysis::{AnalysisConfig, FilterSection};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// minlength = 1, minhold = 1
    Passthrough,
    /// minlength = 2, minhold = 2
    Smoothed,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[PresetName::Passthrough, PresetName::Smoothed];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Passthrough => "passthrough",
            PresetName::Smoothed => "smoothed",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "passthrough" | "raw" | "none" => Some(PresetName::Passthrough),
            "smoothed" | "smooth" | "filtered" => Some(PresetName::Smoothed),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Passthrough => "No state filtering; statistics of the raw labels",
            PresetName::Smoothed => "Patch and fill single-timepoint state excursions",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Preset lookup errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresetError {
    #[error("unknown preset '{0}' (available: passthrough, smoothed)")]
    UnknownPreset(String),
}

/// Summary of one preset for listings.
#[derive(Debug, Clone, Serialize)]
pub struct PresetInfo {
    pub name: PresetName,
    pub description: &'static str,
    pub minlength: usize,
    pub minhold: usize,
}

/// Build the configuration for a preset.
pub fn get_preset(name: PresetName) -> AnalysisConfig {
    let filter = match name {
        PresetName::Passthrough => FilterSection {
            minlength: 1,
            minhold: 1,
        },
        PresetName::Smoothed => FilterSection {
            minlength: 2,
            minhold: 2,
        },
    };
    AnalysisConfig {
        filter,
        ..AnalysisConfig::default()
    }
}

/// Describe every preset.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| {
            let config = get_preset(name);
            PresetInfo {
                name,
                description: name.description(),
                minlength: config.filter.minlength,
                minhold: config.filter.minhold,
            }
        })
        .collect()
}
