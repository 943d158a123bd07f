//! capcalc configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the analysis configuration file
//! - Config resolution (CLI → env → XDG → defaults)
//! - Named threshold presets
//! - Semantic validation
//! - Config snapshots for result provenance

pub mod analysis;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use analysis::{AnalysisConfig, ConfigOverrides, FilterSection, LabelSection};
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{load_config, resolve_config_path, ConfigSource, ResolvedConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
