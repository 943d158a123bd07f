//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → defaults.

use crate::analysis::{AnalysisConfig, ConfigOverrides};
use crate::preset::{get_preset, PresetName};
use crate::snapshot::{hash_content, ConfigSnapshot};
use crate::validate::{validate_config, ValidationError, ValidationResult};
use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/capcalc/.
    SystemConfig,

    /// Selected by preset name.
    Preset(PresetName),

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::Preset(name) => write!(f, "preset {}", name),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
const ENV_CONFIG_PATH: &str = "CAPCALC_CONFIG";
const ENV_CONFIG_DIR: &str = "CAPCALC_CONFIG_DIR";

/// Standard config file names, in lookup order.
const CONFIG_FILENAMES: [&str; 2] = ["analysis.toml", "analysis.json"];

/// Application name for XDG directories.
const APP_NAME: &str = "capcalc";

/// A loaded, validated configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: AnalysisConfig,
    pub source: ConfigSource,
    /// File the configuration was read from (None for presets/defaults).
    pub path: Option<PathBuf>,
    /// SHA-256 of the file content (None for presets/defaults).
    pub content_hash: Option<String>,
}

impl ResolvedConfig {
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::from_resolved(self)
    }
}

/// Resolve the configuration file path.
///
/// Resolution order:
/// 1. Explicit CLI path (returned even if missing, so loading reports it)
/// 2. CAPCALC_CONFIG environment variable (same)
/// 3. CAPCALC_CONFIG_DIR environment variable + standard filename
/// 4. XDG config directory (~/.config/capcalc/)
/// 5. System config (/etc/capcalc/)
/// 6. Built-in defaults (None)
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    // 1. CLI argument
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        if !env_path.is_empty() {
            return (Some(PathBuf::from(env_path)), ConfigSource::Environment);
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_in_dir(Path::new(&config_dir)) {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 4. XDG config directory
    if let Some(path) = xdg_config_dir().as_deref().and_then(find_in_dir) {
        return (Some(path), ConfigSource::XdgConfig);
    }

    // 5. System config
    if let Some(path) = find_in_dir(&system_config_dir()) {
        return (Some(path), ConfigSource::SystemConfig);
    }

    (None, ConfigSource::BuiltinDefault)
}

/// First standard config file present in `dir`.
fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Get the XDG config directory for capcalc.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

/// Load, override and validate the analysis configuration.
///
/// A preset replaces file discovery entirely; overrides apply on top of
/// whichever base was chosen.
pub fn load_config(
    cli_path: Option<&Path>,
    preset: Option<PresetName>,
    overrides: &ConfigOverrides,
) -> ValidationResult<ResolvedConfig> {
    let mut resolved = match preset {
        Some(name) => ResolvedConfig {
            config: get_preset(name),
            source: ConfigSource::Preset(name),
            path: None,
            content_hash: None,
        },
        None => load_from_discovery(cli_path)?,
    };

    resolved.config.apply_overrides(overrides);
    validate_config(&resolved.config)?;

    tracing::debug!(
        source = %resolved.source,
        path = ?resolved.path,
        minlength = resolved.config.filter.minlength,
        minhold = resolved.config.filter.minhold,
        "configuration loaded"
    );

    Ok(resolved)
}

fn load_from_discovery(cli_path: Option<&Path>) -> ValidationResult<ResolvedConfig> {
    let (path, source) = resolve_config_path(cli_path);
    let Some(path) = path else {
        return Ok(ResolvedConfig {
            config: AnalysisConfig::default(),
            source,
            path: None,
            content_hash: None,
        });
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
    let config = AnalysisConfig::from_str_for_path(&content, &path)?;

    Ok(ResolvedConfig {
        config,
        source,
        content_hash: Some(hash_content(&content)),
        path: Some(path),
    })
}
