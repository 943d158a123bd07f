//! Configuration loading and resolution tests against real files.
//!
//! Covers:
//! - TOML and JSON config files
//! - Resolution order (CLI > env path > env dir)
//! - Override precedence and snapshot provenance

use cap_config::{load_config, ConfigOverrides, ConfigSource, PresetName, ValidationError};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: [&str; 2] = ["CAPCALC_CONFIG", "CAPCALC_CONFIG_DIR"];

/// Restores the capcalc environment variables on drop.
struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn new() -> Self {
        let saved = ENV_KEYS
            .iter()
            .map(|key| (key.to_string(), env::var(key).ok()))
            .collect();
        for key in ENV_KEYS {
            env::remove_var(key);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write config fixture");
    path
}

#[test]
fn loads_toml_from_cli_path() {
    let _lock = lock_env();
    let _guard = EnvGuard::new();
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "analysis.toml",
        "[labels]\nnumlabels = 6\nminlabel = 1\n\n[filter]\nminlength = 2\nminhold = 3\n",
    );

    let resolved = load_config(Some(&path), None, &ConfigOverrides::default()).unwrap();
    assert_eq!(resolved.source, ConfigSource::CliArgument);
    assert_eq!(resolved.config.labels.numlabels, Some(6));
    assert_eq!(resolved.config.filter.minhold, 3);

    let snapshot = resolved.snapshot();
    assert_eq!(snapshot.path.as_deref(), Some(path.display().to_string().as_str()));
    assert_eq!(snapshot.content_hash.as_ref().map(String::len), Some(64));
    assert_eq!(snapshot.minlength, 2);
}

#[test]
fn env_path_is_used_without_cli_path() {
    let _lock = lock_env();
    let _guard = EnvGuard::new();
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "custom.json", r#"{"filter": {"minout": 3}}"#);
    env::set_var("CAPCALC_CONFIG", &path);

    let resolved = load_config(None, None, &ConfigOverrides::default()).unwrap();
    assert_eq!(resolved.source, ConfigSource::Environment);
    assert_eq!(resolved.config.filter.minlength, 3);
}

#[test]
fn env_dir_prefers_toml_over_json() {
    let _lock = lock_env();
    let _guard = EnvGuard::new();
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "analysis.json", r#"{"filter": {"minhold": 5}}"#);
    write_file(dir.path(), "analysis.toml", "[filter]\nminhold = 4\n");
    env::set_var("CAPCALC_CONFIG_DIR", dir.path());

    let resolved = load_config(None, None, &ConfigOverrides::default()).unwrap();
    assert_eq!(resolved.config.filter.minhold, 4);
    assert!(resolved
        .path
        .as_ref()
        .is_some_and(|p| p.ends_with("analysis.toml")));
}

#[test]
fn cli_path_beats_environment() {
    let _lock = lock_env();
    let _guard = EnvGuard::new();
    let dir = TempDir::new().unwrap();
    let env_path = write_file(dir.path(), "env.json", r#"{"filter": {"minhold": 5}}"#);
    let cli_path = write_file(dir.path(), "cli.json", r#"{"filter": {"minhold": 2}}"#);
    env::set_var("CAPCALC_CONFIG", &env_path);

    let resolved = load_config(Some(&cli_path), None, &ConfigOverrides::default()).unwrap();
    assert_eq!(resolved.source, ConfigSource::CliArgument);
    assert_eq!(resolved.config.filter.minhold, 2);
}

#[test]
fn overrides_beat_file_values() {
    let _lock = lock_env();
    let _guard = EnvGuard::new();
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "analysis.toml", "[filter]\nminlength = 3\n");

    let overrides = ConfigOverrides {
        minlength: Some(1),
        numlabels: Some(4),
        ..ConfigOverrides::default()
    };
    let resolved = load_config(Some(&path), None, &overrides).unwrap();
    assert_eq!(resolved.config.filter.minlength, 1);
    assert_eq!(resolved.config.labels.numlabels, Some(4));
}

#[test]
fn invalid_file_values_are_rejected() {
    let _lock = lock_env();
    let _guard = EnvGuard::new();
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "analysis.toml", "[filter]\nminhold = 0\n");

    let err = load_config(Some(&path), None, &ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "filter.minhold"));
}

#[test]
fn preset_source_is_reported() {
    let _lock = lock_env();
    let _guard = EnvGuard::new();
    let resolved = load_config(None, Some(PresetName::Smoothed), &ConfigOverrides::default()).unwrap();
    assert_eq!(resolved.source.to_string(), "preset smoothed");
    assert!(resolved.snapshot().content_hash.is_none());
}
