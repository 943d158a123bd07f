//! CLI error handling tests for capcalc.
//!
//! These tests verify that invalid arguments, configuration and label data
//! produce structured error messages and stable exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn capcalc(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("capcalc").expect("capcalc binary should exist");
    cmd.env("XDG_CONFIG_HOME", home)
        .env("HOME", home)
        .env_remove("CAPCALC_CONFIG")
        .env_remove("CAPCALC_CONFIG_DIR")
        .env_remove("CAPCALC_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

// ============================================================================
// Argument Errors
// ============================================================================

mod arguments {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        let dir = TempDir::new().unwrap();
        capcalc(dir.path())
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn stats_requires_a_file() {
        let dir = TempDir::new().unwrap();
        capcalc(dir.path())
            .arg("stats")
            .assert()
            .failure()
            .stderr(predicate::str::contains("required"));
    }

    #[test]
    fn unknown_preset_fails() {
        let dir = TempDir::new().unwrap();
        capcalc(dir.path())
            .args(["--preset", "turbo", "config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown preset"));
    }

    #[test]
    fn zero_threshold_is_args_error() {
        let dir = TempDir::new().unwrap();
        let labels = write(&dir, "x.txt", "0 1 0\n");
        capcalc(dir.path())
            .args(["-q", "filter", "--minhold", "0"])
            .arg(&labels)
            .assert()
            .code(10)
            .stderr(predicate::str::contains("filter.minhold"));
    }

    #[test]
    fn zero_numlabels_is_args_error() {
        let dir = TempDir::new().unwrap();
        let labels = write(&dir, "x.txt", "0 1 0\n");
        capcalc(dir.path())
            .args(["-q", "stats", "--numlabels", "0"])
            .arg(&labels)
            .assert()
            .code(10);
    }

    #[test]
    fn numlabels_above_limit_is_args_error() {
        let dir = TempDir::new().unwrap();
        let labels = write(&dir, "x.txt", "0 1 0\n");
        capcalc(dir.path())
            .args(["-q", "stats", "--numlabels", "8589934592"])
            .arg(&labels)
            .assert()
            .code(10)
            .stderr(predicate::str::contains("labels.numlabels"));
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

mod configuration {
    use super::*;

    #[test]
    fn missing_config_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        capcalc(dir.path())
            .args(["-q", "--config", "/nonexistent/capcalc/analysis.toml", "config", "show"])
            .assert()
            .code(21)
            .stderr(predicate::str::contains("\"status\":\"error\""));
    }

    #[test]
    fn malformed_config_is_args_error() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "analysis.toml", "[filter\nminhold = ");
        capcalc(dir.path())
            .args(["-q", "config", "validate"])
            .arg(&config)
            .assert()
            .code(10)
            .stderr(predicate::str::contains("config_error"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "analysis.yaml", "filter: {}\n");
        capcalc(dir.path())
            .args(["-q", "-f", "summary", "config", "validate"])
            .arg(&config)
            .assert()
            .code(10)
            .stderr(predicate::str::contains("error"));
    }
}

// ============================================================================
// Label Data Errors
// ============================================================================

mod labels {
    use super::*;

    #[test]
    fn missing_label_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        capcalc(dir.path())
            .args(["-q", "filter", "/nonexistent/capcalc/labels.txt"])
            .assert()
            .code(21)
            .stderr(predicate::str::contains("label_file_error"));
    }

    #[test]
    fn invalid_token_names_line() {
        let dir = TempDir::new().unwrap();
        let labels = write(&dir, "x.txt", "0 1\n1 x 2\n");
        capcalc(dir.path())
            .args(["-q", "-f", "text", "filter"])
            .arg(&labels)
            .assert()
            .code(12)
            .stderr(predicate::str::contains(":2: 'x' is not an integer label"));
    }

    #[test]
    fn empty_label_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let labels = write(&dir, "x.txt", "# header only\n");
        capcalc(dir.path())
            .args(["-q", "filter"])
            .arg(&labels)
            .assert()
            .code(12);
    }

    #[test]
    fn out_of_range_label_fails_single_subject() {
        let dir = TempDir::new().unwrap();
        let labels = write(&dir, "x.txt", "0 1 2 3\n");
        let output = capcalc(dir.path())
            .args(["-q", "stats", "--numlabels", "3"])
            .arg(&labels)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(12));

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["subjects"].as_array().unwrap().len(), 0);
        let message = json["failures"][0]["message"].as_str().unwrap();
        assert!(message.contains("label 3 at index 3"), "{message}");
    }

    #[test]
    fn stray_large_label_is_a_typed_failure() {
        let dir = TempDir::new().unwrap();
        let labels = write(&dir, "x.txt", "0 0 1 1 300000\n");
        let output = capcalc(dir.path())
            .args(["-q", "stats"])
            .arg(&labels)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(10));

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let message = json["failures"][0]["message"].as_str().unwrap();
        assert!(message.contains("must be at most 1024"), "{message}");
    }

    #[test]
    fn all_subjects_missing_is_io_error() {
        let dir = TempDir::new().unwrap();
        capcalc(dir.path())
            .args(["-q", "stats", "/nonexistent/a.txt", "/nonexistent/b.txt"])
            .assert()
            .code(21);
    }
}
