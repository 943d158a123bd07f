//! Fuzz target for analysis configuration parsing.
//!
//! Tests that JSON and TOML configuration parsing and validation handle
//! arbitrary input without panicking.

#![no_main]

use cap_config::{validate_config, AnalysisConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for parsed in [
        AnalysisConfig::from_json_str(text),
        AnalysisConfig::from_toml_str(text),
    ] {
        if let Ok(config) = parsed {
            let _ = validate_config(&config);
        }
    }
});
