//! Fuzz target for label file parsing.
//!
//! Arbitrary text must parse or fail with a `LabelFileError`, and parsed
//! labels must survive a write/parse cycle.

#![no_main]

use cap_core::labels::{format_labels, parse_labels};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(labels) = parse_labels(text, "fuzz") {
        let again = parse_labels(&format_labels(&labels), "fuzz");
        assert_eq!(again.ok(), Some(labels));
    }
});
