//! Fuzz target for the state filter.
//!
//! Checks that filtering arbitrary label sequences never panics, keeps the
//! length, keeps the first label and never introduces labels absent from
//! the input.

#![no_main]

use arbitrary::Arbitrary;
use cap_math::filter_states;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    labels: Vec<i8>,
    minlength: u8,
    minhold: u8,
}

fuzz_target!(|input: Input| {
    let labels: Vec<i64> = input.labels.iter().map(|&l| i64::from(l)).collect();
    let result = filter_states(&labels, usize::from(input.minlength), usize::from(input.minhold));

    let Ok(filtered) = result else {
        assert!(labels.is_empty() || input.minlength == 0 || input.minhold == 0);
        return;
    };
    assert_eq!(filtered.len(), labels.len());
    assert_eq!(filtered[0], labels[0]);
    assert!(filtered.iter().all(|l| labels.contains(l)));
});
