//! Fuzz target for the state statistics engine.
//!
//! Arbitrary sequences and ranges must either be rejected with an error or
//! produce counts consistent with the sequence length.

#![no_main]

use arbitrary::Arbitrary;
use cap_math::compute_state_stats;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    labels: Vec<i8>,
    numlabels: u8,
    minlabel: i8,
    minout: u8,
    minhold: u8,
}

fuzz_target!(|input: Input| {
    let labels: Vec<i64> = input.labels.iter().map(|&l| i64::from(l)).collect();
    let Ok(analysis) = compute_state_stats(
        &labels,
        usize::from(input.numlabels),
        i64::from(input.minlabel),
        usize::from(input.minout),
        usize::from(input.minhold),
    ) else {
        return;
    };

    assert_eq!(analysis.transitions.total() as usize, labels.len() - 1);
    assert_eq!(analysis.run_lengths.total(), labels.len());
    let occupied: usize = analysis.stats.iter().map(|s| s.total).sum();
    assert_eq!(occupied, labels.len());
});
