//! capcalc state-sequence analysis.
//!
//! Filters per-timepoint cluster labels and summarizes the temporal
//! dynamics of the resulting brain states.

pub mod error;
pub mod state;

pub use error::{Result, StateError};
pub use state::filter::{
    filter_states, FilterStep, FilterThresholds, FilterTrace, RunTracker, StateFilter, StepCounts,
};
pub use state::runs::{runs, Run, RunLengths};
pub use state::stats::{
    compute_state_stats, LabelRange, StateAnalysis, StateStats, STATS_COLUMNS,
};
pub use state::transition::TransitionMatrix;

/// A state/cluster identifier assigned to one timepoint.
pub type Label = i64;

/// Largest supported label range.
///
/// The transition matrix holds `numlabels²` counters, so a range declared
/// with a huge `numlabels` or inferred from a stray large label is refused
/// up front instead of attempting the allocation.
pub const MAX_NUMLABELS: usize = 1024;
