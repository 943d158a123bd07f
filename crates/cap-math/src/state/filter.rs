//! Hysteresis filter for state label sequences.
//!
//! Short-lived state assignments are treated as clustering noise. A single
//! left-to-right scan tracks the run being accumulated and the run before
//! it, and decides at every label change whether the run that just ended
//! survives:
//!
//! - **Patch**: the run is shorter than `minlength` and the sequence returns
//!   to the previous state, so the run is rewritten as the previous state.
//! - **Fill**: the run is shorter than `minhold` and the sequence moves on to
//!   a third state, so the run is still rewritten as the previous state.
//! - **Switch**: otherwise the run is accepted and the new state begins.
//!
//! Patch and fill rewrite the window `[i - len, i]`, which includes the
//! position `i` where the change was detected. The decision is always made
//! on the raw input label, never on already-rewritten output.

use crate::error::{Result, StateError};
use crate::Label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Run-length thresholds for the state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterThresholds {
    /// Runs shorter than this are patched when the sequence returns to the
    /// previous state.
    pub minlength: usize,
    /// Runs shorter than this are filled when the sequence moves to a
    /// different state.
    pub minhold: usize,
}

impl FilterThresholds {
    /// Thresholds that never rewrite anything.
    pub const PASSTHROUGH: FilterThresholds = FilterThresholds {
        minlength: 1,
        minhold: 1,
    };

    /// Create validated thresholds. Both must be at least 1.
    pub fn new(minlength: usize, minhold: usize) -> Result<Self> {
        let thresholds = FilterThresholds { minlength, minhold };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Check that both thresholds are at least 1.
    pub fn validate(&self) -> Result<()> {
        if self.minlength == 0 {
            return Err(StateError::non_positive("minlength", self.minlength));
        }
        if self.minhold == 0 {
            return Err(StateError::non_positive("minhold", self.minhold));
        }
        Ok(())
    }

    /// True when no run can ever be rewritten.
    pub fn is_passthrough(&self) -> bool {
        self.minlength <= 1 && self.minhold <= 1
    }
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self::PASSTHROUGH
    }
}

/// Decision taken by the filter at one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum FilterStep {
    /// Index 0, copied unchanged.
    Start,
    /// Same label as the current run.
    Continue,
    /// Short run rewritten because the sequence returned to the previous
    /// state. `span` is the length of the rewritten run.
    Patch { span: usize },
    /// Short run rewritten as the previous state although the sequence moved
    /// on to another state.
    Fill { span: usize },
    /// The finished run was accepted and a new one starts here.
    Switch,
}

impl FilterStep {
    /// Step name as used in logs and trace output.
    pub fn name(&self) -> &'static str {
        match self {
            FilterStep::Start => "start",
            FilterStep::Continue => "continue",
            FilterStep::Patch { .. } => "patch",
            FilterStep::Fill { .. } => "fill",
            FilterStep::Switch => "switch",
        }
    }

    /// Length of the run rewritten by this step, if any.
    pub fn rewritten_span(&self) -> Option<usize> {
        match self {
            FilterStep::Patch { span } | FilterStep::Fill { span } => Some(*span),
            _ => None,
        }
    }
}

impl fmt::Display for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The scan state carried from one index to the next.
///
/// `last_len` is one longer than the run it describes once a switch has
/// happened; merges add it to the current length as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTracker {
    current_state: Label,
    current_len: usize,
    last_state: Label,
    last_len: usize,
}

impl RunTracker {
    /// Start tracking at the first label of a sequence.
    pub fn new(first: Label) -> Self {
        RunTracker {
            current_state: first,
            current_len: 1,
            last_state: first,
            last_len: 1,
        }
    }

    pub fn current_state(&self) -> Label {
        self.current_state
    }

    pub fn current_len(&self) -> usize {
        self.current_len
    }

    pub fn last_state(&self) -> Label {
        self.last_state
    }

    pub fn last_len(&self) -> usize {
        self.last_len
    }

    /// Consume the next raw label and return the decision for it.
    pub fn step(&mut self, label: Label, thresholds: &FilterThresholds) -> FilterStep {
        if label == self.current_state {
            self.current_len += 1;
            return FilterStep::Continue;
        }

        let span = self.current_len;
        if span < thresholds.minlength && label == self.last_state {
            self.absorb();
            return FilterStep::Patch { span };
        }
        if span < thresholds.minhold && label != self.last_state {
            self.absorb();
            return FilterStep::Fill { span };
        }

        self.last_len = self.current_len + 1;
        self.current_len = 1;
        self.last_state = self.current_state;
        self.current_state = label;
        FilterStep::Switch
    }

    /// Merge the short current run back into the previous one.
    fn absorb(&mut self) {
        self.current_state = self.last_state;
        self.current_len += self.last_len;
    }
}

/// Filtered labels together with the decision taken at every index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterTrace {
    pub filtered: Vec<Label>,
    pub steps: Vec<FilterStep>,
}

/// Number of decisions of each kind in a trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepCounts {
    pub continued: usize,
    pub patched: usize,
    pub filled: usize,
    pub switched: usize,
}

impl FilterTrace {
    /// Tally the decisions in this trace.
    pub fn counts(&self) -> StepCounts {
        let mut counts = StepCounts::default();
        for step in &self.steps {
            match step {
                FilterStep::Start => {}
                FilterStep::Continue => counts.continued += 1,
                FilterStep::Patch { .. } => counts.patched += 1,
                FilterStep::Fill { .. } => counts.filled += 1,
                FilterStep::Switch => counts.switched += 1,
            }
        }
        counts
    }

    /// Indices whose output label differs from the input.
    pub fn changed_indices(&self, labels: &[Label]) -> Vec<usize> {
        labels
            .iter()
            .zip(&self.filtered)
            .enumerate()
            .filter(|(_, (raw, out))| raw != out)
            .map(|(i, _)| i)
            .collect()
    }
}

/// State filter with fixed thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateFilter {
    thresholds: FilterThresholds,
}

impl StateFilter {
    /// Create a filter, validating the thresholds.
    pub fn new(thresholds: FilterThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(StateFilter { thresholds })
    }

    pub fn thresholds(&self) -> FilterThresholds {
        self.thresholds
    }

    /// Filter a label sequence. The output has the same length as the input.
    pub fn apply(&self, labels: &[Label]) -> Result<Vec<Label>> {
        self.scan(labels, |_, _| {})
    }

    /// Filter a label sequence and record the decision taken at each index.
    pub fn trace(&self, labels: &[Label]) -> Result<FilterTrace> {
        let mut steps = Vec::with_capacity(labels.len());
        let filtered = self.scan(labels, |_, step| steps.push(step))?;
        Ok(FilterTrace { filtered, steps })
    }

    fn scan<F>(&self, labels: &[Label], mut on_step: F) -> Result<Vec<Label>>
    where
        F: FnMut(usize, FilterStep),
    {
        let Some(&first) = labels.first() else {
            return Err(StateError::InvalidInput(
                "label sequence is empty".to_string(),
            ));
        };

        let mut filtered = vec![first; labels.len()];
        let mut tracker = RunTracker::new(first);
        on_step(0, FilterStep::Start);

        for (i, &label) in labels.iter().enumerate().skip(1) {
            let step = tracker.step(label, &self.thresholds);
            match step.rewritten_span() {
                Some(span) => {
                    let start = i.saturating_sub(span);
                    filtered[start..=i].fill(tracker.last_state());
                }
                None => filtered[i] = label,
            }
            tracing::trace!(
                index = i,
                label,
                step = step.name(),
                current_state = tracker.current_state(),
                current_len = tracker.current_len(),
                "state filter step"
            );
            on_step(i, step);
        }

        Ok(filtered)
    }
}

/// Filter `labels` with the given patch (`minlength`) and fill (`minhold`)
/// thresholds.
pub fn filter_states(labels: &[Label], minlength: usize, minhold: usize) -> Result<Vec<Label>> {
    StateFilter::new(FilterThresholds::new(minlength, minhold)?)?.apply(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(minlength: usize, minhold: usize) -> FilterThresholds {
        FilterThresholds::new(minlength, minhold).unwrap()
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = filter_states(&[], 1, 1).unwrap_err();
        assert!(matches!(err, StateError::InvalidInput(_)));
    }

    #[test]
    fn zero_thresholds_are_rejected() {
        assert!(matches!(
            filter_states(&[0, 1], 0, 1),
            Err(StateError::InvalidConfiguration {
                field: "minlength",
                ..
            })
        ));
        assert!(matches!(
            filter_states(&[0, 1], 1, 0),
            Err(StateError::InvalidConfiguration { field: "minhold", .. })
        ));
    }

    #[test]
    fn single_element_is_unchanged() {
        for (minlength, minhold) in [(1, 1), (2, 2), (5, 9)] {
            assert_eq!(filter_states(&[2], minlength, minhold).unwrap(), vec![2]);
        }
    }

    #[test]
    fn passthrough_keeps_every_label() {
        let labels = [0, 1, 0, 2, 2, 1, 0, 0, 3];
        assert_eq!(filter_states(&labels, 1, 1).unwrap(), labels.to_vec());
        assert!(FilterThresholds::default().is_passthrough());
    }

    #[test]
    fn lone_label_is_patched() {
        let labels = [0, 0, 0, 1, 0, 0, 0];
        assert_eq!(filter_states(&labels, 2, 2).unwrap(), vec![0; 7]);
    }

    #[test]
    fn patch_trace_records_decisions() {
        let labels = [0, 0, 0, 1, 0, 0, 0];
        let trace = StateFilter::new(thresholds(2, 2))
            .unwrap()
            .trace(&labels)
            .unwrap();
        assert_eq!(
            trace.steps,
            vec![
                FilterStep::Start,
                FilterStep::Continue,
                FilterStep::Continue,
                FilterStep::Switch,
                FilterStep::Patch { span: 1 },
                FilterStep::Continue,
                FilterStep::Continue,
            ]
        );
        assert_eq!(trace.changed_indices(&labels), vec![3]);
        let counts = trace.counts();
        assert_eq!(counts.patched, 1);
        assert_eq!(counts.switched, 1);
        assert_eq!(counts.continued, 4);
    }

    #[test]
    fn short_run_into_third_state_is_filled() {
        let labels = [0, 0, 0, 1, 2, 2, 2];
        let trace = StateFilter::new(thresholds(1, 2))
            .unwrap()
            .trace(&labels)
            .unwrap();
        // The fill window also covers index 4, the first label of the new state.
        assert_eq!(trace.filtered, vec![0, 0, 0, 0, 0, 2, 2]);
        assert_eq!(trace.steps[4], FilterStep::Fill { span: 1 });
        assert_eq!(trace.steps[5], FilterStep::Switch);
    }

    #[test]
    fn fill_at_sequence_start() {
        assert_eq!(filter_states(&[0, 1], 1, 2).unwrap(), vec![0, 0]);
    }

    #[test]
    fn consecutive_short_runs_merge_one_level() {
        assert_eq!(
            filter_states(&[0, 0, 0, 1, 2, 3, 3, 3], 1, 2).unwrap(),
            vec![0, 0, 0, 0, 0, 3, 3, 3]
        );
    }

    #[test]
    fn trailing_short_run_survives() {
        assert_eq!(
            filter_states(&[1, 2, 1, 2, 1, 2], 2, 1).unwrap(),
            vec![1, 1, 1, 1, 1, 2]
        );
    }

    #[test]
    fn alternating_noise_is_patched_into_neighbours() {
        assert_eq!(
            filter_states(&[5, 5, 6, 5, 6, 6, 6, 7, 6], 2, 1).unwrap(),
            vec![5, 5, 5, 5, 6, 6, 6, 6, 6]
        );
    }

    #[test]
    fn demo_sequence() {
        let labels = [0, 0, 0, 1, 1, 1, 2, 2, 2, 1, 2, 0, 1, 1, 1, 1, 2, 2, 1, 1, 1];
        assert_eq!(
            filter_states(&labels, 2, 2).unwrap(),
            vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 2, 2, 1, 1, 1]
        );
    }

    #[test]
    fn refiltering_with_large_minlength_can_change_output() {
        let once = filter_states(&[0, 1, 2, 1, 0], 4, 1).unwrap();
        assert_eq!(once, vec![0, 1, 1, 1, 0]);
        assert_eq!(filter_states(&once, 4, 1).unwrap(), vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn tracker_switch_records_previous_run() {
        let t = thresholds(1, 1);
        let mut tracker = RunTracker::new(4);
        assert_eq!(tracker.step(4, &t), FilterStep::Continue);
        assert_eq!(tracker.step(4, &t), FilterStep::Continue);
        assert_eq!(tracker.step(9, &t), FilterStep::Switch);
        assert_eq!(tracker.current_state(), 9);
        assert_eq!(tracker.current_len(), 1);
        assert_eq!(tracker.last_state(), 4);
        assert_eq!(tracker.last_len(), 4);
    }

    #[test]
    fn tracker_patch_merges_lengths() {
        let t = thresholds(2, 1);
        let mut tracker = RunTracker::new(0);
        tracker.step(1, &t);
        assert_eq!(tracker.step(0, &t), FilterStep::Patch { span: 1 });
        assert_eq!(tracker.current_state(), 0);
        assert_eq!(tracker.current_len(), 3);
    }

    #[test]
    fn step_names() {
        assert_eq!(FilterStep::Fill { span: 2 }.to_string(), "fill");
        assert_eq!(FilterStep::Patch { span: 1 }.rewritten_span(), Some(1));
        assert_eq!(FilterStep::Switch.rewritten_span(), None);
    }
}
