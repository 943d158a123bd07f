//! Occupancy, run-length statistics and transition counts per state.
//!
//! The statistics record follows the column layout of the state statistics
//! table written by the CAP pipeline:
//!
//! | column | meaning                                  |
//! |--------|------------------------------------------|
//! | 0      | percentage of timepoints in the state    |
//! | 1      | number of runs                           |
//! | 2      | total timepoints in the state            |
//! | 3..=5  | min / max / mean run length              |
//! | 6      | median run length                        |
//! | 7      | population standard deviation            |
//!
//! States with one or two runs are reported with `std = 0`, and for two runs
//! the median column holds the second run length instead of the midpoint.
//! Downstream tables depend on these values, so they are kept as-is.

use super::filter::{FilterThresholds, StateFilter};
use super::runs::{runs, RunLengths};
use super::transition::TransitionMatrix;
use crate::error::{Result, StateError};
use crate::{Label, MAX_NUMLABELS};
use serde::{Deserialize, Serialize};

/// Column names of [`StateStats::as_row`].
pub const STATS_COLUMNS: [&str; 8] = [
    "percentage",
    "runs",
    "total",
    "min",
    "max",
    "mean",
    "median",
    "std",
];

/// Closed label range `[minlabel, minlabel + numlabels - 1]`.
///
/// Holds between 1 and [`MAX_NUMLABELS`] labels and never extends past
/// `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelRange {
    minlabel: Label,
    numlabels: usize,
}

impl LabelRange {
    /// Create a range of `numlabels` labels starting at `minlabel`.
    pub fn new(minlabel: Label, numlabels: usize) -> Result<Self> {
        if numlabels == 0 {
            return Err(StateError::non_positive("numlabels", numlabels));
        }
        if numlabels > MAX_NUMLABELS {
            return Err(StateError::too_many_labels(numlabels as u128));
        }
        let last = i128::from(minlabel) + numlabels as i128 - 1;
        if last > i128::from(Label::MAX) {
            return Err(StateError::unrepresentable_range(minlabel, numlabels));
        }
        Ok(LabelRange {
            minlabel,
            numlabels,
        })
    }

    /// Range from `minlabel` up to and including `maxlabel`.
    pub fn spanning(minlabel: Label, maxlabel: Label) -> Result<Self> {
        if maxlabel < minlabel {
            return Err(StateError::InvalidInput(format!(
                "label range [{minlabel}, {maxlabel}] is empty"
            )));
        }
        let width = (i128::from(maxlabel) - i128::from(minlabel) + 1) as u128;
        match usize::try_from(width) {
            Ok(numlabels) if numlabels <= MAX_NUMLABELS => Self::new(minlabel, numlabels),
            _ => Err(StateError::too_many_labels(width)),
        }
    }

    /// Smallest range covering every label in `labels`.
    pub fn from_labels(labels: &[Label]) -> Result<Self> {
        let (Some(&min), Some(&max)) = (labels.iter().min(), labels.iter().max()) else {
            return Err(StateError::InvalidInput(
                "cannot infer a label range from an empty sequence".to_string(),
            ));
        };
        Self::spanning(min, max)
    }

    pub fn minlabel(&self) -> Label {
        self.minlabel
    }

    pub fn numlabels(&self) -> usize {
        self.numlabels
    }

    /// Largest label in the range.
    pub fn maxlabel(&self) -> Label {
        self.label_at(self.numlabels - 1)
    }

    pub fn contains(&self, label: Label) -> bool {
        label >= self.minlabel && label <= self.maxlabel()
    }

    /// Zero-based state index of `label`, if it lies in the range.
    pub fn index_of(&self, label: Label) -> Option<usize> {
        if self.contains(label) {
            usize::try_from(label.abs_diff(self.minlabel)).ok()
        } else {
            None
        }
    }

    /// Label of the state at `index`.
    ///
    /// Panics if `index` is not below `numlabels`.
    pub fn label_at(&self, index: usize) -> Label {
        assert!(index < self.numlabels, "state index out of bounds");
        // In range by construction: numlabels <= MAX_NUMLABELS and the last
        // label fits in `Label`.
        self.minlabel + index as Label
    }

    /// Labels in ascending order.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        (0..self.numlabels).map(move |i| self.label_at(i))
    }

    /// Fail on the first label outside the range.
    pub fn check(&self, labels: &[Label]) -> Result<()> {
        for (index, &label) in labels.iter().enumerate() {
            self.require_index(label, index)?;
        }
        Ok(())
    }

    fn require_index(&self, label: Label, index: usize) -> Result<usize> {
        self.index_of(label)
            .ok_or_else(|| StateError::LabelOutOfRange {
                label,
                index,
                min: self.minlabel,
                max: self.maxlabel(),
            })
    }
}

/// Descriptive statistics of one state's run lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StateStats {
    /// Share of all timepoints spent in the state, in percent.
    pub percentage: f64,
    /// Number of runs.
    pub runs: usize,
    /// Timepoints spent in the state.
    pub total: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

impl StateStats {
    /// Summarize `lengths` for a sequence of `n` timepoints.
    pub fn from_run_lengths(lengths: &[usize], n: usize) -> Self {
        let (Some(&min), Some(&max)) = (lengths.iter().min(), lengths.iter().max()) else {
            return StateStats::default();
        };
        let total: usize = lengths.iter().sum();
        let count = lengths.len();
        let mean = total as f64 / count as f64;
        let percentage = if n == 0 {
            0.0
        } else {
            100.0 * total as f64 / n as f64
        };

        let (median, std) = match lengths {
            [only] => (*only as f64, 0.0),
            [_, second] => (*second as f64, 0.0),
            _ => (median(lengths), population_std(lengths, mean)),
        };

        StateStats {
            percentage,
            runs: count,
            total,
            min,
            max,
            mean,
            median,
            std,
        }
    }

    /// Values in [`STATS_COLUMNS`] order.
    pub fn as_row(&self) -> [f64; 8] {
        [
            self.percentage,
            self.runs as f64,
            self.total as f64,
            self.min as f64,
            self.max as f64,
            self.mean,
            self.median,
            self.std,
        ]
    }
}

fn median(values: &[usize]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

fn population_std(values: &[usize], mean: f64) -> f64 {
    let var = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    var.sqrt()
}

/// Everything derived from one label sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAnalysis {
    pub range: LabelRange,
    pub thresholds: FilterThresholds,
    /// Labels after the filter pre-stage.
    pub filtered: Vec<Label>,
    pub transitions: TransitionMatrix,
    /// One record per state, ascending label order.
    pub stats: Vec<StateStats>,
    pub run_lengths: RunLengths,
}

impl StateAnalysis {
    /// Filter `labels` and summarize the result.
    pub fn compute(
        labels: &[Label],
        range: LabelRange,
        thresholds: FilterThresholds,
    ) -> Result<Self> {
        if labels.is_empty() {
            return Err(StateError::InvalidInput(
                "label sequence is empty".to_string(),
            ));
        }
        range.check(labels)?;

        let filtered = StateFilter::new(thresholds)?.apply(labels)?;

        let mut transitions = TransitionMatrix::zeros(range.numlabels)?;
        for (i, pair) in filtered.windows(2).enumerate() {
            let from = range.require_index(pair[0], i)?;
            let to = range.require_index(pair[1], i + 1)?;
            transitions.record(from, to);
        }

        let mut run_lengths = RunLengths::new(range.numlabels);
        for run in runs(&filtered) {
            run_lengths.push(range.require_index(run.state, run.start)?, run.len);
        }

        let stats: Vec<StateStats> = run_lengths
            .iter()
            .map(|lengths| StateStats::from_run_lengths(lengths, filtered.len()))
            .collect();

        tracing::debug!(
            timepoints = filtered.len(),
            numlabels = range.numlabels,
            minlabel = range.minlabel,
            state_changes = transitions.state_changes(),
            "computed state statistics"
        );

        Ok(StateAnalysis {
            range,
            thresholds,
            filtered,
            transitions,
            stats,
            run_lengths,
        })
    }

    /// Number of timepoints analysed.
    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Record for `label`, if it lies in the range.
    pub fn stats_for(&self, label: Label) -> Option<&StateStats> {
        self.range.index_of(label).and_then(|i| self.stats.get(i))
    }

    /// Split into (transition matrix, statistics table, run lengths).
    pub fn into_parts(self) -> (TransitionMatrix, Vec<StateStats>, RunLengths) {
        (self.transitions, self.stats, self.run_lengths)
    }
}

/// Filter `labels` with (`minout`, `minhold`) and compute the transition
/// matrix, per-state statistics and run-length lists for the label range
/// `[minlabel, minlabel + numlabels - 1]`.
pub fn compute_state_stats(
    labels: &[Label],
    numlabels: usize,
    minlabel: Label,
    minout: usize,
    minhold: usize,
) -> Result<StateAnalysis> {
    let range = LabelRange::new(minlabel, numlabels)?;
    let thresholds = FilterThresholds::new(minout, minhold)?;
    StateAnalysis::compute(labels, range, thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: [Label; 21] = [0, 0, 0, 1, 1, 1, 2, 2, 2, 1, 2, 0, 1, 1, 1, 1, 2, 2, 1, 1, 1];

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12
    }

    #[test]
    fn single_state_sequence() {
        let analysis = compute_state_stats(&[1, 1, 1, 1, 1], 1, 1, 1, 1).unwrap();
        assert_eq!(analysis.filtered, vec![1; 5]);
        assert_eq!(analysis.transitions.to_rows(), vec![vec![4]]);
        assert_eq!(analysis.stats.len(), 1);
        assert_eq!(
            analysis.stats[0].as_row(),
            [100.0, 1.0, 5.0, 5.0, 5.0, 5.0, 5.0, 0.0]
        );
    }

    #[test]
    fn out_of_range_label_is_rejected() {
        let err = compute_state_stats(&[0, 1, 7, 2], 3, 0, 1, 1).unwrap_err();
        assert_eq!(
            err,
            StateError::LabelOutOfRange {
                label: 7,
                index: 2,
                min: 0,
                max: 2,
            }
        );
    }

    #[test]
    fn label_below_range_is_rejected() {
        let err = compute_state_stats(&[1, 2, 0], 2, 1, 1, 1).unwrap_err();
        assert!(matches!(err, StateError::LabelOutOfRange { label: 0, .. }));
    }

    #[test]
    fn zero_numlabels_is_invalid_configuration() {
        let err = compute_state_stats(&[0, 0], 0, 0, 1, 1).unwrap_err();
        assert!(matches!(
            err,
            StateError::InvalidConfiguration {
                field: "numlabels",
                ..
            }
        ));
    }

    #[test]
    fn empty_sequence_is_invalid_input() {
        let err = compute_state_stats(&[], 2, 0, 1, 1).unwrap_err();
        assert!(matches!(err, StateError::InvalidInput(_)));
    }

    #[test]
    fn unfiltered_demo_statistics() {
        let analysis = compute_state_stats(&DEMO, 3, 0, 1, 1).unwrap();
        assert_eq!(analysis.filtered, DEMO.to_vec());
        assert_eq!(
            analysis.transitions.to_rows(),
            vec![vec![2, 2, 0], vec![0, 7, 3], vec![1, 2, 3]]
        );
        assert_eq!(
            analysis.run_lengths.clone().into_inner(),
            vec![vec![3, 1], vec![3, 1, 4, 3], vec![3, 1, 2]]
        );

        // Two runs: median is the second run, std is zero.
        let s0 = analysis.stats[0];
        assert_eq!((s0.runs, s0.total, s0.min, s0.max), (2, 4, 1, 3));
        assert!(approx_eq(s0.mean, 2.0));
        assert!(approx_eq(s0.median, 1.0));
        assert!(approx_eq(s0.std, 0.0));

        let s1 = analysis.stats[1];
        assert!(approx_eq(s1.percentage, 100.0 * 11.0 / 21.0));
        assert_eq!((s1.runs, s1.total, s1.min, s1.max), (4, 11, 1, 4));
        assert!(approx_eq(s1.mean, 2.75));
        assert!(approx_eq(s1.median, 3.0));
        assert!(approx_eq(s1.std, 1.089_724_735_885_168_5));

        let s2 = analysis.stats[2];
        assert!(approx_eq(s2.median, 2.0));
        assert!(approx_eq(s2.std, (2.0f64 / 3.0).sqrt()));
    }

    #[test]
    fn filtered_demo_statistics() {
        let analysis = compute_state_stats(&DEMO, 3, 0, 2, 2).unwrap();
        assert_eq!(
            analysis.transitions.to_rows(),
            vec![vec![2, 1, 0], vec![0, 6, 2], vec![0, 2, 7]]
        );
        assert_eq!(
            analysis.run_lengths.clone().into_inner(),
            vec![vec![3], vec![3, 3, 3], vec![7, 2]]
        );
        let s2 = analysis.stats[2];
        assert_eq!((s2.runs, s2.total, s2.min, s2.max), (2, 9, 2, 7));
        assert!(approx_eq(s2.mean, 4.5));
        assert!(approx_eq(s2.median, 2.0));
    }

    #[test]
    fn unvisited_state_has_zero_record() {
        let labels = [4, 4, 5, 5, 5, 4, 6, 6, 4, 4, 4, 4];
        let analysis = compute_state_stats(&labels, 4, 3, 1, 1).unwrap();
        assert_eq!(analysis.stats[0], StateStats::default());
        assert_eq!(analysis.stats_for(3), Some(&StateStats::default()));

        let s4 = analysis.stats_for(4).unwrap();
        assert_eq!((s4.runs, s4.total), (3, 7));
        assert!(approx_eq(s4.median, 2.0));
        assert!(approx_eq(s4.std, 1.247_219_128_924_647));
        assert_eq!(
            analysis.transitions.to_rows(),
            vec![
                vec![0, 0, 0, 0],
                vec![0, 4, 1, 1],
                vec![0, 1, 2, 0],
                vec![0, 1, 0, 1],
            ]
        );
    }

    #[test]
    fn even_run_count_uses_true_median() {
        let labels = [0, 1, 1, 0, 0, 0, 1, 0, 0, 0, 0, 1, 1, 1, 0];
        let analysis = compute_state_stats(&labels, 2, 0, 1, 1).unwrap();
        assert_eq!(analysis.run_lengths.get(0), Some(&[1, 3, 4, 1][..]));
        assert!(approx_eq(analysis.stats[0].median, 2.0));
        assert!(approx_eq(analysis.stats[0].std, 1.299_038_105_676_658));
    }

    #[test]
    fn totals_cover_every_timepoint() {
        let analysis = compute_state_stats(&DEMO, 3, 0, 2, 2).unwrap();
        let total: usize = analysis.stats.iter().map(|s| s.total).sum();
        assert_eq!(total, DEMO.len());
        assert_eq!(analysis.transitions.total(), DEMO.len() as u64 - 1);
        let pct: f64 = analysis.stats.iter().map(|s| s.percentage).sum();
        assert!((pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn into_parts_preserves_order() {
        let (transitions, stats, lengths) =
            compute_state_stats(&[2, 2, 3], 2, 2, 1, 1).unwrap().into_parts();
        assert_eq!(transitions.to_rows(), vec![vec![1, 1], vec![0, 0]]);
        assert_eq!(stats[0].total, 2);
        assert_eq!(stats[1].total, 1);
        assert_eq!(lengths.get(1), Some(&[1][..]));
    }

    #[test]
    fn label_range_inference() {
        let range = LabelRange::from_labels(&[3, 7, 5]).unwrap();
        assert_eq!(range.minlabel(), 3);
        assert_eq!(range.numlabels(), 5);
        assert_eq!(range.maxlabel(), 7);
        assert_eq!(range.labels().collect::<Vec<_>>(), vec![3, 4, 5, 6, 7]);
        assert!(LabelRange::from_labels(&[]).is_err());
    }

    #[test]
    fn huge_numlabels_is_invalid_configuration() {
        for numlabels in [MAX_NUMLABELS + 1, 1 << 33, usize::MAX] {
            let err = compute_state_stats(&[0, 0, 1], numlabels, 0, 1, 1).unwrap_err();
            assert!(
                matches!(err, StateError::InvalidConfiguration { field: "numlabels", .. }),
                "{err}"
            );
        }
        assert!(compute_state_stats(&[0, 0, 1], MAX_NUMLABELS, 0, 1, 1).is_ok());
    }

    #[test]
    fn stray_large_label_cannot_inflate_range() {
        let err = LabelRange::from_labels(&[0, 0, 1, 1, 3_000_000_000]).unwrap_err();
        assert!(matches!(err, StateError::InvalidConfiguration { .. }));
        let err = LabelRange::from_labels(&[0, 1, 300_000]).unwrap_err();
        assert!(err.to_string().contains("got 300001"), "{err}");
    }

    #[test]
    fn extreme_labels_are_refused_not_clamped() {
        let err = LabelRange::from_labels(&[i64::MIN, i64::MAX]).unwrap_err();
        assert!(
            err.to_string().contains("got 18446744073709551616"),
            "{err}"
        );
        assert!(matches!(
            LabelRange::new(i64::MAX, 2),
            Err(StateError::InvalidConfiguration { field: "numlabels", .. })
        ));
    }

    #[test]
    fn range_at_the_top_of_the_label_type() {
        let range = LabelRange::from_labels(&[i64::MAX - 2, i64::MAX]).unwrap();
        assert_eq!(range.numlabels(), 3);
        assert_eq!(range.maxlabel(), i64::MAX);
        assert!(range.contains(i64::MAX));
        assert_eq!(range.index_of(i64::MAX), Some(2));

        let analysis =
            StateAnalysis::compute(&[i64::MAX, i64::MAX - 2], range, FilterThresholds::default())
                .unwrap();
        assert_eq!(analysis.transitions.get(2, 0), Some(1));

        let low = LabelRange::from_labels(&[i64::MIN, i64::MIN + 1]).unwrap();
        assert_eq!(low.maxlabel(), i64::MIN + 1);
    }

    #[test]
    fn spanning_rejects_inverted_bounds() {
        assert_eq!(LabelRange::spanning(2, 4).unwrap(), LabelRange::new(2, 3).unwrap());
        assert!(matches!(
            LabelRange::spanning(4, 2),
            Err(StateError::InvalidInput(_))
        ));
    }

    #[test]
    fn label_range_indexing() {
        let range = LabelRange::new(-1, 3).unwrap();
        assert_eq!(range.index_of(-1), Some(0));
        assert_eq!(range.index_of(1), Some(2));
        assert_eq!(range.index_of(2), None);
        assert_eq!(range.label_at(1), 0);
    }

    #[test]
    fn stats_record_from_three_runs() {
        let s = StateStats::from_run_lengths(&[2, 8, 5], 30);
        assert!(approx_eq(s.percentage, 50.0));
        assert_eq!((s.runs, s.total, s.min, s.max), (3, 15, 2, 8));
        assert!(approx_eq(s.mean, 5.0));
        assert!(approx_eq(s.median, 5.0));
        assert!(approx_eq(s.std, 6.0f64.sqrt()));
    }
}
