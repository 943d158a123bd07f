//! State-to-state transition counts.

use crate::error::{Result, StateError};
use crate::MAX_NUMLABELS;
use serde::Serialize;

/// Square matrix of adjacent-pair counts, indexed by state index.
///
/// Entry `[a, b]` counts positions `i` with state `a` at `i - 1` and state
/// `b` at `i`. Self-transitions inside a run are counted too, so a sequence
/// of length `N` contributes exactly `N - 1` counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionMatrix {
    size: usize,
    counts: Vec<u64>,
}

impl TransitionMatrix {
    /// Zero matrix for `size` states, at most [`MAX_NUMLABELS`].
    pub fn zeros(size: usize) -> Result<Self> {
        if size > MAX_NUMLABELS {
            return Err(StateError::too_many_labels(size as u128));
        }
        Ok(TransitionMatrix {
            size,
            counts: vec![0; size * size],
        })
    }

    /// Number of states along each axis.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Count one transition from state index `from` to `to`.
    ///
    /// Panics if either index is out of bounds.
    pub fn record(&mut self, from: usize, to: usize) {
        assert!(from < self.size && to < self.size, "state index out of bounds");
        self.counts[from * self.size + to] += 1;
    }

    /// Transition count, or `None` for out-of-bounds indices.
    pub fn get(&self, from: usize, to: usize) -> Option<u64> {
        if from < self.size && to < self.size {
            Some(self.counts[from * self.size + to])
        } else {
            None
        }
    }

    /// Outgoing counts of state `from`.
    pub fn row(&self, from: usize) -> &[u64] {
        &self.counts[from * self.size..(from + 1) * self.size]
    }

    /// Rows in state-index order.
    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        // chunks_exact(0) panics; an empty matrix has no rows anyway.
        self.counts.chunks_exact(self.size.max(1))
    }

    /// Sum of all entries.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Transitions that leave a state (off-diagonal sum).
    pub fn state_changes(&self) -> u64 {
        self.total() - (0..self.size).map(|i| self.counts[i * self.size + i]).sum::<u64>()
    }

    /// Row-normalized transition probabilities.
    ///
    /// Rows without any outgoing transition stay all zero.
    pub fn probabilities(&self) -> Vec<Vec<f64>> {
        self.rows()
            .map(|row| {
                let sum: u64 = row.iter().sum();
                row.iter()
                    .map(|&c| if sum == 0 { 0.0 } else { c as f64 / sum as f64 })
                    .collect()
            })
            .collect()
    }

    /// Counts as nested rows, for serialization to tabular outputs.
    pub fn to_rows(&self) -> Vec<Vec<u64>> {
        self.rows().map(<[u64]>::to_vec).collect()
    }
}
