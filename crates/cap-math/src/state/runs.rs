//! Maximal runs of identical labels and per-state run-length lists.

use crate::Label;
use serde::Serialize;

/// A maximal contiguous stretch of one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Run {
    pub state: Label,
    pub start: usize,
    pub len: usize,
}

impl Run {
    /// One past the last index of the run.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Iterator over the runs of a label slice, in order of occurrence.
#[derive(Debug, Clone)]
pub struct Runs<'a> {
    labels: &'a [Label],
    pos: usize,
}

impl Iterator for Runs<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let state = *self.labels.get(self.pos)?;
        let start = self.pos;
        let len = self.labels[start..]
            .iter()
            .take_while(|&&label| label == state)
            .count();
        self.pos += len;
        Some(Run { state, start, len })
    }
}

/// Split `labels` into maximal runs.
pub fn runs(labels: &[Label]) -> Runs<'_> {
    Runs { labels, pos: 0 }
}

/// Run lengths grouped by state index, each list in order of occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunLengths {
    per_state: Vec<Vec<usize>>,
}

impl RunLengths {
    /// Empty lists for `numstates` states.
    pub fn new(numstates: usize) -> Self {
        RunLengths {
            per_state: vec![Vec::new(); numstates],
        }
    }

    /// Append a run length to the list of state `index`.
    ///
    /// Panics if `index` is not below the number of states.
    pub fn push(&mut self, index: usize, len: usize) {
        self.per_state[index].push(len);
    }

    /// Run lengths for state `index`, or `None` past the last state.
    pub fn get(&self, index: usize) -> Option<&[usize]> {
        self.per_state.get(index).map(Vec::as_slice)
    }

    pub fn num_states(&self) -> usize {
        self.per_state.len()
    }

    /// Lists in state-index order.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.per_state.iter().map(Vec::as_slice)
    }

    /// Sum of all run lengths across states.
    pub fn total(&self) -> usize {
        self.per_state.iter().flatten().sum()
    }

    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.per_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_of_empty_slice() {
        assert_eq!(runs(&[]).count(), 0);
    }

    #[test]
    fn runs_split_on_changes() {
        let found: Vec<Run> = runs(&[3, 3, 1, 1, 1, 3]).collect();
        assert_eq!(
            found,
            vec![
                Run { state: 3, start: 0, len: 2 },
                Run { state: 1, start: 2, len: 3 },
                Run { state: 3, start: 5, len: 1 },
            ]
        );
        assert_eq!(found[1].end(), 5);
    }

    #[test]
    fn run_lengths_accumulate_per_state() {
        let mut lengths = RunLengths::new(2);
        lengths.push(0, 4);
        lengths.push(1, 2);
        lengths.push(0, 1);
        assert_eq!(lengths.get(0), Some(&[4, 1][..]));
        assert_eq!(lengths.get(1), Some(&[2][..]));
        assert_eq!(lengths.get(2), None);
        assert_eq!(lengths.total(), 7);
        assert_eq!(lengths.num_states(), 2);
    }
}
