//! Flat cluster labels.

use std::collections::BTreeMap;

/// Label given to DBSCAN noise points.
pub const NOISE: isize = -1;

/// One cluster label per matrix row.
///
/// Labels are `0..n_clusters`, plus [`NOISE`] for density-based results.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ClusterAssignment {
    labels: Vec<isize>,
}

impl ClusterAssignment {
    /// Wrap raw labels.
    pub fn new(labels: Vec<isize>) -> Self {
        Self { labels }
    }

    pub(crate) fn from_indices(labels: Vec<usize>) -> Self {
        Self {
            labels: labels.into_iter().map(|l| l as isize).collect(),
        }
    }

    /// Raw labels.
    pub fn labels(&self) -> &[isize] {
        &self.labels
    }

    /// Label of row `i`.
    pub fn label(&self, i: usize) -> isize {
        self.labels[i]
    }

    /// Number of labelled rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether row `i` is noise.
    pub fn is_noise(&self, i: usize) -> bool {
        self.labels[i] == NOISE
    }

    /// Number of distinct non-noise labels.
    pub fn n_clusters(&self) -> usize {
        self.sizes().len()
    }

    /// Number of noise rows.
    pub fn n_noise(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    /// Rows per non-noise label, ordered by label.
    pub fn sizes(&self) -> BTreeMap<isize, usize> {
        let mut sizes = BTreeMap::new();
        for &l in self.labels.iter().filter(|&&l| l != NOISE) {
            *sizes.entry(l).or_insert(0) += 1;
        }
        sizes
    }

    /// Row indices carrying `label`.
    pub fn members(&self, label: isize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// Consume into raw labels.
    pub fn into_labels(self) -> Vec<isize> {
        self.labels
    }
}
