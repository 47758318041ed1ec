//! Clustering diagnostics.
//!
//! # Metrics Overview
//!
//! | Metric | Range | Best | Needs |
//! |--------|-------|------|-------|
//! | [`inertia`] | [0, ∞) | 0 | centroids |
//! | [`silhouette_score`] | [-1, 1] | 1 | data only |
//!
//! # When to Use Which
//!
//! - **Inertia**: comparing K-means runs with the same k
//! - **Silhouette**: comparing different k, or different algorithms, without ground truth
//!
//! # Example
//!
//! ```rust
//! use cohort::cluster::ClusterAssignment;
//! use cohort::metrics::silhouette_score;
//! use cohort::FeatureMatrix;
//!
//! let data = FeatureMatrix::from_rows(&[vec![0.0], vec![0.1], vec![5.0], vec![5.1]]).unwrap();
//! let labels = ClusterAssignment::new(vec![0, 0, 1, 1]);
//!
//! assert!(silhouette_score(&data, &labels).unwrap() > 0.9);
//! ```
//!
//! # References
//!
//! - Rousseeuw (1987). "Silhouettes: a graphical aid to the interpretation and
//!   validation of cluster analysis"

use std::collections::HashMap;

use ndarray::ArrayView2;

use crate::cluster::{ClusterAssignment, NOISE};
use crate::distance::{euclidean, squared_euclidean};
use crate::matrix::FeatureMatrix;

/// Within-cluster sum of squared distances to the assigned centroid.
///
/// Row `i` with label `l` contributes `||x_i - centroids[l]||²`. Noise rows
/// and labels without a centroid row contribute nothing.
pub fn inertia(
    data: &FeatureMatrix,
    assignment: &ClusterAssignment,
    centroids: ArrayView2<'_, f64>,
) -> f64 {
    assignment
        .labels()
        .iter()
        .enumerate()
        .filter(|&(_, &l)| l != NOISE && (l as usize) < centroids.nrows())
        .map(|(i, &l)| squared_euclidean(data.row(i), centroids.row(l as usize)))
        .sum()
}

/// Mean silhouette coefficient over non-noise rows.
///
/// For row `i` in cluster `A`:
///
/// ```text
/// a(i) = mean distance to the other members of A
/// b(i) = min over clusters B ≠ A of mean distance to members of B
/// s(i) = (b(i) - a(i)) / max(a(i), b(i))
/// ```
///
/// Rows in singleton clusters score 0. Returns `None` when fewer than two
/// clusters remain after dropping noise, or when every cluster is a
/// singleton.
///
/// O(n²) distance evaluations.
pub fn silhouette_score(data: &FeatureMatrix, assignment: &ClusterAssignment) -> Option<f64> {
    let sizes = assignment.sizes();
    if sizes.len() < 2 || sizes.values().all(|&s| s < 2) {
        return None;
    }
    // Dense slot per label for the per-cluster distance sums.
    let slot: HashMap<isize, usize> = sizes.keys().enumerate().map(|(s, &l)| (l, s)).collect();
    let counts: Vec<usize> = sizes.values().copied().collect();

    let rows: Vec<usize> = (0..assignment.len())
        .filter(|&i| !assignment.is_noise(i))
        .collect();

    let mut total = 0.0;
    let mut sums = vec![0.0; counts.len()];
    for &i in &rows {
        sums.iter_mut().for_each(|s| *s = 0.0);
        for &j in &rows {
            if i != j {
                sums[slot[&assignment.label(j)]] += euclidean(data.row(i), data.row(j));
            }
        }

        let own = slot[&assignment.label(i)];
        if counts[own] < 2 {
            continue;
        }
        let a = sums[own] / (counts[own] - 1) as f64;
        let b = (0..counts.len())
            .filter(|&s| s != own)
            .map(|s| sums[s] / counts[s] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Some(total / rows.len() as f64)
}
