//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS). The foundational clustering algorithm, dating to 1957 (Lloyd).
//!
//! # The Objective
//!
//! K-means minimizes:
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! Sum of squared distances from each point to its cluster centroid.
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids from k distinct rows drawn uniformly at random
//! 2. **Assign**: Each point → nearest centroid (ties → lowest index)
//! 3. Stop if no assignment changed
//! 4. **Update**: Each centroid → mean of assigned points; an empty cluster
//!    keeps its previous centroid
//! 5. Repeat from 2, at most `max_iter` assignment passes
//!
//! **Why it converges**: WCSS decreases monotonically. Each step either
//! decreases WCSS or leaves it unchanged. Bounded below by 0 → must converge.
//!
//! # Reproducibility
//!
//! Runs are deterministic for a fixed seed. Without a seed a fresh one is
//! drawn per fit, so assignments (and label numbering) may differ between
//! runs on the same data. That is expected, not a bug; the seed actually used
//! is reported in [`KmeansFit::seed`] so any run can be replayed.
//!
//! # Failure Modes
//!
//! - **Local optima**: NP-hard problem; Lloyd finds local minimum only
//! - **Wrong k**: Must specify k in advance
//! - **Non-spherical clusters**: Assumes roughly spherical, equal-sized clusters

use super::assignment::ClusterAssignment;
use super::traits::Clustering;
use super::validate_k;
use crate::distance::squared_euclidean;
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;
use crate::metrics::inertia;
use ndarray::{Array2, ArrayView2};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const NAME: &str = "kmeans";

/// K-means clustering algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum assignment passes.
    max_iter: usize,
    /// Random seed.
    seed: Option<u64>,
}

/// Result of a K-means fit.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KmeansFit {
    /// Label per row, in `[0, k)`.
    pub assignment: ClusterAssignment,
    /// Final centroids, `k × d`.
    pub centroids: Array2<f64>,
    /// Assignment passes performed.
    pub iterations: usize,
    /// Whether the last pass changed no assignment.
    pub converged: bool,
    /// Within-cluster sum of squares.
    pub inertia: f64,
    /// Seed used for initialization.
    pub seed: u64,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            seed: None,
        }
    }

    /// Set the number of clusters.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Configured k.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Fit and return labels, centroids and diagnostics.
    pub fn fit(&self, data: &FeatureMatrix) -> Result<KmeansFit> {
        let n = data.n_rows();
        validate_k(NAME, self.k, n)?;
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                algorithm: NAME,
                name: "max_iter",
                message: "must be at least 1",
            });
        }

        let seed = resolve_seed(self.seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let x = data.view();

        let mut centroids = init_centroids(x, self.k, &mut rng);
        // usize::MAX marks "not yet assigned" so the first pass always changes.
        let mut labels = vec![usize::MAX; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            iterations += 1;

            let changed = assign(x, centroids.view(), &mut labels);
            tracing::debug!(iteration = iterations, changed, "kmeans assignment pass");
            if changed == 0 {
                converged = true;
                break;
            }

            update_centroids(x, &labels, &mut centroids);
        }

        if !converged {
            tracing::warn!(
                k = self.k,
                max_iter = self.max_iter,
                "kmeans stopped at iteration cap"
            );
        }

        let assignment = ClusterAssignment::from_indices(labels);
        let inertia = inertia(data, &assignment, centroids.view());
        tracing::debug!(k = self.k, iterations, converged, inertia, "kmeans finished");

        Ok(KmeansFit {
            assignment,
            centroids,
            iterations,
            converged,
            inertia,
            seed,
        })
    }
}

impl Default for Kmeans {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Seed to use for a fit: the configured one, else a fresh random one.
pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::rng().random())
}

/// Copy `k` distinct rows, chosen uniformly at random, as starting centers.
pub(crate) fn init_centroids(data: ArrayView2<'_, f64>, k: usize, rng: &mut impl Rng) -> Array2<f64> {
    let indices = rand::seq::index::sample(rng, data.nrows(), k);
    let mut centroids = Array2::zeros((k, data.ncols()));
    for (c, idx) in indices.iter().enumerate() {
        centroids.row_mut(c).assign(&data.row(idx));
    }
    centroids
}

/// Index of the nearest centroid; ties go to the lowest index.
fn nearest(point: ndarray::ArrayView1<'_, f64>, centroids: ArrayView2<'_, f64>) -> usize {
    let mut best_cluster = 0;
    let mut best_dist = f64::INFINITY;
    for (k, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_euclidean(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best_cluster = k;
        }
    }
    best_cluster
}

/// Reassign every row; returns how many labels changed.
fn assign(data: ArrayView2<'_, f64>, centroids: ArrayView2<'_, f64>, labels: &mut [usize]) -> usize {
    #[cfg(feature = "parallel")]
    {
        labels
            .par_iter_mut()
            .enumerate()
            .map(|(i, label)| {
                let best = nearest(data.row(i), centroids);
                let changed = *label != best;
                *label = best;
                usize::from(changed)
            })
            .sum()
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut changed = 0;
        for (i, label) in labels.iter_mut().enumerate() {
            let best = nearest(data.row(i), centroids);
            if *label != best {
                *label = best;
                changed += 1;
            }
        }
        changed
    }
}

/// Move each centroid to the mean of its rows. Empty clusters stay put.
fn update_centroids(data: ArrayView2<'_, f64>, labels: &[usize], centroids: &mut Array2<f64>) {
    let (k, d) = centroids.dim();
    let mut sums = Array2::<f64>::zeros((k, d));
    let mut counts = vec![0usize; k];

    for (i, &label) in labels.iter().enumerate() {
        let mut row = sums.row_mut(label);
        row += &data.row(i);
        counts[label] += 1;
    }

    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = &sums.row(c) / count as f64;
            centroids.row_mut(c).assign(&mean);
        }
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<ClusterAssignment> {
        self.fit(data).map(|fit| fit.assignment)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn blobs() -> FeatureMatrix {
        FeatureMatrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ])
        .unwrap()
    }

    #[test]
    fn test_kmeans_basic() {
        let fit = Kmeans::new(2).with_seed(42).fit(&blobs()).unwrap();
        let labels = fit.assignment.labels();

        // Points 0,1 should be in same cluster, points 2,3 in another
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
        assert!(fit.converged);

        let c = labels[0] as usize;
        assert!((fit.centroids[[c, 0]] - 0.05).abs() < 1e-12);
        assert!((fit.inertia - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_kmeans_all_points_assigned() {
        let rows: Vec<Vec<f64>> = (0..50)
            .map(|i| vec![i as f64 * 0.1, (i % 5) as f64])
            .collect();
        let data = FeatureMatrix::from_rows(&rows).unwrap();

        let labels = Kmeans::new(5).with_seed(123).fit_predict(&data).unwrap();

        assert_eq!(labels.len(), rows.len());
        for &label in labels.labels() {
            assert!((0..5).contains(&label), "label {} out of range", label);
        }
    }

    #[test]
    fn test_kmeans_k_equals_n() {
        let data = FeatureMatrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();

        let labels = Kmeans::new(3).with_seed(42).fit_predict(&data).unwrap();

        let unique: HashSet<_> = labels.labels().iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_kmeans_k_one_single_cluster() {
        let fit = Kmeans::new(1).with_seed(7).fit(&blobs()).unwrap();
        assert!(fit.assignment.labels().iter().all(|&l| l == 0));
        assert!((fit.centroids[[0, 0]] - 5.05).abs() < 1e-12);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let a = Kmeans::new(2).with_seed(42).fit(&blobs()).unwrap();
        let b = Kmeans::new(2).with_seed(42).fit(&blobs()).unwrap();

        assert_eq!(a.assignment, b.assignment, "same seed should give same result");
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.seed, 42);
    }

    #[test]
    fn test_kmeans_reports_generated_seed() {
        let first = Kmeans::new(2).fit(&blobs()).unwrap();
        let replay = Kmeans::new(2).with_seed(first.seed).fit(&blobs()).unwrap();
        assert_eq!(first.assignment, replay.assignment);
    }

    #[test]
    fn test_kmeans_duplicates_keep_empty_centroid() {
        // Three identical rows, k = 2: the second centroid never wins a row.
        let data = FeatureMatrix::from_rows(&[vec![1.0], vec![1.0], vec![1.0]]).unwrap();
        let fit = Kmeans::new(2).with_seed(1).fit(&data).unwrap();

        assert!(fit.assignment.labels().iter().all(|&l| l == 0));
        assert_eq!(fit.centroids[[1, 0]], 1.0);
        assert!(fit.converged);
    }

    #[test]
    fn test_kmeans_iteration_cap() {
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![(i * i % 17) as f64, i as f64]).collect();
        let data = FeatureMatrix::from_rows(&rows).unwrap();

        let fit = Kmeans::new(4).with_seed(3).with_max_iter(1).fit(&data).unwrap();
        assert_eq!(fit.iterations, 1);
        assert!(!fit.converged);
    }

    #[test]
    fn test_kmeans_invalid_k() {
        let data = FeatureMatrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();

        assert_eq!(
            Kmeans::new(5).fit(&data).unwrap_err(),
            Error::InvalidClusterCount {
                algorithm: "kmeans",
                requested: 5,
                n_items: 2
            }
        );
        assert!(Kmeans::new(0).fit(&data).is_err());
        assert!(Kmeans::new(1).with_max_iter(0).fit(&data).is_err());
    }

    proptest! {
        #[test]
        fn prop_labels_in_range_and_reproducible(
            rows in proptest::collection::vec(proptest::collection::vec(-50.0f64..50.0, 2), 1..40),
            k in 1usize..6,
            seed in any::<u64>(),
        ) {
            let data = FeatureMatrix::from_rows(&rows).unwrap();
            let k = k.min(rows.len());

            let a = Kmeans::new(k).with_seed(seed).fit(&data).unwrap();
            let b = Kmeans::new(k).with_seed(seed).fit(&data).unwrap();

            prop_assert_eq!(&a.assignment, &b.assignment);
            prop_assert!(a.assignment.labels().iter().all(|&l| l >= 0 && (l as usize) < k));
            prop_assert!(a.assignment.sizes().values().all(|&s| s <= rows.len()));
        }
    }
}
