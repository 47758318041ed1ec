//! Clustering traits.

use super::assignment::ClusterAssignment;
use crate::error::Result;
use crate::matrix::FeatureMatrix;
use ndarray::Array2;

/// Trait for clustering algorithms.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns one label per input row.
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<ClusterAssignment>;

    /// Get the number of clusters.
    ///
    /// Algorithms that discover the count while fitting return 0.
    fn n_clusters(&self) -> usize;

    /// Short algorithm name used in errors and logs.
    fn name(&self) -> &'static str;
}

/// Trait for soft clustering algorithms that return probabilities.
pub trait SoftClustering: Clustering {
    /// Fit and return soft cluster assignments (probabilities).
    ///
    /// Returns an `n × k` matrix where entry \[i, k\] is the probability that
    /// row i belongs to cluster k.
    fn fit_predict_proba(&self, data: &FeatureMatrix) -> Result<Array2<f64>>;
}
