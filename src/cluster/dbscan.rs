//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! DBSCAN is a density-based clustering algorithm that groups points based on
//! neighborhood density. Unlike k-means, it:
//!
//! - Discovers clusters of arbitrary shape
//! - Automatically determines the number of clusters
//! - Identifies noise points (outliers)
//!
//! ## Core Concepts
//!
//! - **Epsilon (ε)**: Maximum distance between two points to be neighbors.
//! - **MinSamples**: Minimum neighborhood size (the point itself included)
//!   for a point to be "core".
//! - **Core point**: Has at least MinSamples points within ε.
//! - **Border point**: Within ε of a core point but not core itself.
//! - **Noise point**: Neither core nor border. Labelled [`NOISE`] (-1).
//!
//! ## Algorithm Steps
//!
//! 1. For each unvisited point P, in index order:
//!    - Find neighbors within ε
//!    - If |neighbors| < MinSamples, leave as noise (may become border later)
//!    - Else P is core: start a new cluster, expand breadth-first
//!
//! 2. Expansion: for each queued point:
//!    - Label it with the cluster if still unlabelled
//!    - If core, enqueue its neighborhood
//!
//! Clusters are numbered in discovery order; a border point reachable from
//! two clusters keeps the first label it received.
//!
//! ## Complexity
//!
//! - **Time**: O(n²) naive region queries. Each point is queried once.
//! - **Space**: O(n) for labels plus the largest neighborhood.

use super::assignment::{ClusterAssignment, NOISE};
use super::traits::Clustering;
use crate::distance::euclidean;
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;
use std::collections::VecDeque;

const NAME: &str = "dbscan";

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Dbscan {
    /// Epsilon: maximum distance for neighborhood.
    eps: f64,
    /// Minimum neighborhood size (including the point) for a core point.
    min_samples: usize,
}

/// Result of a DBSCAN fit.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DbscanFit {
    /// Label per row; [`NOISE`] for outliers.
    pub assignment: ClusterAssignment,
    /// Indices of core points, ascending.
    pub core_samples: Vec<usize>,
    /// Clusters discovered.
    pub n_clusters: usize,
}

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `eps` - Maximum distance between two points to be neighbors.
    /// * `min_samples` - Minimum points (including itself) within `eps` of a core point.
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Set epsilon (neighborhood radius).
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set minimum samples for core classification.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(Error::InvalidParameter {
                algorithm: NAME,
                name: "eps",
                message: "must be positive and finite",
            });
        }
        if self.min_samples == 0 {
            return Err(Error::InvalidParameter {
                algorithm: NAME,
                name: "min_samples",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Find all points within eps, the query point included.
    fn region_query(&self, data: &FeatureMatrix, point_idx: usize) -> Vec<usize> {
        let point = data.row(point_idx);
        (0..data.n_rows())
            .filter(|&idx| idx == point_idx || euclidean(point, data.row(idx)) <= self.eps)
            .collect()
    }

    /// Fit and return labels, core points and the cluster count.
    pub fn fit(&self, data: &FeatureMatrix) -> Result<DbscanFit> {
        self.validate()?;

        let n = data.n_rows();
        let mut labels = vec![NOISE; n];
        let mut visited = vec![false; n];
        let mut is_core = vec![false; n];
        let mut cluster_id: isize = 0;

        for point_idx in 0..n {
            if visited[point_idx] {
                continue;
            }
            visited[point_idx] = true;

            let neighbors = self.region_query(data, point_idx);
            if neighbors.len() < self.min_samples {
                continue;
            }
            is_core[point_idx] = true;
            labels[point_idx] = cluster_id;

            let mut queue: VecDeque<usize> = neighbors.into();
            while let Some(q) = queue.pop_front() {
                if labels[q] == NOISE {
                    labels[q] = cluster_id;
                }
                if visited[q] {
                    continue;
                }
                visited[q] = true;

                let q_neighbors = self.region_query(data, q);
                if q_neighbors.len() >= self.min_samples {
                    is_core[q] = true;
                    queue.extend(
                        q_neighbors
                            .into_iter()
                            .filter(|&r| !visited[r] || labels[r] == NOISE),
                    );
                }
            }

            cluster_id += 1;
        }

        let n_clusters = cluster_id as usize;
        let assignment = ClusterAssignment::new(labels);
        tracing::debug!(
            eps = self.eps,
            min_samples = self.min_samples,
            n_clusters,
            noise = assignment.n_noise(),
            "dbscan finished"
        );

        Ok(DbscanFit {
            assignment,
            core_samples: (0..n).filter(|&i| is_core[i]).collect(),
            n_clusters,
        })
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(1.5, 5)
    }
}

impl Clustering for Dbscan {
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<ClusterAssignment> {
        self.fit(data).map(|fit| fit.assignment)
    }

    /// DBSCAN discovers clusters dynamically, so this returns 0.
    ///
    /// To get the actual number of clusters, see [`DbscanFit::n_clusters`].
    fn n_clusters(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
