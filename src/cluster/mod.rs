//! Clustering algorithms for grouping rows of a feature matrix.
//!
//! ## Hard vs Soft Clustering
//!
//! **Hard clustering** assigns each row to exactly one cluster. K-means,
//! DBSCAN and hierarchical clustering are hard.
//!
//! **Soft clustering** gives each row a probability distribution over
//! clusters. The Gaussian mixture returns these responsibilities and, for a
//! flat answer, labels each row with its most probable component.
//!
//! ## Algorithms
//!
//! ### K-means
//!
//! Assign each point to the nearest centroid, then move centroids to the
//! mean of their points. Repeat until no assignment changes.
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **When to use**: fast exploration when k is known and clusters are
//! roughly spherical.
//!
//! ### DBSCAN
//!
//! Grows clusters from dense regions (points with at least `min_samples`
//! neighbours within `eps`) and labels everything unreachable as noise
//! ([`NOISE`]). The number of clusters is discovered, not given.
//!
//! **When to use**: arbitrary cluster shapes, outliers present, k unknown.
//!
//! ### Gaussian Mixture Model (EM)
//!
//! Models data as a mixture of k Gaussian distributions:
//!
//! ```text
//! P(x) = Σ π_k × N(x | μ_k, Σ_k)
//! ```
//!
//! **When to use**: clusters of different shapes/sizes, or when membership
//! probabilities matter.
//!
//! ### Hierarchical (single linkage)
//!
//! Bottom-up: start with each point as its own cluster, repeatedly merge
//! the two closest clusters until one remains. The merge history forms a
//! [`Dendrogram`](crate::hierarchy::Dendrogram) that is cut to k clusters.
//!
//! **When to use**: exploring structure at several granularities, chained
//! or elongated groups.
//!
//! ## Usage
//!
//! ```rust
//! use cohort::cluster::{Clustering, Gmm, Kmeans, SoftClustering};
//! use cohort::FeatureMatrix;
//!
//! let data = FeatureMatrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ])
//! .unwrap();
//!
//! // Hard clustering with K-means
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
//! assert_eq!(labels.label(0), labels.label(1));
//! assert_ne!(labels.label(0), labels.label(2));
//!
//! // Soft clustering with a Gaussian mixture
//! let probs = Gmm::new(2).with_seed(7).fit_predict_proba(&data).unwrap();
//! // probs[[i, k]] = P(row i belongs to component k)
//! assert_eq!(probs.dim(), (4, 2));
//! ```

mod assignment;
mod dbscan;
mod gmm;
mod hierarchical;
mod kmeans;
mod traits;

pub use assignment::{ClusterAssignment, NOISE};
pub use dbscan::{Dbscan, DbscanFit};
pub use gmm::{Gmm, GmmFit, MixtureComponent};
pub use hierarchical::{HierarchicalClustering, HierarchicalFit};
pub use kmeans::{Kmeans, KmeansFit};
pub use traits::{Clustering, SoftClustering};

use crate::error::{Error, Result};

/// Reject `k` outside `1..=n`.
pub(crate) fn validate_k(algorithm: &'static str, k: usize, n: usize) -> Result<()> {
    if k == 0 || k > n {
        return Err(Error::InvalidClusterCount {
            algorithm,
            requested: k,
            n_items: n,
        });
    }
    Ok(())
}
