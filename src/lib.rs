//! # cohort
//!
//! Exploratory analysis over tabular survey data: pick numeric columns, group
//! rows with one of four clustering algorithms, or fit a one-variable
//! least-squares line.
//!
//! | Module | What it does |
//! |--------|--------------|
//! | [`table`] | Heterogeneous rows with named columns |
//! | [`matrix`] | Column selection and missing-row filtering into a dense matrix |
//! | [`distance`] | Euclidean primitives |
//! | [`cluster`] | K-means, DBSCAN, Gaussian mixture (EM), single-linkage hierarchical |
//! | [`hierarchy`] | Dendrogram built by hierarchical clustering |
//! | [`regression`] | Univariate ordinary least squares |
//! | [`metrics`] | Inertia and silhouette score |
//! | [`engine`] | Name-based dispatch from a table and a request |
//!
//! All algorithms are synchronous and deterministic given a seed. The
//! `parallel` feature spreads per-row work over rayon without changing
//! results; the default `serde` feature makes parameters deserializable and
//! results serializable.

pub mod cluster;
pub mod distance;
pub mod engine;
/// Error types used across `cohort`.
pub mod error;
pub mod hierarchy;
pub mod matrix;
pub mod metrics;
pub mod regression;
pub mod table;


pub use cluster::{
    ClusterAssignment, Clustering, Dbscan, Gmm, HierarchicalClustering, Kmeans, SoftClustering,
    NOISE,
};
pub use engine::{run, Analysis, FittedAnalysis, Method, Outcome};
pub use error::{Error, NonConvergenceReason, NonConvergenceWarning, Result};
pub use hierarchy::Dendrogram;
pub use matrix::{FeatureMatrix, FeatureMatrixBuilder};
pub use metrics::{inertia, silhouette_score};
pub use regression::{LinearRegression, RegressionFit, RegressionModel};
pub use table::{ColumnSummary, Table, Value};
