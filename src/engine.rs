//! Request-level dispatch: table in, fitted analysis out.
//!
//! An [`Analysis`] names the columns to use and what to do with them. [`run`]
//! builds the feature matrix (dropping incomplete rows, requiring enough rows
//! for the request) and hands it to the chosen algorithm.
//!
//! ```rust
//! use cohort::engine::{run, Analysis, Method};
//! use cohort::Table;
//!
//! let table = Table::new(
//!     vec!["Sleep Duration".into(), "Stress Level".into()],
//!     vec![
//!         vec![6.1.into(), 8.0.into()],
//!         vec![6.2.into(), 8.0.into()],
//!         vec![7.8.into(), 3.0.into()],
//!         vec![7.9.into(), 3.0.into()],
//!     ],
//! )
//! .unwrap();
//!
//! let method: Method = "K-means".parse().unwrap();
//! let analysis = Analysis::cluster(["Sleep Duration", "Stress Level"], method.with_k(2));
//! let outcome = run(&table, &analysis).unwrap();
//!
//! let labels = outcome.assignment().unwrap();
//! assert_eq!(labels.label(0), labels.label(1));
//! assert_ne!(labels.label(0), labels.label(2));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::cluster::{
    ClusterAssignment, Clustering, Dbscan, DbscanFit, Gmm, GmmFit, HierarchicalClustering,
    HierarchicalFit, Kmeans, KmeansFit,
};
use crate::error::{Error, NonConvergenceWarning, Result};
use crate::matrix::{FeatureMatrix, FeatureMatrixBuilder};
use crate::regression::{LinearRegression, RegressionFit};
use crate::table::Table;

/// A clustering algorithm together with its parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "algorithm", rename_all = "snake_case"))]
pub enum Method {
    /// Centroid clustering.
    Kmeans(Kmeans),
    /// Density clustering with noise.
    Dbscan(Dbscan),
    /// Gaussian mixture fitted by EM.
    Gmm(Gmm),
    /// Single-linkage agglomerative clustering.
    Hierarchical(HierarchicalClustering),
}

impl Method {
    /// Look up an algorithm by display name or short alias, case-insensitively.
    ///
    /// Returns the algorithm with its default parameters (k = 3 for the
    /// k-based methods, eps = 1.5 and min_samples = 5 for DBSCAN).
    ///
    /// | Name | Aliases |
    /// |------|---------|
    /// | `K-means` | `kmeans`, `k_means` |
    /// | `EM (Gaussian Mixture)` | `em`, `gmm`, `gaussian mixture` |
    /// | `DBSCAN` | |
    /// | `Hierarchical (SLINK)` | `hierarchical`, `slink`, `single linkage` |
    pub fn from_name(name: &str) -> Result<Self> {
        let key = name.trim().to_ascii_lowercase();
        let method = match key.as_str() {
            "k-means" | "kmeans" | "k_means" => Method::Kmeans(Kmeans::default()),
            "em (gaussian mixture)" | "em" | "gmm" | "gaussian mixture" => {
                Method::Gmm(Gmm::default())
            }
            "dbscan" => Method::Dbscan(Dbscan::default()),
            "hierarchical (slink)" | "hierarchical" | "slink" | "single linkage" => {
                Method::Hierarchical(HierarchicalClustering::default())
            }
            _ => return Err(Error::UnknownAlgorithm(name.to_string())),
        };
        Ok(method)
    }

    /// Replace `k` for the k-based methods; DBSCAN is returned unchanged.
    pub fn with_k(self, k: usize) -> Self {
        match self {
            Method::Kmeans(m) => Method::Kmeans(m.with_k(k)),
            Method::Gmm(m) => Method::Gmm(m.with_k(k)),
            Method::Hierarchical(m) => Method::Hierarchical(m.with_k(k)),
            Method::Dbscan(m) => Method::Dbscan(m),
        }
    }

    /// Dashboard display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Method::Kmeans(_) => "K-means",
            Method::Dbscan(_) => "DBSCAN",
            Method::Gmm(_) => "EM (Gaussian Mixture)",
            Method::Hierarchical(_) => "Hierarchical (SLINK)",
        }
    }

    /// The algorithm behind the common clustering interface.
    pub fn as_clustering(&self) -> &dyn Clustering {
        match self {
            Method::Kmeans(m) => m,
            Method::Dbscan(m) => m,
            Method::Gmm(m) => m,
            Method::Hierarchical(m) => m,
        }
    }

    /// Fewest complete rows the method can work with.
    pub fn min_rows(&self) -> usize {
        // DBSCAN reports 0 clusters up front; any non-empty input is valid.
        self.as_clustering().n_clusters().max(1)
    }

    /// Fit on an already built matrix.
    pub fn fit(&self, data: &FeatureMatrix) -> Result<Outcome> {
        Ok(match self {
            Method::Kmeans(m) => Outcome::Kmeans(m.fit(data)?),
            Method::Dbscan(m) => Outcome::Dbscan(m.fit(data)?),
            Method::Gmm(m) => Outcome::Gmm(m.fit(data)?),
            Method::Hierarchical(m) => Outcome::Hierarchical(m.fit(data)?),
        })
    }
}

impl Default for Method {
    fn default() -> Self {
        Method::Kmeans(Kmeans::default())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Method::from_name(s)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What to compute on a table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Analysis {
    /// Cluster rows on the selected numeric columns.
    Cluster {
        /// Feature columns, in matrix column order.
        features: Vec<String>,
        /// Algorithm and parameters; K-means with k = 3 when omitted.
        #[cfg_attr(feature = "serde", serde(default))]
        method: Method,
    },
    /// Fit `response = slope · predictor + intercept`.
    Regression {
        /// Predictor column.
        predictor: String,
        /// Response column.
        response: String,
    },
}

impl Analysis {
    /// Clustering request.
    pub fn cluster<I, S>(features: I, method: Method) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Analysis::Cluster {
            features: features.into_iter().map(Into::into).collect(),
            method,
        }
    }

    /// Regression request.
    pub fn regression(predictor: impl Into<String>, response: impl Into<String>) -> Self {
        Analysis::Regression {
            predictor: predictor.into(),
            response: response.into(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Analysis::Cluster { method, .. } => method.as_clustering().name(),
            Analysis::Regression { .. } => "regression",
        }
    }

    /// Run against a table, keeping the table rows that were used.
    pub fn fit(&self, table: &Table) -> Result<FittedAnalysis> {
        let span = tracing::info_span!("analysis", kind = self.kind(), rows = table.n_rows());
        let _guard = span.enter();

        let fitted = match self {
            Analysis::Cluster { features, method } => {
                let matrix = FeatureMatrixBuilder::new(features.iter().map(String::as_str))
                    .with_min_rows(method.min_rows())
                    .with_algorithm(method.as_clustering().name())
                    .build(table)?;
                FittedAnalysis {
                    outcome: method.fit(&matrix)?,
                    source_rows: matrix.source_rows().to_vec(),
                }
            }
            Analysis::Regression {
                predictor,
                response,
            } => {
                let matrix = FeatureMatrixBuilder::new([predictor.as_str(), response.as_str()])
                    .with_min_rows(2)
                    .with_algorithm("regression")
                    .build(table)?;
                let fit = LinearRegression::new(predictor.as_str(), response.as_str())
                    .fit_matrix(&matrix)?;
                FittedAnalysis {
                    outcome: Outcome::Regression(fit),
                    source_rows: matrix.source_rows().to_vec(),
                }
            }
        };

        match fitted.outcome.assignment() {
            Some(assignment) => tracing::info!(
                used = fitted.source_rows.len(),
                clusters = assignment.n_clusters(),
                noise = assignment.n_noise(),
                "analysis finished"
            ),
            None => tracing::info!(used = fitted.source_rows.len(), "analysis finished"),
        }
        if let Some(warning) = fitted.outcome.warning() {
            tracing::warn!(%warning, "analysis result is best effort");
        }

        Ok(fitted)
    }
}

/// Result of one algorithm.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "algorithm", rename_all = "snake_case"))]
pub enum Outcome {
    /// K-means fit.
    Kmeans(KmeansFit),
    /// DBSCAN fit.
    Dbscan(DbscanFit),
    /// EM fit.
    Gmm(GmmFit),
    /// Single-linkage fit.
    Hierarchical(HierarchicalFit),
    /// Least-squares fit.
    Regression(RegressionFit),
}

impl Outcome {
    /// Cluster labels, for clustering outcomes.
    pub fn assignment(&self) -> Option<&ClusterAssignment> {
        match self {
            Outcome::Kmeans(fit) => Some(&fit.assignment),
            Outcome::Dbscan(fit) => Some(&fit.assignment),
            Outcome::Gmm(fit) => Some(&fit.assignment),
            Outcome::Hierarchical(fit) => Some(&fit.assignment),
            Outcome::Regression(_) => None,
        }
    }

    /// Short algorithm name.
    pub fn algorithm(&self) -> &'static str {
        match self {
            Outcome::Kmeans(_) => "kmeans",
            Outcome::Dbscan(_) => "dbscan",
            Outcome::Gmm(_) => "gmm",
            Outcome::Hierarchical(_) => "hierarchical",
            Outcome::Regression(_) => "regression",
        }
    }

    /// Non-fatal convergence problem, if any.
    pub fn warning(&self) -> Option<&NonConvergenceWarning> {
        match self {
            Outcome::Gmm(fit) => fit.warning.as_ref(),
            _ => None,
        }
    }
}

/// An [`Outcome`] plus the table rows it was computed from.
///
/// `source_rows[i]` is the table row behind result row `i`, so labels can be
/// joined back onto the original data.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FittedAnalysis {
    /// Algorithm result.
    pub outcome: Outcome,
    /// Table row index per result row.
    pub source_rows: Vec<usize>,
}

impl FittedAnalysis {
    /// Label per table row; `None` for rows dropped as incomplete.
    pub fn labels_by_table_row(&self, n_table_rows: usize) -> Option<Vec<Option<isize>>> {
        let assignment = self.outcome.assignment()?;
        let mut out = vec![None; n_table_rows];
        for (&row, &label) in self.source_rows.iter().zip(assignment.labels()) {
            if let Some(slot) = out.get_mut(row) {
                *slot = Some(label);
            }
        }
        Some(out)
    }
}

/// Build the matrix for `analysis` from `table` and fit it.
pub fn run(table: &Table, analysis: &Analysis) -> Result<Outcome> {
    analysis.fit(table).map(|fitted| fitted.outcome)
}
