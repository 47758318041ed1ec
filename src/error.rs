use core::fmt;

/// Result alias for `cohort`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by feature extraction, clustering and regression.
///
/// Every variant raised by an algorithm names the algorithm and, where one
/// applies, the offending parameter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// No feature columns were selected.
    #[error("no columns selected")]
    EmptySelection,

    /// Too few valid rows remain for the requested operation.
    #[error("{algorithm}: insufficient data: need at least {required} valid rows, found {found}")]
    InsufficientData {
        /// Operation that needed the rows.
        algorithm: &'static str,
        /// Rows the operation needs.
        required: usize,
        /// Rows left after dropping missing values.
        found: usize,
    },

    /// Matrix or row dimension mismatch.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// A NaN or infinite value reached a numeric routine.
    #[error("non-finite value at row {row}, column {column}")]
    NonFiniteValue {
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
    },

    /// Selected column does not exist in the table.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// Selected column holds non-numeric cells.
    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),

    /// Invalid number of clusters requested.
    #[error("{algorithm}: cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Algorithm that rejected the count.
        algorithm: &'static str,
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    #[error("{algorithm}: invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Algorithm that rejected the parameter.
        algorithm: &'static str,
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Input is valid but admits no unique solution.
    #[error("{algorithm}: degenerate input '{name}': {message}")]
    DegenerateInput {
        /// Algorithm that rejected the input.
        algorithm: &'static str,
        /// Column or parameter name.
        name: String,
        /// Error message.
        message: &'static str,
    },

    /// Algorithm name could not be resolved.
    #[error("unknown algorithm '{0}'")]
    UnknownAlgorithm(String),
}

/// Non-fatal diagnostic attached to a fit whose iterations did not settle.
///
/// The fit carrying it is still the best iterate reached.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NonConvergenceWarning {
    /// Algorithm that emitted the warning.
    pub algorithm: &'static str,
    /// What stopped the iterations.
    pub reason: NonConvergenceReason,
}

/// Why an iterative fit stopped before meeting its tolerance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum NonConvergenceReason {
    /// Iteration cap reached.
    IterationCap {
        /// Iterations performed.
        iterations: usize,
        /// Objective change on the last iteration.
        last_change: f64,
    },
    /// A covariance matrix stayed singular after regularization.
    SingularCovariance {
        /// Offending component.
        component: usize,
    },
}

impl fmt::Display for NonConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            NonConvergenceReason::IterationCap {
                iterations,
                last_change,
            } => write!(
                f,
                "{}: did not converge after {iterations} iterations (last change {last_change:.3e})",
                self.algorithm
            ),
            NonConvergenceReason::SingularCovariance { component } => write!(
                f,
                "{}: covariance of component {component} is singular after regularization",
                self.algorithm
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_algorithm_and_parameter() {
        let err = Error::InvalidParameter {
            algorithm: "dbscan",
            name: "eps",
            message: "must be positive",
        };
        assert_eq!(
            err.to_string(),
            "dbscan: invalid parameter 'eps': must be positive"
        );

        let err = Error::InvalidClusterCount {
            algorithm: "kmeans",
            requested: 5,
            n_items: 2,
        };
        assert!(err.to_string().starts_with("kmeans:"));

        let err = Error::DegenerateInput {
            algorithm: "regression",
            name: "Age".into(),
            message: "predictor has zero variance",
        };
        assert_eq!(
            err.to_string(),
            "regression: degenerate input 'Age': predictor has zero variance"
        );

        let err = Error::InsufficientData {
            algorithm: "gmm",
            required: 3,
            found: 2,
        };
        assert!(err.to_string().starts_with("gmm: insufficient data"));
    }

    #[test]
    fn test_warning_display() {
        let w = NonConvergenceWarning {
            algorithm: "gmm",
            reason: NonConvergenceReason::IterationCap {
                iterations: 10,
                last_change: 0.5,
            },
        };
        assert!(w.to_string().contains("10 iterations"));
    }
}
