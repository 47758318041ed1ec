//! Univariate ordinary least squares.
//!
//! Fits `y = slope · x + intercept` in closed form:
//!
//! ```text
//! slope     = Σ (xᵢ - x̄)(yᵢ - ȳ) / Σ (xᵢ - x̄)²
//! intercept = ȳ - slope · x̄
//! ```
//!
//! Sums are taken over deviations from the means rather than the textbook
//! `n Σxy - Σx Σy` form, which cancels badly when values are large relative
//! to their spread.

use crate::error::{Error, Result};
use crate::matrix::{FeatureMatrix, FeatureMatrixBuilder};
use crate::table::Table;

const NAME: &str = "regression";

/// A fitted line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegressionModel {
    /// Change in response per unit of predictor.
    pub slope: f64,
    /// Response at predictor zero.
    pub intercept: f64,
}

impl RegressionModel {
    /// Predicted response for one predictor value.
    pub fn predict_one(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Predicted responses.
    pub fn predict(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&v| self.predict_one(v)).collect()
    }
}

/// Model plus in-sample diagnostics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegressionFit {
    /// Fitted coefficients.
    pub model: RegressionModel,
    /// Predicted response for every input predictor.
    pub fitted: Vec<f64>,
    /// `y - fitted`.
    pub residuals: Vec<f64>,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Pairs used.
    pub n: usize,
}

/// Closed-form least-squares fitter for one predictor and one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearRegression {
    /// Predictor column name.
    pub predictor: String,
    /// Response column name.
    pub response: String,
}

impl LinearRegression {
    /// Fitter reading the named columns of a [`Table`].
    pub fn new(predictor: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            predictor: predictor.into(),
            response: response.into(),
        }
    }

    /// Fit on the configured table columns, dropping rows missing either value.
    pub fn fit_table(&self, table: &Table) -> Result<RegressionFit> {
        let matrix = FeatureMatrixBuilder::new([self.predictor.as_str(), self.response.as_str()])
            .with_min_rows(2)
            .with_algorithm(NAME)
            .build(table)?;
        self.fit_matrix(&matrix)
    }

    /// Fit on a two-column matrix: predictor first, response second.
    pub fn fit_matrix(&self, matrix: &FeatureMatrix) -> Result<RegressionFit> {
        if matrix.n_cols() != 2 {
            return Err(Error::DimensionMismatch {
                expected: 2,
                found: matrix.n_cols(),
            });
        }
        fit_named(&matrix.column_values(0), &matrix.column_values(1), &self.predictor)
    }
}

/// Fit paired slices.
pub fn fit(x: &[f64], y: &[f64]) -> Result<RegressionFit> {
    fit_named(x, y, "x")
}

fn fit_named(x: &[f64], y: &[f64], predictor: &str) -> Result<RegressionFit> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            found: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(Error::InsufficientData {
            algorithm: NAME,
            required: 2,
            found: n,
        });
    }
    for (row, (a, b)) in x.iter().zip(y).enumerate() {
        if !a.is_finite() {
            return Err(Error::NonFiniteValue { row, column: 0 });
        }
        if !b.is_finite() {
            return Err(Error::NonFiniteValue { row, column: 1 });
        }
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - x_mean;
        let dy = b - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    // Zero spread. `sxx` underflows for subnormal gaps between values.
    if x.iter().all(|&v| v == x[0]) || sxx == 0.0 {
        return Err(Error::DegenerateInput {
            algorithm: NAME,
            name: predictor.to_string(),
            message: "predictor has zero variance",
        });
    }

    let slope = sxy / sxx;
    let model = RegressionModel {
        slope,
        intercept: y_mean - slope * x_mean,
    };

    let fitted = model.predict(x);
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(b, f)| b - f).collect();
    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
    let r_squared = if syy > 0.0 {
        1.0 - ss_res / syy
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    tracing::debug!(n, slope, intercept = model.intercept, r_squared, "regression fitted");

    Ok(RegressionFit {
        model,
        fitted,
        residuals,
        r_squared,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn test_recovers_noiseless_line() {
        let fit = fit(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();

        assert!((fit.model.slope - 2.0).abs() < 1e-12);
        assert!((fit.model.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert!(fit.residuals.iter().all(|r| r.abs() < 1e-12));
        assert_eq!(fit.fitted.len(), 4);
    }

    #[test]
    fn test_zero_variance_predictor() {
        let err = fit(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput { .. }));

        // Repeated non-representable value: the mean rounds.
        let err = fit(&[0.1; 7], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput { .. }));
    }

    #[test]
    fn test_large_offset_predictor() {
        // Unix timestamps: tiny spread relative to magnitude.
        let fit = fit(&[1.7e9, 1.7e9 + 10.0, 1.7e9 + 20.0], &[1.0, 2.0, 3.0]).unwrap();

        assert!((fit.model.slope - 0.1).abs() < 1e-12);
        assert!((fit.model.predict_one(1.7e9 + 30.0) - 4.0).abs() < 1e-6);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_noisy_fit() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.2, 2.8, 4.5, 3.7, 5.5];
        let fit = fit(&x, &y).unwrap();

        // Reference values from the closed form by hand.
        assert!((fit.model.slope - 0.75).abs() < 1e-12);
        assert!((fit.model.intercept - 1.49).abs() < 1e-12);
        assert!(fit.r_squared > 0.0 && fit.r_squared < 1.0);
        let residual_sum: f64 = fit.residuals.iter().sum();
        assert!(residual_sum.abs() < 1e-12);
    }

    #[test]
    fn test_constant_response() {
        let fit = fit(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fit.model.slope, 0.0);
        assert_eq!(fit.model.intercept, 4.0);
        assert_eq!(fit.r_squared, 1.0);
    }

    #[test]
    fn test_input_validation() {
        assert!(matches!(
            fit(&[1.0], &[1.0]),
            Err(Error::InsufficientData {
                algorithm: "regression",
                required: 2,
                found: 1
            })
        ));
        assert!(matches!(
            fit(&[1.0, 2.0], &[1.0]),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            fit(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(Error::NonFiniteValue { row: 1, column: 0 })
        ));
    }

    #[test]
    fn test_fit_table_drops_missing_pairs() {
        let table = Table::new(
            vec!["Physical Activity Level".into(), "Sleep Duration".into()],
            vec![
                vec![0.0.into(), 1.0.into()],
                vec![1.0.into(), Value::Missing],
                vec![1.0.into(), 3.0.into()],
                vec![2.0.into(), 5.0.into()],
            ],
        )
        .unwrap();

        let fit = LinearRegression::new("Physical Activity Level", "Sleep Duration")
            .fit_table(&table)
            .unwrap();
        assert_eq!(fit.n, 3);
        assert!((fit.model.slope - 2.0).abs() < 1e-12);

        let err = LinearRegression::new("Sleep Duration", "Physical Activity Level")
            .fit_table(&Table::new(
                vec!["Sleep Duration".into(), "Physical Activity Level".into()],
                vec![vec![7.0.into(), 30.0.into()], vec![7.0.into(), 60.0.into()]],
            )
            .unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            Error::DegenerateInput {
                algorithm: "regression",
                name: "Sleep Duration".into(),
                message: "predictor has zero variance"
            }
        );
    }
}
