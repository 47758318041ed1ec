//! Gaussian Mixture Model clustering.
//!
//! GMM provides **soft clustering** with probabilistic assignments,
//! allowing items to belong to multiple clusters with different probabilities.
//!
//! # The Probabilistic Model
//!
//! GMM assumes data is generated from K Gaussian distributions:
//!
//! ```text
//! P(x) = Σₖ πₖ × N(x | μₖ, Σₖ)
//! ```
//!
//! Where:
//! - πₖ = mixing weight (probability of cluster k)
//! - μₖ = mean of cluster k
//! - Σₖ = full covariance matrix of cluster k
//!
//! # The EM Algorithm
//!
//! **E-step**: Compute "responsibilities" (soft assignments):
//! ```text
//! γₙₖ = πₖ × N(xₙ | μₖ, Σₖ) / Σⱼ πⱼ × N(xₙ | μⱼ, Σⱼ)
//! ```
//!
//! **M-step**: Update parameters using responsibilities:
//! - πₖ = Nₖ / N, with Nₖ = Σₙ γₙₖ
//! - μₖ = Σₙ γₙₖ xₙ / Nₖ
//! - Σₖ = Σₙ γₙₖ (xₙ - μₖ)(xₙ - μₖ)ᵀ / Nₖ + ε I
//!
//! Iterate until the total log-likelihood changes by less than `tol`, or
//! `max_iter` M-steps have run. Each EM step cannot decrease the likelihood
//! (up to the ε regularization), so the recorded history is non-decreasing.
//!
//! # Failure Modes
//!
//! - **Local optima**: EM converges to local maxima; initialization matters
//! - **Singular covariance**: Small clusters can collapse; ε is added to the
//!   diagonal. If a covariance is still not positive definite the fit stops
//!   at the previous iterate with a [`NonConvergenceWarning`].

use super::assignment::ClusterAssignment;
use super::kmeans::{init_centroids, resolve_seed};
use super::traits::{Clustering, SoftClustering};
use super::validate_k;
use crate::error::{Error, NonConvergenceReason, NonConvergenceWarning, Result};
use crate::matrix::FeatureMatrix;
use faer::prelude::*;
use faer::{Mat, Side};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::prelude::*;

const NAME: &str = "gmm";

/// Gaussian Mixture Model clustering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Gmm {
    /// Number of components (clusters).
    k: usize,
    /// Maximum EM iterations.
    max_iter: usize,
    /// Convergence tolerance on the log-likelihood change.
    tol: f64,
    /// Regularization added to covariance diagonals.
    reg_covar: f64,
    /// Random seed.
    seed: Option<u64>,
}

/// One Gaussian of the mixture.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MixtureComponent {
    /// Mean vector.
    pub mean: Array1<f64>,
    /// Covariance matrix, regularization included.
    pub covariance: Array2<f64>,
    /// Mixing weight.
    pub weight: f64,
}

/// Result of a GMM fit.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GmmFit {
    /// Most responsible component per row.
    pub assignment: ClusterAssignment,
    /// `n × k` posterior probabilities.
    pub responsibilities: Array2<f64>,
    /// Fitted components.
    pub components: Vec<MixtureComponent>,
    /// Total log-likelihood of the returned parameters.
    pub log_likelihood: f64,
    /// Log-likelihood at initialization and after every EM step.
    pub log_likelihood_history: Vec<f64>,
    /// EM steps performed.
    pub iterations: usize,
    /// Whether the tolerance was met.
    pub converged: bool,
    /// Set when the fit stopped without meeting the tolerance.
    pub warning: Option<NonConvergenceWarning>,
    /// Seed used for initialization.
    pub seed: u64,
}

impl Gmm {
    /// Create a new GMM with `k` components.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-4,
            reg_covar: 1e-6,
            seed: None,
        }
    }

    /// Set the number of components.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the log-likelihood convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set covariance regularization.
    pub fn with_reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Configured number of components.
    pub fn k(&self) -> usize {
        self.k
    }

    fn validate(&self, n: usize) -> Result<()> {
        validate_k(NAME, self.k, n)?;
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                algorithm: NAME,
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if !(self.tol.is_finite() && self.tol >= 0.0) {
            return Err(Error::InvalidParameter {
                algorithm: NAME,
                name: "tol",
                message: "must be finite and non-negative",
            });
        }
        if !(self.reg_covar.is_finite() && self.reg_covar >= 0.0) {
            return Err(Error::InvalidParameter {
                algorithm: NAME,
                name: "reg_covar",
                message: "must be finite and non-negative",
            });
        }
        Ok(())
    }

    /// Run EM and return the mixture, responsibilities and diagnostics.
    pub fn fit(&self, data: &FeatureMatrix) -> Result<GmmFit> {
        self.validate(data.n_rows())?;

        let seed = resolve_seed(self.seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let x = data.view();

        let mut components = self.init_components(x, &mut rng);
        let (mut resp, mut log_likelihood) = e_step(x, &components).map_err(singular_error)?;

        let mut history = vec![log_likelihood];
        let mut iterations = 0;
        let mut last_change = f64::INFINITY;
        let mut converged = false;
        let mut warning = None;

        while iterations < self.max_iter {
            let next = m_step(x, &resp, &components, self.reg_covar);
            match e_step(x, &next) {
                Ok((next_resp, next_ll)) => {
                    iterations += 1;
                    components = next;
                    resp = next_resp;
                    last_change = next_ll - log_likelihood;
                    log_likelihood = next_ll;
                    history.push(log_likelihood);
                    tracing::debug!(iteration = iterations, log_likelihood, change = last_change, "gmm em step");

                    if last_change.abs() < self.tol {
                        converged = true;
                        break;
                    }
                }
                Err(component) => {
                    warning = Some(NonConvergenceWarning {
                        algorithm: NAME,
                        reason: NonConvergenceReason::SingularCovariance { component },
                    });
                    break;
                }
            }
        }

        if !converged && warning.is_none() {
            warning = Some(NonConvergenceWarning {
                algorithm: NAME,
                reason: NonConvergenceReason::IterationCap {
                    iterations,
                    last_change,
                },
            });
        }
        if let Some(w) = &warning {
            tracing::warn!(k = self.k, "{w}");
        }

        let assignment = ClusterAssignment::from_indices(argmax_rows(&resp));
        tracing::debug!(k = self.k, iterations, converged, log_likelihood, "gmm finished");

        Ok(GmmFit {
            assignment,
            responsibilities: resp,
            components,
            log_likelihood,
            log_likelihood_history: history,
            iterations,
            converged,
            warning,
            seed,
        })
    }

    /// Means from sampled rows, isotropic covariances at the average feature
    /// variance, uniform weights.
    fn init_components(&self, x: ArrayView2<'_, f64>, rng: &mut impl Rng) -> Vec<MixtureComponent> {
        let means = init_centroids(x, self.k, rng);

        let scale = x
            .var_axis(Axis(0), 0.0)
            .mean()
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(1.0);
        let covariance = Array2::<f64>::eye(x.ncols()) * (scale + self.reg_covar);

        means
            .rows()
            .into_iter()
            .map(|mean| MixtureComponent {
                mean: mean.to_owned(),
                covariance: covariance.clone(),
                weight: 1.0 / self.k as f64,
            })
            .collect()
    }
}

impl GmmFit {
    /// Posterior component probabilities for new rows under the fitted mixture.
    pub fn predict_proba(&self, data: &FeatureMatrix) -> Result<Array2<f64>> {
        let d = self.components.first().map_or(0, |c| c.mean.len());
        if data.n_cols() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: data.n_cols(),
            });
        }
        e_step(data.view(), &self.components)
            .map(|(resp, _)| resp)
            .map_err(singular_error)
    }

    /// Most probable component for new rows.
    pub fn predict(&self, data: &FeatureMatrix) -> Result<ClusterAssignment> {
        let proba = self.predict_proba(data)?;
        Ok(ClusterAssignment::from_indices(argmax_rows(&proba)))
    }
}

fn singular_error(component: usize) -> Error {
    Error::DegenerateInput {
        algorithm: NAME,
        name: format!("gmm component {component}"),
        message: "covariance is not positive definite",
    }
}

/// Responsibilities and total log-likelihood.
///
/// Fails with the index of the first component whose covariance cannot be
/// factored.
fn e_step(
    x: ArrayView2<'_, f64>,
    components: &[MixtureComponent],
) -> std::result::Result<(Array2<f64>, f64), usize> {
    let (n, d) = x.dim();
    let k = components.len();
    let log_2pi = d as f64 * (2.0 * std::f64::consts::PI).ln();

    // (log normaliser, squared Mahalanobis distance per row) per component.
    let terms = components
        .iter()
        .enumerate()
        .map(|(c, comp)| {
            gaussian_terms(x, comp)
                .map(|(log_det, maha)| (comp.weight.ln() - 0.5 * (log_2pi + log_det), maha))
                .ok_or(c)
        })
        .collect::<std::result::Result<Vec<_>, usize>>()?;

    let mut resp = Array2::zeros((n, k));
    let mut log_probs = vec![0.0; k];
    let mut total = 0.0;

    for i in 0..n {
        for (c, (log_norm, maha)) in terms.iter().enumerate() {
            log_probs[c] = log_norm - 0.5 * maha[i];
        }

        let log_sum = logsumexp(&log_probs);
        for c in 0..k {
            resp[[i, c]] = (log_probs[c] - log_sum).exp();
        }
        total += log_sum;
    }

    Ok((resp, total))
}

/// `log |Σ|` and `(xᵢ - μ)ᵀ Σ⁻¹ (xᵢ - μ)` for every row, through `Σ = LLᵀ`.
///
/// `None` when the covariance is not positive definite.
fn gaussian_terms(x: ArrayView2<'_, f64>, comp: &MixtureComponent) -> Option<(f64, Vec<f64>)> {
    let (n, d) = x.dim();
    let cov = Mat::<f64>::from_fn(d, d, |i, j| comp.covariance[[i, j]]);
    let llt = cov.cholesky(Side::Lower).ok()?;

    let l = llt.compute_l();
    let log_det = 2.0 * (0..d).map(|i| l[(i, i)].ln()).sum::<f64>();

    // One column per row of `x`.
    let diff = Mat::<f64>::from_fn(d, n, |r, i| x[[i, r]] - comp.mean[r]);
    let solved = llt.solve(&diff);
    let maha = (0..n)
        .map(|i| (0..d).map(|r| diff[(r, i)] * solved[(r, i)]).sum::<f64>())
        .collect();

    Some((log_det, maha))
}

/// Responsibility-weighted weights, means and covariances.
///
/// A component with no responsibility mass keeps its mean and covariance.
fn m_step(
    x: ArrayView2<'_, f64>,
    resp: &Array2<f64>,
    previous: &[MixtureComponent],
    reg_covar: f64,
) -> Vec<MixtureComponent> {
    let n = x.nrows();

    previous
        .iter()
        .enumerate()
        .map(|(c, prev)| {
            let gamma = resp.column(c);
            let nk = gamma.sum();
            let weight = nk / n as f64;

            if nk <= 10.0 * f64::EPSILON {
                return MixtureComponent {
                    mean: prev.mean.clone(),
                    covariance: prev.covariance.clone(),
                    weight,
                };
            }

            let mean = gamma.dot(&x) / nk;
            let diff = &x - &mean;
            let weighted = &diff * &gamma.insert_axis(Axis(1));
            let mut covariance = weighted.t().dot(&diff) / nk;
            covariance.diag_mut().mapv_inplace(|v| v + reg_covar);

            MixtureComponent {
                mean,
                covariance,
                weight,
            }
        })
        .collect()
}

/// Column index of each row's maximum; ties go to the lowest index.
fn argmax_rows(probs: &Array2<f64>) -> Vec<usize> {
    probs
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for (c, &p) in row.iter().enumerate() {
                if p > row[best] {
                    best = c;
                }
            }
            best
        })
        .collect()
}

/// Log-sum-exp for numerical stability.
fn logsumexp(values: &[f64]) -> f64 {
    let max_val = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_val.is_infinite() {
        return max_val;
    }
    max_val + values.iter().map(|&v| (v - max_val).exp()).sum::<f64>().ln()
}

impl Default for Gmm {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Clustering for Gmm {
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

impl SoftClustering for Gmm {
    fn fit_predict_proba(&self, data: &FeatureMatrix) -> Result<Array2<f64>> {
        self.fit(data).map(|fit| fit.responsibilities)
    }
}
