//! Univariate Gaussian mixture fitted by Expectation-Maximization.
//!
//! Used by the "Mixed" projection index: a projection that is well explained
//! by two separated Gaussians has a low Akaike Information Criterion.
//! Each fit starts from a hard split of the sorted values at jittered
//! quantiles, so the best (lowest AIC) of several restarts is kept.

use std::f64::consts::PI;

use rand::{Rng, RngCore};

use crate::error::{Error, Result};

/// Variance floor that stops a component collapsing onto a single value.
const MIN_VARIANCE: f64 = 1e-6;

/// EM configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianMixture {
    components: usize,
    restarts: usize,
    max_iterations: usize,
    tolerance: f64,
}

/// A fitted mixture.
#[derive(Clone, Debug, PartialEq)]
pub struct MixtureFit {
    /// Mixing proportions, summing to 1.
    pub weights: Vec<f64>,
    pub means: Vec<f64>,
    pub variances: Vec<f64>,
    /// `-2 · loglik + 2 · (3k - 1)`.
    pub aic: f64,
    /// Sum over points of the largest posterior membership, in `[n / k, n]`.
    pub certainty: f64,
    /// EM iterations performed by the winning restart.
    pub iterations: usize,
}

impl GaussianMixture {
    /// Defaults: 2 components, 4 restarts, at most 500 iterations, AIC tolerance 1e-3.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_components(mut self, components: usize) -> Self {
        self.components = components;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Iteration stops once the AIC changes by less than this.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Number of free parameters: k means, k variances, k - 1 weights.
    pub fn parameter_count(&self) -> usize {
        3 * self.components - 1
    }

    /// Fit `values`, keeping the lowest-AIC restart.
    pub fn fit(&self, values: &[f64], rng: &mut dyn RngCore) -> Result<MixtureFit> {
        if values.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.components == 0 {
            return Err(Error::InvalidParameter {
                name: "components",
                message: "must be at least 1",
            });
        }
        if self.restarts == 0 {
            return Err(Error::InvalidParameter {
                name: "restarts",
                message: "must be at least 1",
            });
        }

        let mut best = self.fit_once(values, rng);
        for _ in 1..self.restarts {
            let candidate = self.fit_once(values, rng);
            if candidate.aic < best.aic {
                best = candidate;
            }
        }
        tracing::trace!(
            aic = best.aic,
            certainty = best.certainty,
            iterations = best.iterations,
            "mixture fitted"
        );
        Ok(best)
    }

    fn fit_once(&self, values: &[f64], rng: &mut dyn RngCore) -> MixtureFit {
        let k = self.components;
        let n = values.len();

        let mut posterior = initial_posterior(values, k, rng);
        let mut weights = vec![0.0; k];
        let mut means = vec![0.0; k];
        let mut variances = vec![1.0; k];
        let mut log_joint = vec![0.0; k];
        let mut aic = f64::INFINITY;
        let mut iterations = 0;

        for iteration in 1..=self.max_iterations {
            iterations = iteration;

            // M-step.
            for j in 0..k {
                let mass: f64 = (0..n).map(|i| posterior[i * k + j]).sum();
                weights[j] = mass / n as f64;
                if mass <= f64::EPSILON {
                    means[j] = 0.0;
                    variances[j] = 1.0;
                    continue;
                }
                let mean = (0..n).map(|i| posterior[i * k + j] * values[i]).sum::<f64>() / mass;
                let var = (0..n)
                    .map(|i| posterior[i * k + j] * (values[i] - mean).powi(2))
                    .sum::<f64>()
                    / mass;
                means[j] = mean;
                variances[j] = var.max(MIN_VARIANCE);
            }

            // E-step with log-sum-exp, accumulating the log-likelihood.
            let mut loglik = 0.0;
            for (i, &v) in values.iter().enumerate() {
                for j in 0..k {
                    log_joint[j] = weights[j].ln() + log_normal(v, means[j], variances[j]);
                }
                let max = log_joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let total = max + log_joint.iter().map(|l| (l - max).exp()).sum::<f64>().ln();
                loglik += total;
                for j in 0..k {
                    posterior[i * k + j] = (log_joint[j] - total).exp();
                }
            }

            let previous = aic;
            aic = -2.0 * loglik + 2.0 * self.parameter_count() as f64;
            if iteration > 1 && (aic - previous).abs() < self.tolerance {
                break;
            }
        }

        let certainty = posterior
            .chunks_exact(k)
            .map(|row| row.iter().copied().fold(0.0, f64::max))
            .sum();

        MixtureFit {
            weights,
            means,
            variances,
            aic,
            certainty,
            iterations,
        }
    }
}

impl Default for GaussianMixture {
    fn default() -> Self {
        Self {
            components: 2,
            restarts: 4,
            max_iterations: 500,
            tolerance: 1e-3,
        }
    }
}

/// Hard 0/1 memberships: the sorted values are cut into `k` runs at the
/// `j / k` quantiles, each cut moved by up to a quarter of a run.
fn initial_posterior(values: &[f64], k: usize, rng: &mut dyn RngCore) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let cuts: Vec<usize> = (1..k)
        .map(|j| {
            let jitter = rng.random_range(-0.25..0.25);
            let at = (j as f64 + jitter) / k as f64 * n as f64;
            (at.round() as usize).clamp(1, n.saturating_sub(1).max(1))
        })
        .collect();

    let mut posterior = vec![0.0; n * k];
    for (rank, &i) in order.iter().enumerate() {
        let component = cuts.iter().filter(|&&cut| cut <= rank).count();
        posterior[i * k + component] = 1.0;
    }
    posterior
}

fn log_normal(x: f64, mean: f64, variance: f64) -> f64 {
    -0.5 * ((2.0 * PI * variance).ln() + (x - mean).powi(2) / variance)
}
