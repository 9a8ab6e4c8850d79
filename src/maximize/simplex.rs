//! Nelder-Mead simplex, oriented for maximization.
//!
//! The simplex starts from `n + 1` random unit vectors. Each iteration
//! replaces the worst vertex by reflecting it through the centroid of the
//! others, expanding when the reflection beats the best vertex, and
//! contracting (or shrinking toward the best vertex) when it does not help.
//!
//! The run ends when the best and worst vertex values agree to a relative
//! tolerance of 1e-4. There are no restarts: a poor random start can settle
//! on a local maximum.
//!
//! # References
//!
//! Nelder, J. A., Mead, R. (1965). "A simplex method for function
//! minimization." The Computer Journal 7(4), 308-313.

use rand::RngCore;

use super::traits::{Maximizer, Maximum};
use super::util::{format_arguments, random_arguments, relative_spread, CONVERGENCE_TOLERANCE};
use crate::error::{Error, Result};
use crate::monitor::Monitor;
use crate::objective::{MonitoredObjective, Objective};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;

/// Nelder-Mead simplex maximizer.
#[derive(Clone, Debug, PartialEq)]
pub struct Simplex {
    max_iterations: usize,
}

impl Simplex {
    /// Defaults: `max_iterations = 100_000`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iteration cap after which the run fails with `NoConvergence`.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Iteration cap.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
        }
    }
}

/// `from + factor * (to - from)`
fn along(from: &[f64], to: &[f64], factor: f64) -> Vec<f64> {
    from.iter()
        .zip(to)
        .map(|(f, t)| f + factor * (t - f))
        .collect()
}

/// Indices of the largest and smallest values (first occurrence wins).
fn extremes(values: &[f64]) -> (usize, usize) {
    let mut high = 0;
    let mut low = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[high] {
            high = i;
        }
        if v < values[low] {
            low = i;
        }
    }
    (high, low)
}

impl Maximizer for Simplex {
    fn maximize(
        &self,
        function: &mut dyn Objective,
        monitor: &mut dyn Monitor,
        rng: &mut dyn RngCore,
    ) -> Result<Maximum> {
        let mut f = MonitoredObjective::new(function, monitor);
        let n = f.argument_count();

        let mut x: Vec<Vec<f64>> = (0..=n).map(|_| random_arguments(n, 1.0, rng)).collect();
        let mut fx = Vec::with_capacity(n + 1);
        for vertex in &x {
            fx.push(f.evaluate(vertex)?);
        }

        for iteration in 1..=self.max_iterations {
            f.begin_iteration(iteration)?;

            let (high, low) = extremes(&fx);

            let mut centroid = vec![0.0; n];
            for (i, vertex) in x.iter().enumerate() {
                if i == low {
                    continue;
                }
                for (c, v) in centroid.iter_mut().zip(vertex) {
                    *c += v;
                }
            }
            for c in &mut centroid {
                *c /= n as f64;
            }

            // Reflect the worst vertex through the centroid.
            let reflected = along(&centroid, &x[low], -REFLECTION);
            let f_reflected = f.evaluate(&reflected)?;

            if f_reflected > fx[high] {
                let expanded = along(&centroid, &reflected, EXPANSION);
                let f_expanded = f.evaluate(&expanded)?;
                if f_expanded > f_reflected {
                    x[low] = expanded;
                    fx[low] = f_expanded;
                } else {
                    x[low] = reflected;
                    fx[low] = f_reflected;
                }
            } else if (0..=n).any(|i| i != low && f_reflected > fx[i]) {
                x[low] = reflected;
                fx[low] = f_reflected;
            } else {
                if f_reflected > fx[low] {
                    x[low] = reflected;
                    fx[low] = f_reflected;
                }
                let contracted = along(&centroid, &x[low], CONTRACTION);
                let f_contracted = f.evaluate(&contracted)?;
                if f_contracted < fx[low] {
                    // Shrink every vertex halfway toward the best one.
                    let best = x[high].clone();
                    for i in 0..=n {
                        if i != high {
                            x[i] = along(&x[i], &best, 0.5);
                            fx[i] = f.evaluate(&x[i])?;
                        }
                    }
                } else {
                    x[low] = contracted;
                    fx[low] = f_contracted;
                }
            }

            let (high, low) = extremes(&fx);
            let spread = relative_spread(fx[high], fx[low]);
            f.write_line(&format!(
                "(iter = {iteration}) (fx[high] = {:e}) (convrg = {spread:e}) (x[high] = {{{}}})",
                fx[high],
                format_arguments(&x[high])
            ));

            if spread <= CONVERGENCE_TOLERANCE {
                tracing::debug!(iteration, value = fx[high], "simplex converged");
                return Ok(Maximum {
                    arguments: x.swap_remove(high),
                    value: fx[high],
                    iterations: iteration,
                });
            }
        }

        Err(Error::NoConvergence(format!(
            "simplex did not converge in {} iterations",
            self.max_iterations
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Paraboloid;
    use super::*;
    use crate::monitor::{CancelHandle, NullMonitor, ProgressMonitor};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn finds_peak_of_paraboloid() {
        for seed in [1, 2, 3] {
            let mut f = Paraboloid::new(&[0.3, -0.2], 1.0);
            let mut rng = StdRng::seed_from_u64(seed);
            let best = Simplex::new()
                .maximize(&mut f, &mut NullMonitor, &mut rng)
                .unwrap();
            assert!(best.value > 1.0 - 1e-3, "seed {seed}: {}", best.value);
            let distance = f.distance(&best.arguments);
            assert!(distance < 1e-3_f64.sqrt(), "seed {seed}: {:?}", best.arguments);
        }
    }

    #[test]
    fn reports_iterations_to_monitor() {
        let mut f = Paraboloid::new(&[0.1, 0.1, 0.1], 2.0);
        let mut rng = StdRng::seed_from_u64(4);
        let mut monitor = ProgressMonitor::new(CancelHandle::default());
        let best = Simplex::new()
            .maximize(&mut f, &mut monitor, &mut rng)
            .unwrap();
        assert_eq!(monitor.iterations(), best.iterations);
        assert!(monitor.evaluations() > best.iterations);
    }

    #[test]
    fn iteration_cap_yields_no_convergence() {
        let mut f = Paraboloid::new(&[0.3, -0.2], 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        let result = Simplex::new()
            .with_max_iterations(1)
            .maximize(&mut f, &mut NullMonitor, &mut rng);
        assert!(matches!(result, Err(Error::NoConvergence(_))));
    }

    #[test]
    fn flat_zero_function_converges() {
        struct Zero;
        impl Objective for Zero {
            fn argument_count(&self) -> usize {
                2
            }
            fn evaluate(&mut self, _: &[f64]) -> f64 {
                0.0
            }
        }
        let mut rng = StdRng::seed_from_u64(1);
        let best = Simplex::new()
            .maximize(&mut Zero, &mut NullMonitor, &mut rng)
            .unwrap();
        assert_eq!(best.value, 0.0);
        assert_eq!(best.iterations, 1);
    }

    #[test]
    fn along_interpolates() {
        assert_eq!(along(&[0.0, 0.0], &[2.0, 4.0], 0.5), vec![1.0, 2.0]);
        assert_eq!(along(&[1.0], &[3.0], -1.0), vec![-1.0]);
    }
}
