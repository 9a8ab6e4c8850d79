//! Simulated annealing.
//!
//! A single current point takes random steps whose length equals the current
//! temperature. Improving steps are always accepted; a worse step is accepted
//! with probability `exp(-(f_current - f_candidate) / T)`. The temperature
//! starts at 1 and after iteration `i` is multiplied by `1 - (i + 1) / N`,
//! so it reaches zero at the end of the schedule.

use rand::{Rng, RngCore};

use super::traits::{Maximizer, Maximum};
use super::util::{format_arguments, random_arguments, CONVERGENCE_TOLERANCE};
use crate::error::{Error, Result};
use crate::monitor::Monitor;
use crate::objective::{MonitoredObjective, Objective};

/// Simulated annealing maximizer.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedAnnealing {
    iterations: usize,
    converge_at_max_equals: bool,
    max_equals: usize,
}

impl SimulatedAnnealing {
    /// Defaults: `iterations = 100`, `converge_at_max_equals = true`, `max_equals = 20`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the cooling schedule.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Stop early once the best value has stalled for `max_equals` iterations.
    pub fn with_converge_at_max_equals(mut self, enabled: bool) -> Self {
        self.converge_at_max_equals = enabled;
        self
    }

    /// Number of stalled iterations that ends the run early.
    pub fn with_max_equals(mut self, max_equals: usize) -> Self {
        self.max_equals = max_equals;
        self
    }

    /// Length of the cooling schedule.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether a stalled run stops early.
    pub fn converge_at_max_equals(&self) -> bool {
        self.converge_at_max_equals
    }

    /// Stall length that stops the run.
    pub fn max_equals(&self) -> usize {
        self.max_equals
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self {
            iterations: 100,
            converge_at_max_equals: true,
            max_equals: 20,
        }
    }
}

/// Metropolis acceptance test for a candidate that did not improve.
fn accept_worse(current: f64, candidate: f64, temperature: f64, rng: &mut dyn RngCore) -> bool {
    if temperature <= 0.0 {
        return false;
    }
    let probability = (-(current - candidate) / temperature).exp();
    rng.random::<f64>() < probability
}

impl Maximizer for SimulatedAnnealing {
    fn maximize(
        &self,
        function: &mut dyn Objective,
        monitor: &mut dyn Monitor,
        rng: &mut dyn RngCore,
    ) -> Result<Maximum> {
        let mut f = MonitoredObjective::new(function, monitor);
        let n = f.argument_count();

        let mut x = random_arguments(n, 1.0, rng);
        let mut fx = f.evaluate(&x)?;
        let mut x_best = x.clone();
        let mut fx_best = fx;

        let mut temperature = 1.0;
        let mut delta = f64::MAX;
        let mut equals = 0;
        let mut performed = 0;

        for iteration in 1..=self.iterations {
            f.begin_iteration(iteration)?;
            performed = iteration;

            let step = random_arguments(n, temperature, rng);
            let candidate: Vec<f64> = x
                .iter()
                .zip(&step)
                .map(|(a, s)| (a + s).clamp(-1.0, 1.0))
                .collect();
            let f_candidate = f.evaluate(&candidate)?;

            let previous_best = fx_best;
            if f_candidate > fx_best {
                fx_best = f_candidate;
                x_best.clone_from(&candidate);
            }
            if f_candidate > fx || accept_worse(fx, f_candidate, temperature, rng) {
                x = candidate;
                fx = f_candidate;
            }
            delta = fx_best - previous_best;

            f.write_line(&format!(
                "(iter = {iteration}) (fx = {fx:e}) (fx_best = {fx_best:e}) (x_best = {{{}}})",
                format_arguments(&x_best)
            ));

            if self.converge_at_max_equals {
                if delta <= CONVERGENCE_TOLERANCE {
                    equals += 1;
                } else {
                    equals = 0;
                }
                if equals >= self.max_equals {
                    tracing::trace!(iteration, "annealing stalled, stopping early");
                    break;
                }
            }

            temperature *= 1.0 - (iteration + 1) as f64 / self.iterations as f64;
        }

        if delta > CONVERGENCE_TOLERANCE {
            return Err(Error::NoConvergence(format!(
                "annealing still improving by {delta:e} after {performed} iterations"
            )));
        }

        Ok(Maximum {
            arguments: x_best,
            value: fx_best,
            iterations: performed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Paraboloid;
    use super::*;
    use crate::monitor::NullMonitor;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn defaults() {
        let sa = SimulatedAnnealing::default();
        assert_eq!(sa.iterations(), 100);
        assert!(sa.converge_at_max_equals());
        assert_eq!(sa.max_equals(), 20);
    }

    #[test]
    fn long_schedule_lands_near_peak() {
        let mut f = Paraboloid::new(&[0.3, -0.2], 5.0);
        let mut rng = StdRng::seed_from_u64(21);
        let best = SimulatedAnnealing::new()
            .with_iterations(5000)
            .with_converge_at_max_equals(false)
            .maximize(&mut f, &mut NullMonitor, &mut rng)
            .unwrap();
        assert!(best.value > 5.0 - 1e-3, "value = {}", best.value);
        assert_eq!(best.iterations, 5000);
    }

    #[test]
    fn best_value_matches_best_arguments() {
        let mut f = Paraboloid::new(&[0.5, 0.5, 0.0], 3.0);
        let mut rng = StdRng::seed_from_u64(8);
        let best = SimulatedAnnealing::new()
            .maximize(&mut f, &mut NullMonitor, &mut rng)
            .unwrap();
        assert!((f.evaluate(&best.arguments) - best.value).abs() < 1e-12);
        assert!(best.arguments.iter().all(|v| v.abs() <= 1.0));
    }

    #[test]
    fn early_stop_on_stall() {
        struct Flat;
        impl Objective for Flat {
            fn argument_count(&self) -> usize {
                2
            }
            fn evaluate(&mut self, _: &[f64]) -> f64 {
                1.0
            }
        }
        let mut rng = StdRng::seed_from_u64(2);
        let best = SimulatedAnnealing::new()
            .with_max_equals(5)
            .maximize(&mut Flat, &mut NullMonitor, &mut rng)
            .unwrap();
        assert_eq!(best.iterations, 5);
    }

    #[test]
    fn still_improving_at_end_fails() {
        struct Rising(f64);
        impl Objective for Rising {
            fn argument_count(&self) -> usize {
                2
            }
            fn evaluate(&mut self, _: &[f64]) -> f64 {
                self.0 += 1.0;
                self.0
            }
        }
        let mut rng = StdRng::seed_from_u64(4);
        let result =
            SimulatedAnnealing::new().maximize(&mut Rising(0.0), &mut NullMonitor, &mut rng);
        assert!(matches!(result, Err(Error::NoConvergence(_))));
    }

    #[test]
    fn zero_temperature_rejects_worse() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(!accept_worse(1.0, 0.0, 0.0, &mut rng));
        assert!(!accept_worse(1.0, 0.0, -0.5, &mut rng));
    }

    #[test]
    fn high_temperature_usually_accepts_small_losses() {
        let mut rng = StdRng::seed_from_u64(0);
        let accepted = (0..1000)
            .filter(|_| accept_worse(1.0, 0.999, 10.0, &mut rng))
            .count();
        assert!(accepted > 990);
    }
}
