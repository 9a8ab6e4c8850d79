//! Gradient ascent with finite-difference gradients.
//!
//! Several independent solutions climb in parallel, each with its own
//! learning rate. Gradients are one-sided differences with step `h`; steps
//! that would leave the unit box shrink the learning rate, and a solution that
//! cannot stay inside the box (or reaches a negative score) is restarted from
//! a fresh random point.

use rand::RngCore;

use super::traits::{Maximizer, Maximum};
use super::util::{format_arguments, random_arguments};
use crate::error::{Error, Result};
use crate::monitor::Monitor;
use crate::objective::{MonitoredObjective, Objective};

/// Maximum number of learning-rate halvings before a solution restarts.
const MAX_HALVINGS: usize = 1000;

/// Gradient ascent maximizer.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientAscent {
    max_iterations: usize,
    number_of_solutions: usize,
    converge_at_max_equals: bool,
    max_equals: usize,
    learning_rate: f64,
    precision: f64,
    step: f64,
}

impl GradientAscent {
    /// Defaults: 100 iterations, 5 solutions, stall detection on with
    /// `max_equals = 20`, learning rate 1e-6, precision 1e-4, step 1e-4.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_number_of_solutions(mut self, solutions: usize) -> Self {
        self.number_of_solutions = solutions;
        self
    }

    /// Stop once the best value has not improved for `max_equals` iterations.
    pub fn with_converge_at_max_equals(mut self, enabled: bool) -> Self {
        self.converge_at_max_equals = enabled;
        self
    }

    pub fn with_max_equals(mut self, max_equals: usize) -> Self {
        self.max_equals = max_equals;
        self
    }

    /// Initial learning rate given to every solution.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// A solution has converged once a step changes its score by less than this.
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    /// Finite-difference step.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn number_of_solutions(&self) -> usize {
        self.number_of_solutions
    }

    pub fn converge_at_max_equals(&self) -> bool {
        self.converge_at_max_equals
    }

    pub fn max_equals(&self) -> usize {
        self.max_equals
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }
}

impl Default for GradientAscent {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            number_of_solutions: 5,
            converge_at_max_equals: true,
            max_equals: 20,
            learning_rate: 1e-6,
            precision: 1e-4,
            step: 1e-4,
        }
    }
}

#[derive(Clone, Debug)]
struct Solution {
    x: Vec<f64>,
    fx: f64,
    gradient: Vec<f64>,
    learning_rate: f64,
    converged: bool,
}

impl GradientAscent {
    fn fresh<F: Objective>(
        &self,
        n: usize,
        f: &mut MonitoredObjective<'_, F>,
        rng: &mut dyn RngCore,
    ) -> Result<Solution> {
        let x = random_arguments(n, 1.0, rng);
        let fx = f.evaluate(&x)?;
        Ok(Solution {
            x,
            fx,
            gradient: vec![0.0; n],
            learning_rate: self.learning_rate,
            converged: false,
        })
    }

    /// Replace `solution` by a fresh random start, keeping its convergence flag.
    fn restart<F: Objective>(
        &self,
        solution: &mut Solution,
        f: &mut MonitoredObjective<'_, F>,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        tracing::warn!(fx = solution.fx, "restarting gradient ascent solution");
        let converged = solution.converged;
        *solution = self.fresh(solution.x.len(), f, rng)?;
        solution.converged = converged;
        Ok(())
    }

    fn estimate_gradient<F: Objective>(
        &self,
        solution: &mut Solution,
        f: &mut MonitoredObjective<'_, F>,
    ) -> Result<()> {
        let h = self.step;
        let mut probe = solution.x.clone();
        for j in 0..probe.len() {
            let origin = probe[j];
            probe[j] = origin + h;
            let forward = f.evaluate(&probe)?;
            solution.gradient[j] = if forward < solution.fx || probe[j].abs() > 1.0 {
                probe[j] = origin - h;
                let backward = f.evaluate(&probe)?;
                (solution.fx - backward) / h
            } else {
                (forward - solution.fx) / h
            };
            probe[j] = origin;
        }
        Ok(())
    }

    fn advance<F: Objective>(
        &self,
        solution: &mut Solution,
        f: &mut MonitoredObjective<'_, F>,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let mut x = solution.x.clone();
        for i in 0..x.len() {
            let mut next = x[i] + solution.gradient[i] * solution.learning_rate;
            let mut halvings = 0;
            while next.abs() > 1.0 && halvings < MAX_HALVINGS {
                solution.learning_rate /= 2.0;
                next = x[i] + solution.gradient[i] * solution.learning_rate;
                halvings += 1;
            }
            if next.abs() > 1.0 {
                return self.restart(solution, f, rng);
            }
            x[i] = next;
        }

        let fx = f.evaluate(&x)?;
        if (fx - solution.fx).abs() < self.precision {
            solution.converged = true;
        }
        if fx < 0.0 {
            return self.restart(solution, f, rng);
        }
        if fx < solution.fx {
            solution.learning_rate /= 2.0;
        }
        solution.x = x;
        solution.fx = fx;
        Ok(())
    }
}

fn fittest(solutions: &[Solution]) -> Option<&Solution> {
    solutions.iter().max_by(|a, b| a.fx.total_cmp(&b.fx))
}

impl Maximizer for GradientAscent {
    fn maximize(
        &self,
        function: &mut dyn Objective,
        monitor: &mut dyn Monitor,
        rng: &mut dyn RngCore,
    ) -> Result<Maximum> {
        let mut f = MonitoredObjective::new(function, monitor);
        let n = f.argument_count();

        let mut solutions = Vec::with_capacity(self.number_of_solutions);
        for _ in 0..self.number_of_solutions {
            solutions.push(self.fresh(n, &mut f, rng)?);
        }
        let mut best = match solutions.first() {
            Some(s) => s.clone(),
            None => return Err(Error::NoConvergence("no solutions requested".into())),
        };

        let mut equals = 0;
        let mut performed = 0;
        for iteration in 1..=self.max_iterations {
            f.begin_iteration(iteration)?;
            performed = iteration;

            for solution in solutions.iter_mut().filter(|s| !s.converged) {
                self.estimate_gradient(solution, &mut f)?;
            }
            for solution in solutions.iter_mut().filter(|s| !s.converged) {
                self.advance(solution, &mut f, rng)?;
            }

            if let Some(candidate) = fittest(&solutions) {
                if candidate.fx > best.fx {
                    best = candidate.clone();
                    equals = 0;
                } else {
                    equals += 1;
                }
            }

            f.write_line(&format!(
                "(iter = {iteration}) (fx = {:e}) (x = {{{}}}) (converged = {})",
                best.fx,
                format_arguments(&best.x),
                solutions.iter().filter(|s| s.converged).count()
            ));

            if solutions.iter().all(|s| s.converged) {
                break;
            }
            if self.converge_at_max_equals && equals >= self.max_equals {
                tracing::trace!(iteration, "gradient ascent stalled, stopping early");
                break;
            }
        }

        if !solutions.iter().any(|s| s.converged) {
            return Err(Error::NoConvergence(format!(
                "none of {} solutions converged in {performed} iterations",
                solutions.len()
            )));
        }

        Ok(Maximum {
            arguments: best.x,
            value: best.fx,
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

    fn tuned() -> GradientAscent {
        GradientAscent::new()
            .with_learning_rate(0.05)
            .with_precision(1e-9)
            .with_max_iterations(5000)
            .with_number_of_solutions(3)
    }

    #[test]
    fn defaults() {
        let gd = GradientAscent::default();
        assert_eq!(gd.max_iterations(), 100);
        assert_eq!(gd.number_of_solutions(), 5);
        assert!(gd.converge_at_max_equals());
        assert_eq!(gd.max_equals(), 20);
        assert_eq!(gd.learning_rate(), 1e-6);
        assert_eq!(gd.precision(), 1e-4);
    }

    #[test]
    fn climbs_to_peak() {
        let mut f = Paraboloid::new(&[0.3, -0.2], 5.0);
        let mut rng = StdRng::seed_from_u64(13);
        let best = tuned()
            .maximize(&mut f, &mut NullMonitor, &mut rng)
            .unwrap();
        assert!(f.distance(&best.arguments) < 1e-3, "{:?}", best.arguments);
        assert!(best.value > 5.0 - 1e-6);
    }

    #[test]
    fn tiny_learning_rate_converges_in_place() {
        let mut f = Paraboloid::new(&[0.3, -0.2], 5.0);
        let mut rng = StdRng::seed_from_u64(13);
        let best = GradientAscent::new()
            .maximize(&mut f, &mut NullMonitor, &mut rng)
            .unwrap();
        assert_eq!(best.iterations, 1);
    }

    #[test]
    fn no_converged_solution_fails() {
        let mut f = Paraboloid::new(&[0.3, -0.2], 5.0);
        let mut rng = StdRng::seed_from_u64(13);
        let result = tuned()
            .with_max_iterations(2)
            .maximize(&mut f, &mut NullMonitor, &mut rng);
        assert!(matches!(result, Err(Error::NoConvergence(_))));
    }

    #[test]
    fn zero_solutions_fails() {
        let mut f = Paraboloid::new(&[0.3], 5.0);
        let mut rng = StdRng::seed_from_u64(1);
        let result = GradientAscent::new()
            .with_number_of_solutions(0)
            .maximize(&mut f, &mut NullMonitor, &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn backward_difference_has_correct_sign() {
        // Slope -1 everywhere: the forward probe always loses, so the backward
        // difference is used and must still report -1.
        struct Ramp;
        impl Objective for Ramp {
            fn argument_count(&self) -> usize {
                1
            }
            fn evaluate(&mut self, x: &[f64]) -> f64 {
                10.0 - x[0]
            }
        }
        let gd = GradientAscent::new();
        let mut ramp = Ramp;
        let mut monitor = NullMonitor;
        let mut f = MonitoredObjective::new(&mut ramp, &mut monitor);
        let mut solution = Solution {
            x: vec![0.5],
            fx: 9.5,
            gradient: vec![0.0],
            learning_rate: 1e-6,
            converged: false,
        };
        gd.estimate_gradient(&mut solution, &mut f).unwrap();
        assert!((solution.gradient[0] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn negative_score_restarts_solution() {
        struct Cliff;
        impl Objective for Cliff {
            fn argument_count(&self) -> usize {
                1
            }
            fn evaluate(&mut self, x: &[f64]) -> f64 {
                if x[0] > 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
        }
        let gd = GradientAscent::new();
        let mut cliff = Cliff;
        let mut monitor = NullMonitor;
        let mut f = MonitoredObjective::new(&mut cliff, &mut monitor);
        let mut rng = StdRng::seed_from_u64(6);
        let mut solution = Solution {
            x: vec![0.4],
            fx: 1.0,
            gradient: vec![1.0],
            learning_rate: 0.5,
            converged: false,
        };
        gd.advance(&mut solution, &mut f, &mut rng).unwrap();

        assert_ne!(solution.x, vec![0.9]);
        assert!(solution.x[0].abs() <= 1.0);
        assert_eq!(solution.fx, if solution.x[0] > 0.5 { -1.0 } else { 1.0 });
        assert_eq!(solution.learning_rate, gd.learning_rate());
        assert_eq!(solution.gradient, vec![0.0]);
    }

    #[test]
    fn runaway_gradient_restarts_after_halvings() {
        let gd = GradientAscent::new();
        let mut paraboloid = Paraboloid::new(&[0.3], 5.0);
        let mut monitor = NullMonitor;
        let mut f = MonitoredObjective::new(&mut paraboloid, &mut monitor);
        let mut rng = StdRng::seed_from_u64(7);
        let mut solution = Solution {
            x: vec![0.0],
            fx: 5.0 - 0.09,
            gradient: vec![f64::MAX],
            learning_rate: 0.5,
            converged: true,
        };
        gd.advance(&mut solution, &mut f, &mut rng).unwrap();

        assert!(solution.converged);
        assert!(solution.x[0].abs() <= 1.0);
        assert_eq!(solution.gradient, vec![0.0]);
        assert_eq!(solution.learning_rate, gd.learning_rate());
    }
}
