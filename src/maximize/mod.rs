//! Derivative-free function maximizers.
//!
//! All four algorithms share the [`Maximizer`] contract: they take a mutable
//! [`Objective`], a [`Monitor`] for progress and cancellation, and a random
//! source, and return a [`Maximum`]. None of them guarantees a global
//! optimum; they are heuristics tuned for the smooth, low-dimensional
//! objectives produced by projection indices.
//!
//! | Algorithm | Type | Fails with `NoConvergence` when |
//! |---|---|---|
//! | Nelder-Mead simplex | [`Simplex`] | the iteration cap is hit |
//! | Simulated annealing | [`SimulatedAnnealing`] | the last iteration still improved the best |
//! | Genetic algorithm | [`GeneticAlgorithm`] | the population is empty |
//! | Gradient ascent | [`GradientAscent`] | no solution converged |
//!
//! The [`Algorithm`] enum names an algorithm (for menus, config files and
//! provenance records); [`AlgorithmParameters`] carries one configured
//! instance. The free function [`maximize`] dispatches between them.
//!
//! ```rust
//! use pursuit::maximize::{maximize, Algorithm};
//! use pursuit::monitor::NullMonitor;
//! use pursuit::objective::Objective;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! struct Bump;
//! impl Objective for Bump {
//!     fn argument_count(&self) -> usize { 2 }
//!     fn evaluate(&mut self, x: &[f64]) -> f64 {
//!         1.0 - (x[0] - 0.2).powi(2) - (x[1] + 0.1).powi(2)
//!     }
//! }
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let best = maximize(Algorithm::Simplex, None, &mut Bump, &mut NullMonitor, &mut rng).unwrap();
//! assert!(best.value > 0.99);
//! ```

pub mod annealing;
pub mod genetic;
pub mod gradient;
pub mod simplex;
mod traits;
pub mod util;

use std::fmt;
use std::str::FromStr;

use rand::RngCore;

use crate::error::{Error, Result};
use crate::monitor::Monitor;
use crate::objective::Objective;

pub use annealing::SimulatedAnnealing;
pub use genetic::GeneticAlgorithm;
pub use gradient::GradientAscent;
pub use simplex::Simplex;
pub use traits::{Maximizer, Maximum};

/// The available maximization algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    Simplex,
    SimulatedAnnealing,
    Genetic,
    GradientAscent,
}

impl Algorithm {
    /// Every algorithm, in menu order.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Simplex,
        Algorithm::SimulatedAnnealing,
        Algorithm::Genetic,
        Algorithm::GradientAscent,
    ];

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Simplex => "Simplex",
            Algorithm::SimulatedAnnealing => "Simulated annealing",
            Algorithm::Genetic => "Genetic algorithm",
            Algorithm::GradientAscent => "Gradient ascent",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(Error::InvalidParameter {
                name: "algorithm",
                message: "unknown algorithm name",
            })
    }
}

/// A configured maximizer, one variant per [`Algorithm`].
#[derive(Clone, Debug, PartialEq)]
pub enum AlgorithmParameters {
    Simplex(Simplex),
    SimulatedAnnealing(SimulatedAnnealing),
    Genetic(GeneticAlgorithm),
    GradientAscent(GradientAscent),
}

impl AlgorithmParameters {
    /// Default parameters for `algorithm`.
    pub fn defaults(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Simplex => Self::Simplex(Simplex::default()),
            Algorithm::SimulatedAnnealing => {
                Self::SimulatedAnnealing(SimulatedAnnealing::default())
            }
            Algorithm::Genetic => Self::Genetic(GeneticAlgorithm::default()),
            Algorithm::GradientAscent => Self::GradientAscent(GradientAscent::default()),
        }
    }

    /// The algorithm these parameters configure.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Simplex(_) => Algorithm::Simplex,
            Self::SimulatedAnnealing(_) => Algorithm::SimulatedAnnealing,
            Self::Genetic(_) => Algorithm::Genetic,
            Self::GradientAscent(_) => Algorithm::GradientAscent,
        }
    }

    fn as_maximizer(&self) -> &dyn Maximizer {
        match self {
            Self::Simplex(m) => m,
            Self::SimulatedAnnealing(m) => m,
            Self::Genetic(m) => m,
            Self::GradientAscent(m) => m,
        }
    }
}

impl From<Simplex> for AlgorithmParameters {
    fn from(m: Simplex) -> Self {
        Self::Simplex(m)
    }
}

impl From<SimulatedAnnealing> for AlgorithmParameters {
    fn from(m: SimulatedAnnealing) -> Self {
        Self::SimulatedAnnealing(m)
    }
}

impl From<GeneticAlgorithm> for AlgorithmParameters {
    fn from(m: GeneticAlgorithm) -> Self {
        Self::Genetic(m)
    }
}

impl From<GradientAscent> for AlgorithmParameters {
    fn from(m: GradientAscent) -> Self {
        Self::GradientAscent(m)
    }
}

/// Maximize `function` with `algorithm`.
///
/// `parameters` of `None` selects the algorithm's defaults.
///
/// # Panics
///
/// If `parameters` configure a different algorithm than `algorithm`.
pub fn maximize(
    algorithm: Algorithm,
    parameters: Option<&AlgorithmParameters>,
    function: &mut dyn Objective,
    monitor: &mut dyn Monitor,
    rng: &mut dyn RngCore,
) -> Result<Maximum> {
    let defaults;
    let parameters = match parameters {
        Some(p) => {
            assert_eq!(
                p.algorithm(),
                algorithm,
                "parameters for {} passed to {}",
                p.algorithm(),
                algorithm
            );
            p
        }
        None => {
            defaults = AlgorithmParameters::defaults(algorithm);
            &defaults
        }
    };

    tracing::debug!(
        %algorithm,
        arguments = function.argument_count(),
        "maximizing"
    );
    let result = parameters.as_maximizer().maximize(function, monitor, rng);
    match &result {
        Ok(m) => tracing::debug!(
            %algorithm,
            value = m.value,
            iterations = m.iterations,
            "maximum found"
        ),
        Err(e) => tracing::debug!(%algorithm, error = %e, "maximization failed"),
    }
    result
}


#[cfg(test)]
mod tests {
    use super::testing::{CancelAfter, Paraboloid};
    use super::*;
    use crate::monitor::NullMonitor;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn names_round_trip() {
        for algorithm in Algorithm::ALL {
            let parsed: Algorithm = algorithm.to_string().parse().unwrap();
            assert_eq!(parsed, algorithm);
        }
        assert_eq!("gradient ascent".parse::<Algorithm>().unwrap(), Algorithm::GradientAscent);
        assert!("hill climbing".parse::<Algorithm>().is_err());
    }

    #[test]
    fn defaults_match_algorithm() {
        for algorithm in Algorithm::ALL {
            assert_eq!(AlgorithmParameters::defaults(algorithm).algorithm(), algorithm);
        }
    }

    #[test]
    fn dispatch_uses_explicit_parameters() {
        let mut f = Paraboloid::new(&[0.6, -0.8], 1.0);
        let mut rng = StdRng::seed_from_u64(3);
        let params = AlgorithmParameters::from(GeneticAlgorithm::new().with_population_size(200));
        let best = maximize(
            Algorithm::Genetic,
            Some(&params),
            &mut f,
            &mut NullMonitor,
            &mut rng,
        )
        .unwrap();
        assert!(best.value > 1.0 - 1e-3, "value = {}", best.value);
    }

    #[test]
    #[should_panic(expected = "parameters for")]
    fn mismatched_parameters_panic() {
        let mut f = Paraboloid::new(&[0.0], 1.0);
        let mut rng = StdRng::seed_from_u64(0);
        let params = AlgorithmParameters::defaults(Algorithm::Genetic);
        let _ = maximize(
            Algorithm::Simplex,
            Some(&params),
            &mut f,
            &mut NullMonitor,
            &mut rng,
        );
    }

    #[test]
    fn every_algorithm_honours_cancellation() {
        for algorithm in Algorithm::ALL {
            for budget in [0, 1, 7] {
                let mut f = Paraboloid::new(&[0.1, 0.2, 0.3], 5.0);
                let mut rng = StdRng::seed_from_u64(11);
                let result = maximize(algorithm, None, &mut f, &mut CancelAfter(budget), &mut rng);
                assert!(
                    matches!(result, Err(Error::Cancelled)),
                    "{algorithm} with budget {budget} returned {result:?}"
                );
            }
        }
    }
}
