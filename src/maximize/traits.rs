use rand::RngCore;

use crate::error::Result;
use crate::monitor::Monitor;
use crate::objective::Objective;

/// Result of a successful maximization.
#[derive(Clone, Debug, PartialEq)]
pub struct Maximum {
    /// Arguments at which the best value was observed.
    pub arguments: Vec<f64>,
    /// Function value at `arguments`.
    pub value: f64,
    /// Number of iterations (or generations) performed.
    pub iterations: usize,
}

/// Common interface for the derivative-free maximizers.
pub trait Maximizer {
    /// Search for arguments at which `function` is (heuristically) maximal.
    ///
    /// Fails with `Error::NoConvergence` when the algorithm gives up and with
    /// `Error::Cancelled` when `monitor` asks to stop.
    fn maximize(
        &self,
        function: &mut dyn Objective,
        monitor: &mut dyn Monitor,
        rng: &mut dyn RngCore,
    ) -> Result<Maximum>;
}
