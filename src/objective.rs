//! Objective functions and the adapters maximizers wrap them in.

use crate::error::Result;
use crate::monitor::Monitor;

/// A real-valued function of a fixed number of arguments, to be maximized.
///
/// `evaluate` takes `&mut self` so implementations may keep scratch buffers
/// or random state between calls.
pub trait Objective {
    /// Length of the argument vector.
    fn argument_count(&self) -> usize;

    /// Score `arguments`. Larger is better.
    fn evaluate(&mut self, arguments: &[f64]) -> f64;
}

impl<F: Objective + ?Sized> Objective for &mut F {
    fn argument_count(&self) -> usize {
        (**self).argument_count()
    }

    fn evaluate(&mut self, arguments: &[f64]) -> f64 {
        (**self).evaluate(arguments)
    }
}

/// Copies the arguments into an owned buffer before delegating, so the
/// wrapped function never observes the caller's storage.
pub struct CloningObjective<F> {
    inner: F,
    buffer: Vec<f64>,
}

impl<F: Objective> CloningObjective<F> {
    /// Wrap `inner`, sizing the buffer from its argument count.
    pub fn new(inner: F) -> Self {
        let buffer = vec![0.0; inner.argument_count()];
        Self { inner, buffer }
    }

    /// The wrapped function.
    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: Objective> Objective for CloningObjective<F> {
    fn argument_count(&self) -> usize {
        self.inner.argument_count()
    }

    fn evaluate(&mut self, arguments: &[f64]) -> f64 {
        self.buffer.clear();
        self.buffer.extend_from_slice(arguments);
        self.inner.evaluate(&self.buffer)
    }
}

/// Objective wrapper that checks the monitor before every evaluation.
///
/// This is what the maximizers actually call: cancellation surfaces as
/// `Err(Error::Cancelled)` from [`evaluate`](Self::evaluate) and
/// [`begin_iteration`](Self::begin_iteration).
pub struct MonitoredObjective<'m, F> {
    function: CloningObjective<F>,
    monitor: &'m mut dyn Monitor,
}

impl<'m, F: Objective> MonitoredObjective<'m, F> {
    /// Wrap `function`, reporting to `monitor`.
    pub fn new(function: F, monitor: &'m mut dyn Monitor) -> Self {
        Self {
            function: CloningObjective::new(function),
            monitor,
        }
    }

    /// Length of the wrapped function's argument vector.
    pub fn argument_count(&self) -> usize {
        self.function.argument_count()
    }

    /// Score `arguments`, or `Err(Error::Cancelled)` if the monitor says stop.
    pub fn evaluate(&mut self, arguments: &[f64]) -> Result<f64> {
        self.monitor.continuing()?;
        self.monitor.evaluation_started();
        Ok(self.function.evaluate(arguments))
    }

    /// Announce iteration `iteration` (1-based).
    pub fn begin_iteration(&mut self, iteration: usize) -> Result<()> {
        self.monitor.continuing()?;
        self.monitor.iteration_started(iteration);
        Ok(())
    }

    /// Forward a progress line to the monitor and trace it.
    pub fn write_line(&mut self, text: &str) {
        tracing::trace!(target: "pursuit::maximize", "{text}");
        self.monitor.write_line(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::monitor::{CancelHandle, NullMonitor, ProgressMonitor};

    /// Scribbles over whatever it is handed; returns the first argument.
    struct Scribbler;

    impl Objective for Scribbler {
        fn argument_count(&self) -> usize {
            2
        }

        fn evaluate(&mut self, arguments: &[f64]) -> f64 {
            arguments[0]
        }
    }

    fn score_owned<F: Objective>(mut f: F, arguments: &[f64]) -> (usize, f64) {
        (f.argument_count(), f.evaluate(arguments))
    }

    #[test]
    fn blanket_impl_forwards_through_references() {
        let mut f = Scribbler;
        assert_eq!(score_owned(&mut f, &[4.0, 0.0]), (2, 4.0));
        let dynamic: &mut dyn Objective = &mut f;
        assert_eq!(score_owned(dynamic, &[5.0, 0.0]), (2, 5.0));
    }

    #[test]
    fn cloning_objective_delegates() {
        let mut f = CloningObjective::new(Scribbler);
        let args = [1.5, 2.5];
        assert_eq!(f.evaluate(&args), 1.5);
        assert_eq!(f.argument_count(), 2);
    }

    #[test]
    fn monitored_objective_counts_evaluations() {
        let mut monitor = ProgressMonitor::new(CancelHandle::default());
        {
            let mut f = MonitoredObjective::new(Scribbler, &mut monitor);
            f.begin_iteration(1).unwrap();
            f.evaluate(&[1.0, 0.0]).unwrap();
            f.evaluate(&[2.0, 0.0]).unwrap();
        }
        assert_eq!(monitor.iterations(), 1);
        assert_eq!(monitor.evaluations(), 2);
    }

    #[test]
    fn monitored_objective_surfaces_cancellation() {
        let handle = CancelHandle::default();
        let mut monitor = ProgressMonitor::new(handle.clone());
        let mut f = MonitoredObjective::new(Scribbler, &mut monitor);
        assert!(f.evaluate(&[0.0, 0.0]).is_ok());
        handle.cancel();
        assert!(matches!(f.evaluate(&[0.0, 0.0]), Err(Error::Cancelled)));
        assert!(matches!(f.begin_iteration(2), Err(Error::Cancelled)));
    }

    #[test]
    fn null_monitor_is_transparent() {
        let mut monitor = NullMonitor;
        let mut f = MonitoredObjective::new(Scribbler, &mut monitor);
        assert_eq!(f.evaluate(&[7.0, 0.0]).unwrap(), 7.0);
    }
}
