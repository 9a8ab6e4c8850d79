//! Progress reporting and cooperative cancellation.
//!
//! A [`Monitor`] is the only channel between a running optimization and the
//! outside world. Maximizers call [`Monitor::continuing`] at the top of every
//! iteration and before every function evaluation; returning
//! [`Error::Cancelled`] aborts the run.
//!
//! Two implementations ship with the crate:
//!
//! - [`NullMonitor`]: reports nothing and never cancels.
//! - [`ProgressMonitor`]: counts iterations and evaluations, forwards
//!   [`Progress`] events over an `mpsc` channel, and honours a
//!   [`CancelHandle`] that can be triggered from another thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Observer of a long-running computation.
pub trait Monitor {
    /// Return `Err(Error::Cancelled)` to stop the computation.
    fn continuing(&mut self) -> Result<()>;

    /// A new iteration begins. The first iteration is 1.
    fn iteration_started(&mut self, iteration: usize);

    /// The objective function is about to be evaluated.
    fn evaluation_started(&mut self);

    /// A human-readable progress line.
    fn write_line(&mut self, text: &str);
}

/// A monitor that ignores everything and never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn continuing(&mut self) -> Result<()> {
        Ok(())
    }

    fn iteration_started(&mut self, _iteration: usize) {}

    fn evaluation_started(&mut self) {}

    fn write_line(&mut self, _text: &str) {}
}

/// Shared flag used to request cancellation from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Request cancellation. Takes effect at the next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Event forwarded by a [`ProgressMonitor`].
#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    /// Iteration `n` started.
    Iteration(usize),
    /// Total evaluations so far.
    Evaluations(usize),
    /// Log line from the algorithm.
    Line(String),
}

/// Counting monitor that can be cancelled from another thread.
#[derive(Debug)]
pub struct ProgressMonitor {
    cancel: CancelHandle,
    iterations: usize,
    evaluations: usize,
    sender: Option<Sender<Progress>>,
}

impl ProgressMonitor {
    /// A monitor that only counts and honours `cancel`.
    pub fn new(cancel: CancelHandle) -> Self {
        Self {
            cancel,
            iterations: 0,
            evaluations: 0,
            sender: None,
        }
    }

    /// A monitor that also forwards every event to the returned receiver.
    pub fn with_channel(cancel: CancelHandle) -> (Self, Receiver<Progress>) {
        let (tx, rx) = mpsc::channel();
        let mut monitor = Self::new(cancel);
        monitor.sender = Some(tx);
        (monitor, rx)
    }

    /// Most recent iteration number.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of evaluations observed.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn send(&mut self, event: Progress) {
        if let Some(tx) = &self.sender {
            if tx.send(event).is_err() {
                // Receiver hung up; keep counting without forwarding.
                self.sender = None;
            }
        }
    }
}

impl Monitor for ProgressMonitor {
    fn continuing(&mut self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    fn iteration_started(&mut self, iteration: usize) {
        self.iterations = iteration;
        self.send(Progress::Iteration(iteration));
    }

    fn evaluation_started(&mut self) {
        self.evaluations += 1;
        let evaluations = self.evaluations;
        self.send(Progress::Evaluations(evaluations));
    }

    fn write_line(&mut self, text: &str) {
        self.send(Progress::Line(text.to_owned()));
    }
}
