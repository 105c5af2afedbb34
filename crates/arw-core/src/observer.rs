//! Passive progress reporting.
//!
//! Long-running stages (exploration, iterative solving) report through a
//! [`ProgressObserver`]. Notifications are fire-and-forget: `notify`
//! returns nothing, receives events by value, and has no access to
//! pipeline state, so an observer can neither fail a run nor steer it.

/// A progress event emitted by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Progress {
    /// State-space exploration is under way.
    Exploring {
        /// Configurations discovered so far.
        discovered: usize,
        /// Configurations discovered but not yet processed.
        frontier: usize,
    },
    /// Iterative solve is under way.
    Solving {
        /// Iterations performed so far.
        iteration: usize,
        /// Infinity-norm change at the latest iteration.
        residual: f64,
    },
}

/// Receiver of [`Progress`] events.
///
/// Implementations must be cheap and non-blocking; they are called on
/// the pipeline's own thread between units of work.
pub trait ProgressObserver {
    /// Receive one progress event.
    fn notify(&mut self, progress: Progress);
}

/// Observer that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn notify(&mut self, _progress: Progress) {}
}

/// Observer that forwards events to the `log` facade at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn notify(&mut self, progress: Progress) {
        match progress {
            Progress::Exploring {
                discovered,
                frontier,
            } => log::debug!("exploring: {discovered} discovered, {frontier} pending"),
            Progress::Solving {
                iteration,
                residual,
            } => log::debug!("solving: iteration {iteration}, residual {residual:e}"),
        }
    }
}

impl<F: FnMut(Progress)> ProgressObserver for F {
    fn notify(&mut self, progress: Progress) {
        self(progress)
    }
}
