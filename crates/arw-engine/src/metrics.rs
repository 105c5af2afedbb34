//! Run metrics for one pipeline invocation.

/// Counters and timings collected during [`run`](crate::run).
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunMetrics {
    /// Configurations discovered by exploration.
    pub discovered: usize,
    /// Configurations in the recurrent class.
    pub recurrent: usize,
    /// Aggregated (from, to) transitions.
    pub transitions: usize,
    /// Relaxations performed, seed included.
    pub relaxations: u64,
    /// Topplings (sampled) or enumerated microstates (exact) over all
    /// relaxations.
    pub topplings: u64,
    /// Power iterations performed by the solver (0 for a direct solve).
    pub solver_iterations: usize,
    /// Wall-clock time of exploration.
    pub explore_us: u64,
    /// Wall-clock time of matrix assembly and solving.
    pub solve_us: u64,
}
