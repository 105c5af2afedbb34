//! Error types for the ARW stationary-distribution pipeline.
//!
//! One enum per pipeline stage: graph construction, configuration
//! encoding, relaxation, matrix assembly, and solving. Every failure is
//! fatal to the current run; there is no degraded-result mode, so each
//! variant carries enough context (configuration, iteration count,
//! residual) to diagnose the failure after the fact.

use std::error::Error;
use std::fmt;

use crate::id::VertexId;

/// The input graph is malformed (`MalformedGraphError`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphError {
    /// The graph has no vertices.
    Empty,
    /// No vertex was designated as the sink.
    MissingSink,
    /// More than one vertex was designated as the sink.
    DuplicateSink {
        /// The sink designated first.
        first: VertexId,
        /// The conflicting second designation.
        second: VertexId,
    },
    /// An edge or sink refers to a vertex outside `0..vertex_count`.
    VertexOutOfRange {
        /// The offending vertex.
        vertex: VertexId,
        /// Number of vertices in the graph.
        vertex_count: u32,
    },
    /// An edge connects a vertex to itself.
    SelfLoop {
        /// The vertex carrying the loop.
        vertex: VertexId,
    },
    /// An edge was declared with weight zero.
    ZeroWeight {
        /// Tail of the edge.
        from: VertexId,
        /// Head of the edge.
        to: VertexId,
    },
    /// The sink cannot be reached from this vertex, so particles placed
    /// there would never be absorbed (covers disconnected graphs).
    SinkUnreachable {
        /// First vertex (in id order) with no path to the sink.
        vertex: VertexId,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed graph: ")?;
        match self {
            Self::Empty => write!(f, "graph has no vertices"),
            Self::MissingSink => write!(f, "no sink vertex designated"),
            Self::DuplicateSink { first, second } => {
                write!(f, "sink designated twice ({first} and {second})")
            }
            Self::VertexOutOfRange {
                vertex,
                vertex_count,
            } => write!(f, "vertex {vertex} out of range [0, {vertex_count})"),
            Self::SelfLoop { vertex } => write!(f, "self-loop at vertex {vertex}"),
            Self::ZeroWeight { from, to } => write!(f, "edge {from} -> {to} has zero weight"),
            Self::SinkUnreachable { vertex } => {
                write!(f, "sink is unreachable from vertex {vertex}")
            }
        }
    }
}

impl Error for GraphError {}

/// A particle-count mapping cannot be encoded (`InvalidConfigurationError`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A vertex was given a negative particle count.
    NegativeCount {
        /// The vertex.
        vertex: VertexId,
        /// The rejected count.
        count: i64,
    },
    /// A count references a vertex the graph does not have.
    UnknownVertex {
        /// The vertex.
        vertex: VertexId,
    },
    /// A count was given for the sink, which never holds particles.
    SinkVertex {
        /// The sink vertex.
        vertex: VertexId,
    },
    /// The same vertex appears twice in the mapping.
    DuplicateVertex {
        /// The vertex.
        vertex: VertexId,
    },
    /// A rank-indexed count vector has the wrong length.
    LengthMismatch {
        /// Number of non-sink vertices in the graph.
        expected: usize,
        /// Length supplied.
        found: usize,
    },
    /// A count does not fit the internal representation.
    CountOverflow {
        /// The vertex.
        vertex: VertexId,
        /// The rejected count.
        count: i64,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: ")?;
        match self {
            Self::NegativeCount { vertex, count } => {
                write!(f, "vertex {vertex} has negative count {count}")
            }
            Self::UnknownVertex { vertex } => write!(f, "unknown vertex {vertex}"),
            Self::SinkVertex { vertex } => write!(f, "sink vertex {vertex} cannot hold particles"),
            Self::DuplicateVertex { vertex } => write!(f, "vertex {vertex} given twice"),
            Self::LengthMismatch { expected, found } => {
                write!(f, "expected {expected} counts, found {found}")
            }
            Self::CountOverflow { vertex, count } => {
                write!(f, "count {count} at vertex {vertex} overflows u32")
            }
        }
    }
}

impl Error for ConfigurationError {}

/// Failures of the toppling/relaxation engine.
#[derive(Clone, Debug, PartialEq)]
pub enum RelaxationError {
    /// Relaxation did not reach a stable configuration within its
    /// toppling bound, or provably never can (`RelaxationDivergedError`).
    Diverged {
        /// The configuration relaxation started from.
        start: String,
        /// Injection vertex, if the relaxation followed an injection.
        vertex: Option<VertexId>,
        /// Topplings (or microstates, in exact mode) spent before giving up.
        topplings: u64,
    },
    /// Exact enumeration of the microscopic chain outgrew its budget.
    /// Says nothing about termination; sampling or a larger budget may
    /// still succeed.
    EnumerationLimit {
        /// The configuration relaxation started from.
        start: String,
        /// Injection vertex, if the relaxation followed an injection.
        vertex: Option<VertexId>,
        /// The microstate budget that was exceeded.
        limit: u64,
    },
    /// A sleep probability is outside `[0, 1]` or not finite.
    InvalidSleepProbability {
        /// Non-sink rank of the offending vertex.
        rank: usize,
        /// The rejected value.
        value: f64,
    },
    /// Sleep probabilities do not cover exactly the non-sink vertices.
    SleepLengthMismatch {
        /// Number of non-sink vertices.
        expected: usize,
        /// Number of probabilities supplied.
        found: usize,
    },
}

impl fmt::Display for RelaxationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diverged {
                start,
                vertex,
                topplings,
            } => {
                write!(f, "relaxation diverged from {start}")?;
                if let Some(v) = vertex {
                    write!(f, " after injection at vertex {v}")?;
                }
                write!(f, " ({topplings} topplings)")
            }
            Self::EnumerationLimit {
                start,
                vertex,
                limit,
            } => {
                write!(f, "exact relaxation from {start}")?;
                if let Some(v) = vertex {
                    write!(f, " after injection at vertex {v}")?;
                }
                write!(f, " needs more than {limit} microstates")
            }
            Self::InvalidSleepProbability { rank, value } => {
                write!(f, "sleep probability {value} at rank {rank} is not in [0, 1]")
            }
            Self::SleepLengthMismatch { expected, found } => {
                write!(f, "expected {expected} sleep probabilities, found {found}")
            }
        }
    }
}

impl Error for RelaxationError {}

impl RelaxationError {
    /// Attach the injection vertex to a divergence or enumeration-limit
    /// report. Other variants are returned unchanged.
    pub fn at_vertex(self, v: VertexId) -> Self {
        match self {
            Self::Diverged {
                start, topplings, ..
            } => Self::Diverged {
                start,
                vertex: Some(v),
                topplings,
            },
            Self::EnumerationLimit { start, limit, .. } => Self::EnumerationLimit {
                start,
                vertex: Some(v),
                limit,
            },
            other => other,
        }
    }
}

/// Failures while assembling or analysing the transition matrix.
#[derive(Clone, Debug, PartialEq)]
pub enum MatrixError {
    /// A row does not sum to one (`MatrixConsistencyError`). Signals a
    /// bug upstream in the explorer or the relaxation engine.
    Consistency {
        /// Row index (configuration index).
        row: usize,
        /// Observed row sum.
        sum: f64,
        /// Tolerance that was exceeded.
        epsilon: f64,
    },
    /// A transition entry is out of range, negative, or not finite.
    InvalidEntry {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The rejected weight.
        weight: f64,
    },
    /// The chain has more than one closed communicating class, so the
    /// stationary distribution is not unique.
    ReducibleChain {
        /// Number of closed classes found.
        closed_classes: usize,
    },
    /// The matrix has no rows.
    Empty,
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consistency { row, sum, epsilon } => write!(
                f,
                "row {row} sums to {sum:.17}, deviating from 1 by more than {epsilon:e}"
            ),
            Self::InvalidEntry { row, col, weight } => {
                write!(f, "invalid transition entry ({row}, {col}) = {weight}")
            }
            Self::ReducibleChain { closed_classes } => write!(
                f,
                "chain has {closed_classes} closed classes; stationary distribution is not unique"
            ),
            Self::Empty => write!(f, "transition matrix is empty"),
        }
    }
}

impl Error for MatrixError {}

/// Failures of the stationary-distribution solver.
#[derive(Clone, Debug, PartialEq)]
pub enum SolveError {
    /// Power iteration hit its iteration cap (`ConvergenceError`).
    /// Callers may retry with a larger budget or a direct solve.
    Convergence {
        /// Iterations performed.
        iterations: usize,
        /// Infinity-norm change at the last iteration.
        residual: f64,
    },
    /// A solved component is negative beyond the clamp tolerance, or
    /// not finite (`NumericalInstabilityError`).
    NumericalInstability {
        /// Component index.
        index: usize,
        /// The offending value.
        value: f64,
    },
    /// The balance system is singular.
    Singular {
        /// Dimension of the system.
        dim: usize,
    },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Convergence {
                iterations,
                residual,
            } => write!(
                f,
                "power iteration did not converge after {iterations} iterations (residual {residual:e})"
            ),
            Self::NumericalInstability { index, value } => {
                write!(f, "numerically unstable component {index} = {value:e}")
            }
            Self::Singular { dim } => write!(f, "balance system of dimension {dim} is singular"),
        }
    }
}

impl Error for SolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_display_is_prefixed() {
        let e = GraphError::SinkUnreachable {
            vertex: VertexId(3),
        };
        assert_eq!(
            e.to_string(),
            "malformed graph: sink is unreachable from vertex 3"
        );
    }

    #[test]
    fn diverged_display_includes_vertex_when_known() {
        let e = RelaxationError::Diverged {
            start: "[s, 0]".into(),
            vertex: Some(VertexId(0)),
            topplings: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("[s, 0]"));
        assert!(msg.contains("vertex 0"));
        assert!(msg.contains("10 topplings"));

        let seed = RelaxationError::Diverged {
            start: "[2]".into(),
            vertex: None,
            topplings: 3,
        };
        assert!(!seed.to_string().contains("injection"));
    }

    #[test]
    fn enumeration_limit_is_not_reported_as_divergence() {
        let e = RelaxationError::EnumerationLimit {
            start: "[2a, s]".into(),
            vertex: None,
            limit: 2048,
        }
        .at_vertex(VertexId(1));
        let msg = e.to_string();
        assert!(msg.contains("more than 2048 microstates"));
        assert!(msg.contains("vertex 1"));
        assert!(!msg.contains("diverged"));
    }

    #[test]
    fn at_vertex_only_touches_divergence() {
        let e = RelaxationError::Diverged {
            start: "[2]".into(),
            vertex: None,
            topplings: 1,
        }
        .at_vertex(VertexId(4));
        assert!(matches!(
            e,
            RelaxationError::Diverged {
                vertex: Some(VertexId(4)),
                ..
            }
        ));
        let other = RelaxationError::SleepLengthMismatch {
            expected: 1,
            found: 2,
        };
        assert_eq!(other.clone().at_vertex(VertexId(0)), other);
    }

    #[test]
    fn convergence_error_reports_budget() {
        let e = SolveError::Convergence {
            iterations: 500,
            residual: 1e-3,
        };
        assert!(e.to_string().contains("500 iterations"));
    }

    #[test]
    fn errors_are_std_errors() {
        fn assert_error<E: Error>(_: &E) {}
        assert_error(&GraphError::Empty);
        assert_error(&MatrixError::Empty);
        assert_error(&SolveError::Singular { dim: 2 });
    }
}
