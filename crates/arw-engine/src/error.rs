//! Exploration errors and the pipeline-level umbrella error.

use std::error::Error;
use std::fmt;

use arw_core::{ConfigurationError, GraphError, MatrixError, RelaxationError, SolveError};

use crate::config::ConfigError;

/// Failures of state-space exploration.
#[derive(Clone, Debug, PartialEq)]
pub enum ExploreError {
    /// Relaxing an injection into a discovered configuration failed.
    Relaxation {
        /// The configuration being processed, in `0`/`s` notation.
        configuration: String,
        /// The underlying failure, carrying the injection vertex.
        source: RelaxationError,
    },
    /// More configurations were discovered than allowed
    /// (`ExplorationLimitExceeded`).
    LimitExceeded {
        /// The configured cap.
        limit: usize,
    },
    /// The injection distribution is unusable.
    InvalidInjection {
        /// What is wrong with it.
        reason: String,
    },
}

impl fmt::Display for ExploreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relaxation {
                configuration,
                source,
            } => write!(f, "while exploring from {configuration}: {source}"),
            Self::LimitExceeded { limit } => {
                write!(f, "exploration exceeded {limit} configurations")
            }
            Self::InvalidInjection { reason } => write!(f, "invalid injection: {reason}"),
        }
    }
}

impl Error for ExploreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Relaxation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Any failure of a pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub enum ArwError {
    /// Invalid pipeline configuration.
    Config(ConfigError),
    /// Malformed graph.
    Graph(GraphError),
    /// Invalid particle configuration (e.g. a seed on the sink).
    Configuration(ConfigurationError),
    /// Relaxing the seed failed.
    Relaxation(RelaxationError),
    /// Exploration failed.
    Explore(ExploreError),
    /// The transition matrix is inconsistent or reducible.
    Matrix(MatrixError),
    /// The stationary solve failed.
    Solve(SolveError),
}

impl fmt::Display for ArwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Graph(e) => write!(f, "graph: {e}"),
            Self::Configuration(e) => write!(f, "seed: {e}"),
            Self::Relaxation(e) => write!(f, "seed relaxation: {e}"),
            Self::Explore(e) => write!(f, "explore: {e}"),
            Self::Matrix(e) => write!(f, "matrix: {e}"),
            Self::Solve(e) => write!(f, "solve: {e}"),
        }
    }
}

impl Error for ArwError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Graph(e) => Some(e),
            Self::Configuration(e) => Some(e),
            Self::Relaxation(e) => Some(e),
            Self::Explore(e) => Some(e),
            Self::Matrix(e) => Some(e),
            Self::Solve(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ArwError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GraphError> for ArwError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

impl From<ConfigurationError> for ArwError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}

impl From<RelaxationError> for ArwError {
    fn from(e: RelaxationError) -> Self {
        Self::Relaxation(e)
    }
}

impl From<ExploreError> for ArwError {
    fn from(e: ExploreError) -> Self {
        Self::Explore(e)
    }
}

impl From<MatrixError> for ArwError {
    fn from(e: MatrixError) -> Self {
        Self::Matrix(e)
    }
}

impl From<SolveError> for ArwError {
    fn from(e: SolveError) -> Self {
        Self::Solve(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arw_core::VertexId;

    #[test]
    fn explore_error_chains_to_relaxation() {
        let e = ExploreError::Relaxation {
            configuration: "[s, 0]".into(),
            source: RelaxationError::Diverged {
                start: "[2a, 0]".into(),
                vertex: Some(VertexId(0)),
                topplings: 7,
            },
        };
        assert!(e.to_string().starts_with("while exploring from [s, 0]: "));
        assert!(e.source().is_some());

        let top: ArwError = e.into();
        assert!(top.to_string().starts_with("explore: "));
        assert!(top.source().is_some());
    }

    #[test]
    fn limit_display() {
        assert_eq!(
            ExploreError::LimitExceeded { limit: 10 }.to_string(),
            "exploration exceeded 10 configurations"
        );
    }
}
