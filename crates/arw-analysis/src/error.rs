use std::error::Error;
use std::fmt;

/// Inconsistent analysis input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    /// The configuration index and probability vector differ in length.
    LengthMismatch {
        /// Number of configurations.
        states: usize,
        /// Number of probabilities.
        probabilities: usize,
    },
    /// A configuration has a different number of sites than the first.
    WidthMismatch {
        /// Position of the offending configuration.
        index: usize,
        /// Sites in the first configuration.
        expected: usize,
        /// Sites in the offending one.
        found: usize,
    },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                states,
                probabilities,
            } => write!(
                f,
                "{states} configurations but {probabilities} probabilities"
            ),
            Self::WidthMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "configuration {index} has {found} sites, expected {expected}"
            ),
        }
    }
}

impl Error for AnalysisError {}
