//! Error types for persistence.

use std::fmt;
use std::io;

/// Errors while writing or reading a stored distribution.
#[derive(Debug)]
pub enum PersistError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The blob does not start with `b"ARWD"`.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the blob.
        found: u8,
    },
    /// The blob is truncated or internally inconsistent.
    Malformed {
        /// What went wrong.
        detail: String,
    },
    /// The blob was produced for a different graph.
    GraphMismatch {
        /// Topology hash stored in the blob.
        recorded: u64,
        /// Topology hash of the graph at hand.
        current: u64,
    },
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"ARWD\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed blob: {detail}"),
            Self::GraphMismatch { recorded, current } => write!(
                f,
                "graph mismatch: recorded={recorded:#018x}, current={current:#018x}"
            ),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PersistError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
