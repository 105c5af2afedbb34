//! Core types and traits for the ARW stationary-distribution solver.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vertex identifier, the error taxonomy shared by every stage of
//! the pipeline, and the passive progress observer interface.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod observer;

pub use error::{ConfigurationError, GraphError, MatrixError, RelaxationError, SolveError};
pub use id::VertexId;
pub use observer::{LogObserver, NullObserver, Progress, ProgressObserver};
