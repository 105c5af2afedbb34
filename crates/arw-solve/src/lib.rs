//! Transition matrices and stationary distributions for finite Markov
//! chains.
//!
//! - [`TransitionMatrix`]: compressed sparse rows, assembled from
//!   `(from, to, weight)` triplets with duplicate entries summed and
//!   every row checked to be stochastic.
//! - [`recurrent`]: strongly connected components and the closed
//!   (recurrent) class of the chain.
//! - [`solve`]: the stationary vector, by a dense direct solve or by
//!   power iteration on the lazy chain.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod matrix;
pub mod recurrent;
pub mod solver;

pub use matrix::TransitionMatrix;
pub use recurrent::{closed_classes, recurrent_class, strongly_connected_components};
pub use solver::{balance_residual, solve, SolverConfig, SolverMethod, StationaryDistribution};
