//! Graph model and configuration representation.
//!
//! [`Graph`] is the immutable input topology: vertices, weighted
//! (possibly directed) edges, and one sink. [`Configuration`] is the
//! canonical, hashable particle placement over the non-sink vertices.
//!
//! # Ranks
//!
//! Non-sink vertices are numbered densely in increasing id order; that
//! number is the vertex's *rank*. Every per-vertex table outside this
//! crate (configurations, sleep probabilities, injection weights) is
//! indexed by rank, so the sink never needs a placeholder slot.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod configuration;
pub mod graph;
pub mod hash;
pub mod presets;

pub use configuration::{Configuration, Counts};
pub use graph::{Graph, GraphBuilder, Neighbours};
