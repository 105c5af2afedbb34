//! Toppling/relaxation engine for activated random walk.
//!
//! Given a configuration and an injected particle, drives the
//! microscopic ARW dynamics (sleep, jump, wake, absorption at the sink)
//! until no active particle remains.
//!
//! # Strategies
//!
//! The strategy is fixed when the [`Relaxation`] is constructed:
//!
//! - [`ExactRelaxation`]: the exact law of the stable outcome. Degenerate
//!   sleep regimes are resolved analytically; otherwise the finite
//!   microscopic chain is enumerated and its absorption probabilities
//!   solved.
//! - [`SampledRelaxation`]: one random trajectory per call, drawn from a
//!   caller-supplied random source.
//!
//! # Firing rules
//!
//! The microscopic rule is pluggable through [`FiringRule`]; [`ArwRule`]
//! is the activated-random-walk rule used in production.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod exact;
pub mod microstate;
pub mod relaxation;
pub mod rule;
pub mod sampled;
pub mod sleep;

pub use exact::{ExactRelaxation, Outcome};
pub use microstate::{add_particle, Microstate, Site};
pub use relaxation::Relaxation;
pub use rule::{Analytic, ArwRule, Branches, FiringRule, Firing};
pub use sampled::{SampledRelaxation, Trajectory};
pub use sleep::{SleepProbabilities, SleepRegime};
