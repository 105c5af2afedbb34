//! State-space exploration and the stationary-distribution pipeline.
//!
//! [`run`] is the entry point: it relaxes the seed, explores every stable
//! configuration reachable under repeated injection, assembles the
//! transition matrix, restricts it to the recurrent class, and solves for
//! the stationary vector.
//!
//! ```
//! use arw_core::NullObserver;
//! use arw_engine::{run, PipelineConfig};
//! use arw_graph::presets;
//! use arw_relax::SleepProbabilities;
//!
//! let g = presets::path(2).unwrap();
//! let sleep = SleepProbabilities::uniform(&g, 0.25).unwrap();
//! let result = run(&g, &sleep, &PipelineConfig::default(), &mut NullObserver).unwrap();
//! // One non-sink vertex: asleep with probability q.
//! let asleep = result.iter().find(|(c, _)| c.total() == 1).unwrap();
//! assert!((asleep.1 - 0.25).abs() < 1e-9);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod explorer;
pub mod injection;
pub mod metrics;
pub mod pipeline;

pub use config::{ConfigError, Mode, PipelineConfig, SeedPlacement};
pub use error::{ArwError, ExploreError};
pub use explorer::{Exploration, Explorer, Transition};
pub use injection::Injection;
pub use metrics::RunMetrics;
pub use pipeline::{run, StationaryResult};
