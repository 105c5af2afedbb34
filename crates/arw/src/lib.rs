//! Stationary distributions of activated random walk (ARW).
//!
//! This is the top-level facade crate that re-exports the public API from
//! all ARW sub-crates. For most users, adding `arw` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use arw::prelude::*;
//!
//! // Two non-sink vertices and the sink, pairwise adjacent.
//! let graph = presets::clique(3).unwrap();
//! let sleep = SleepProbabilities::uniform(&graph, 0.5).unwrap();
//! let config = PipelineConfig { particles: 2, ..PipelineConfig::default() };
//! let result = run(&graph, &sleep, &config, &mut NullObserver).unwrap();
//!
//! assert_eq!(result.len(), 4);
//! let total: f64 = result.probabilities.iter().sum();
//! assert!((total - 1.0).abs() < 1e-12);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `arw-core` | vertex ids, errors, progress observers |
//! | [`graph`] | `arw-graph` | graphs with a sink, configurations, presets |
//! | [`relax`] | `arw-relax` | firing rules, exact and sampled relaxation |
//! | [`solve`] | `arw-solve` | transition matrices, recurrent classes, solvers |
//! | [`engine`] | `arw-engine` | exploration and the end-to-end pipeline |
//! | [`persist`] | `arw-persist` | binary blob and text dumps |
//! | [`analysis`] | `arw-analysis` | joint intensities and survivor statistics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Vertex ids, the error taxonomy, and progress observers (`arw-core`).
pub use arw_core as types;

/// Graphs with one sink and particle configurations (`arw-graph`).
pub use arw_graph as graph;

/// The relaxation engine (`arw-relax`).
///
/// [`relax::ExactRelaxation`] computes exact outcome laws,
/// [`relax::SampledRelaxation`] draws trajectories.
pub use arw_relax as relax;

/// Transition matrices and stationary solvers (`arw-solve`).
pub use arw_solve as solve;

/// State-space exploration and the pipeline (`arw-engine`).
pub use arw_engine as engine;

/// Persistence (`arw-persist`).
pub use arw_persist as persist;

/// Downstream statistics (`arw-analysis`).
pub use arw_analysis as analysis;

/// Common imports for typical usage.
///
/// ```rust
/// use arw::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use arw_core::{LogObserver, NullObserver, Progress, ProgressObserver, VertexId};

    // Errors
    pub use arw_core::{ConfigurationError, GraphError, MatrixError, RelaxationError, SolveError};

    // Graph
    pub use arw_graph::{presets, Configuration, Graph, GraphBuilder};

    // Relaxation
    pub use arw_relax::{ExactRelaxation, Relaxation, SampledRelaxation, SleepProbabilities};

    // Solver
    pub use arw_solve::{SolverMethod, TransitionMatrix};

    // Engine
    pub use arw_engine::{
        run, ArwError, Injection, Mode, PipelineConfig, SeedPlacement, StationaryResult,
    };

    // Persistence
    pub use arw_persist::{PersistError, StoredDistribution};
}
