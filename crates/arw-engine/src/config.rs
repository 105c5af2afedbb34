//! Pipeline configuration, validation, and error types.
//!
//! [`PipelineConfig`] collects every knob of a run. [`validate()`]
//! checks the parameters that can be checked without the graph; seed
//! placement and injection weights are checked against the graph when
//! the run starts.
//!
//! [`validate()`]: PipelineConfig::validate

use std::error::Error;
use std::fmt;

use arw_core::VertexId;
use arw_relax::{ExactRelaxation, Relaxation, SampledRelaxation};
use arw_solve::{SolverConfig, SolverMethod};

use crate::injection::Injection;

// ── SeedPlacement ──────────────────────────────────────────────────

/// Where the `N` seed particles start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedPlacement {
    /// All on one vertex.
    Pile(VertexId),
    /// Round-robin over the non-sink vertices in rank order.
    #[default]
    Spread,
}

// ── Mode ───────────────────────────────────────────────────────────

/// Relaxation strategy selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Exact outcome laws.
    #[default]
    Exact,
    /// Monte-Carlo estimates.
    Sampled,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`PipelineConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A count that must be at least one is zero.
    ZeroLimit {
        /// Name of the field.
        field: &'static str,
    },
    /// A tolerance is NaN, infinite, or out of range.
    InvalidTolerance {
        /// Name of the field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLimit { field } => write!(f, "{field} must be at least 1"),
            Self::InvalidTolerance { field, value } => {
                write!(f, "{field} must be finite and in range, got {value}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── PipelineConfig ─────────────────────────────────────────────────

/// Parameters of one pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Number of seed particles `N`. Zero short-circuits to the empty
    /// configuration.
    pub particles: u32,
    /// Seed placement. Default: [`SeedPlacement::Spread`].
    pub seed_placement: SeedPlacement,
    /// Injection distribution. Default: uniform.
    pub injection: Injection,
    /// Relaxation strategy. Default: exact.
    pub mode: Mode,
    /// Per-trajectory firing cap in sampled mode. Default: 1 000 000.
    pub max_topplings: u64,
    /// Per-relaxation microstate cap in exact mode. Default: 65 536.
    pub max_microstates: u64,
    /// Trajectories per (configuration, injection vertex) in sampled
    /// mode. Default: 1000.
    pub samples_per_transition: u32,
    /// Seed for the run's `ChaCha8Rng`. Default: 0.
    pub rng_seed: u64,
    /// Exploration cap. Default: 2^20.
    pub max_configurations: usize,
    /// Solve on every discovered configuration instead of the recurrent
    /// class only. Transient configurations then get (near-)zero mass.
    /// Default: false.
    pub keep_transient: bool,
    /// Solver method. Default: dense direct up to 500 states, sparse
    /// Gauss-Seidel beyond.
    pub solver: SolverMethod,
    /// Iterative-solver stopping tolerance. Default: 1e-12.
    pub solver_tolerance: f64,
    /// Iterative-solver sweep cap. Default: 1 000 000.
    pub max_iterations: usize,
    /// Largest allowed deviation of a row sum from one. Default: 1e-9.
    pub row_sum_epsilon: f64,
    /// Negative stationary components down to `-clamp_tolerance` are
    /// clamped to zero. Default: 1e-10.
    pub clamp_tolerance: f64,
    /// Progress is reported every this many units of work. 0 reports
    /// only at phase ends. Default: 1000.
    pub progress_interval: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let solver = SolverConfig::default();
        Self {
            particles: 1,
            seed_placement: SeedPlacement::default(),
            injection: Injection::default(),
            mode: Mode::default(),
            max_topplings: SampledRelaxation::DEFAULT_MAX_TOPPLINGS,
            max_microstates: ExactRelaxation::DEFAULT_MAX_MICROSTATES,
            samples_per_transition: SampledRelaxation::DEFAULT_SAMPLES,
            rng_seed: 0,
            max_configurations: 1 << 20,
            keep_transient: false,
            solver: solver.method,
            solver_tolerance: solver.tolerance,
            max_iterations: solver.max_iterations,
            row_sum_epsilon: 1e-9,
            clamp_tolerance: solver.clamp_tolerance,
            progress_interval: solver.progress_interval,
        }
    }
}

impl PipelineConfig {
    /// Check the graph-independent parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_topplings", self.max_topplings),
            ("max_microstates", self.max_microstates),
            ("samples_per_transition", u64::from(self.samples_per_transition)),
            ("max_configurations", self.max_configurations as u64),
            ("max_iterations", self.max_iterations as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit { field });
            }
        }
        positive("solver_tolerance", self.solver_tolerance)?;
        positive("row_sum_epsilon", self.row_sum_epsilon)?;
        if !self.clamp_tolerance.is_finite() || self.clamp_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance {
                field: "clamp_tolerance",
                value: self.clamp_tolerance,
            });
        }
        Ok(())
    }

    /// The relaxation strategy these settings describe.
    pub fn relaxation(&self) -> Relaxation {
        match self.mode {
            Mode::Exact => ExactRelaxation::new()
                .max_microstates(self.max_microstates)
                .into(),
            Mode::Sampled => SampledRelaxation::new()
                .max_topplings(self.max_topplings)
                .samples_per_transition(self.samples_per_transition)
                .into(),
        }
    }

    /// The solver settings these settings describe.
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            method: self.solver,
            tolerance: self.solver_tolerance,
            max_iterations: self.max_iterations,
            clamp_tolerance: self.clamp_tolerance,
            progress_interval: self.progress_interval,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTolerance { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let c = PipelineConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.relaxation().is_exact());
        assert_eq!(c.solver_config(), SolverConfig::default());
    }

    #[test]
    fn zero_samples_rejected() {
        let c = PipelineConfig {
            samples_per_transition: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(ConfigError::ZeroLimit {
                field: "samples_per_transition"
            })
        );
    }

    #[test]
    fn bad_tolerances_rejected() {
        let nan = PipelineConfig {
            row_sum_epsilon: f64::NAN,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(ConfigError::InvalidTolerance {
                field: "row_sum_epsilon",
                ..
            })
        ));
        let negative = PipelineConfig {
            clamp_tolerance: -1.0,
            ..PipelineConfig::default()
        };
        assert_eq!(
            negative.validate(),
            Err(ConfigError::InvalidTolerance {
                field: "clamp_tolerance",
                value: -1.0
            })
        );
    }

    #[test]
    fn sampled_mode_builds_sampler() {
        let c = PipelineConfig {
            mode: Mode::Sampled,
            samples_per_transition: 17,
            ..PipelineConfig::default()
        };
        match c.relaxation() {
            Relaxation::Sampled(s) => assert_eq!(s.samples(), 17),
            other => panic!("expected sampled relaxation, got {other:?}"),
        }
    }
}
