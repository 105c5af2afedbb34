//! End-to-end run: seed, explore, assemble, restrict, solve.

use std::time::Instant;

use arw_core::{ProgressObserver, RelaxationError};
use arw_graph::{Configuration, Graph};
use arw_relax::{Microstate, SleepProbabilities};
use arw_solve::{recurrent_class, solve, TransitionMatrix};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{PipelineConfig, SeedPlacement};
use crate::error::ArwError;
use crate::explorer::Explorer;
use crate::metrics::RunMetrics;

/// The stationary distribution over stable configurations.
#[derive(Clone, Debug, PartialEq)]
pub struct StationaryResult {
    /// Configurations, in discovery order.
    pub index: Vec<Configuration>,
    /// `probabilities[i]` is the stationary mass of `index[i]`.
    pub probabilities: Vec<f64>,
    /// `max_j |(pi Q)_j - pi_j|` of the solved chain.
    pub residual: f64,
    /// Counters and timings.
    pub metrics: RunMetrics,
}

impl StationaryResult {
    /// `(configuration, probability)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&Configuration, f64)> + '_ {
        self.index.iter().zip(self.probabilities.iter().copied())
    }

    /// Stationary mass of `config`, zero if it is not in the index.
    pub fn probability_of(&self, config: &Configuration) -> f64 {
        self.index
            .iter()
            .position(|c| c == config)
            .map_or(0.0, |i| self.probabilities[i])
    }

    /// Balance residual of the solve.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Number of configurations in the index.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// `true` when the index is empty. Never the case for a successful run.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Compute the stationary distribution of the driven ARW chain on
/// `graph` with sleep law `sleep`.
///
/// # Errors
///
/// Any stage may fail; see [`ArwError`].
pub fn run(
    graph: &Graph,
    sleep: &SleepProbabilities,
    config: &PipelineConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<StationaryResult, ArwError> {
    config.validate()?;
    if sleep.as_slice().len() != graph.non_sink_count() {
        return Err(RelaxationError::SleepLengthMismatch {
            expected: graph.non_sink_count(),
            found: sleep.as_slice().len(),
        }
        .into());
    }

    let mut metrics = RunMetrics::default();
    if config.particles == 0 {
        log::info!("no seed particles: empty configuration is stationary");
        metrics.discovered = 1;
        metrics.recurrent = 1;
        return Ok(StationaryResult {
            index: vec![Configuration::empty(graph)],
            probabilities: vec![1.0],
            residual: 0.0,
            metrics,
        });
    }

    let seed = match config.seed_placement {
        SeedPlacement::Pile(v) => Configuration::pile(graph, v, config.particles)?,
        SeedPlacement::Spread => Configuration::spread(graph, config.particles),
    };
    log::info!(
        "seed {seed} on {} vertices ({} non-sink), sleep regime {:?}",
        graph.vertex_count(),
        graph.non_sink_count(),
        sleep.regime()
    );

    let relaxation = config.relaxation();
    let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);

    let started = Instant::now();
    let seeded = relaxation.outcome(graph, sleep, &Microstate::activated(&seed), &mut rng)?;
    metrics.relaxations += 1;
    metrics.topplings += seeded.topplings;

    let exploration = Explorer::new(graph, sleep, &relaxation, &config.injection)?
        .max_configurations(config.max_configurations)
        .progress_interval(config.progress_interval)
        .explore(
            seeded.branches.into_iter().map(|(c, _)| c),
            &mut rng,
            observer,
        )?;
    metrics.explore_us = started.elapsed().as_micros() as u64;
    metrics.discovered = exploration.states.len();
    metrics.transitions = exploration.transitions.len();
    metrics.relaxations += exploration.relaxations;
    metrics.topplings = metrics.topplings.saturating_add(exploration.topplings);

    let started = Instant::now();
    let q = TransitionMatrix::from_triplets(
        exploration.states.len(),
        exploration
            .transitions
            .iter()
            .map(|t| (t.from, t.to, t.weight)),
        config.row_sum_epsilon,
    )?;
    let recurrent = recurrent_class(&q)?;
    metrics.recurrent = recurrent.len();
    log::info!(
        "{} configurations, {} recurrent, {} transitions",
        q.dim(),
        recurrent.len(),
        q.nnz()
    );

    let keep: Vec<usize> = if config.keep_transient {
        (0..q.dim()).collect()
    } else {
        recurrent
    };
    let chain = if keep.len() == q.dim() {
        q
    } else {
        q.restrict(&keep)
    };
    let solved = solve(&chain, &config.solver_config(), observer)?;
    metrics.solve_us = started.elapsed().as_micros() as u64;
    metrics.solver_iterations = solved.iterations;
    log::info!(
        "solved with {:?}: residual {:e}, {} iterations",
        solved.method,
        solved.residual,
        solved.iterations
    );

    let index = keep
        .iter()
        .filter_map(|&i| exploration.states.get_index(i).cloned())
        .collect();
    Ok(StationaryResult {
        index,
        probabilities: solved.probabilities,
        residual: solved.residual,
        metrics,
    })
}
