//! Worklist-driven discovery of the stable configurations reachable
//! under repeated injection, and of the transitions between them.
//!
//! The registry is an insertion-ordered set, so a configuration's index
//! is its order of discovery and the worklist is simply a cursor into
//! the registry: everything behind the cursor has been processed,
//! everything from it onwards is the frontier.

use arw_core::{Progress, ProgressObserver};
use arw_graph::{Configuration, Graph};
use arw_relax::{Microstate, Relaxation, SleepProbabilities};
use indexmap::{IndexMap, IndexSet};
use rand::Rng;

use crate::error::ExploreError;
use crate::injection::Injection;

/// One aggregated transition between discovered configurations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    /// Index of the source configuration.
    pub from: usize,
    /// Index of the target configuration.
    pub to: usize,
    /// Probability of the step, summed over injection vertices and
    /// relaxation outcomes.
    pub weight: f64,
}

/// Everything exploration found.
#[derive(Clone, Debug)]
pub struct Exploration {
    /// Discovered configurations in discovery order.
    pub states: IndexSet<Configuration>,
    /// Transitions, grouped by source in index order; one entry per
    /// (from, to) pair.
    pub transitions: Vec<Transition>,
    /// Relaxations performed.
    pub relaxations: u64,
    /// Total topplings (or enumerated microstates) over all relaxations.
    pub topplings: u64,
}

/// State-space explorer for one graph, sleep law, and relaxation
/// strategy.
#[derive(Debug)]
pub struct Explorer<'a> {
    graph: &'a Graph,
    sleep: &'a SleepProbabilities,
    relaxation: &'a Relaxation,
    injection: Vec<(usize, f64)>,
    max_configurations: usize,
    progress_interval: usize,
}

impl<'a> Explorer<'a> {
    /// Default cap on discovered configurations.
    pub const DEFAULT_MAX_CONFIGURATIONS: usize = 1 << 20;

    /// Create an explorer, resolving the injection distribution.
    pub fn new(
        graph: &'a Graph,
        sleep: &'a SleepProbabilities,
        relaxation: &'a Relaxation,
        injection: &Injection,
    ) -> Result<Self, ExploreError> {
        Ok(Self {
            graph,
            sleep,
            relaxation,
            injection: injection.resolve(graph)?,
            max_configurations: Self::DEFAULT_MAX_CONFIGURATIONS,
            progress_interval: 1000,
        })
    }

    /// Abort once more than `max` configurations are discovered.
    pub fn max_configurations(mut self, max: usize) -> Self {
        self.max_configurations = max;
        self
    }

    /// Report progress every `n` processed configurations. 0 reports
    /// only at the end.
    pub fn progress_interval(mut self, n: usize) -> Self {
        self.progress_interval = n;
        self
    }

    /// Explore from `initial` until the worklist is empty.
    ///
    /// `rng` is consulted only in sampled mode. Configurations are
    /// processed in discovery order and injection vertices in rank
    /// order, so a seeded run is reproducible.
    pub fn explore<I, R>(
        &self,
        initial: I,
        rng: &mut R,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Exploration, ExploreError>
    where
        I: IntoIterator<Item = Configuration>,
        R: Rng + ?Sized,
    {
        let mut states: IndexSet<Configuration> = initial.into_iter().collect();
        self.check_limit(states.len())?;
        log::info!(
            "exploring from {} seed configuration(s), {} injection site(s), {} relaxation",
            states.len(),
            self.injection.len(),
            self.relaxation.mode_name()
        );

        let mut transitions = Vec::new();
        let mut relaxations = 0u64;
        let mut topplings = 0u64;
        let mut cursor = 0;
        while cursor < states.len() {
            let config = states[cursor].clone();
            let mut row: IndexMap<usize, f64> = IndexMap::new();

            if self.injection.is_empty() {
                // No site to inject into: the chain sits still.
                row.insert(cursor, 1.0);
            }
            for &(rank, weight) in &self.injection {
                let start = Microstate::add_particle(&config, rank);
                let outcome = self
                    .relaxation
                    .outcome(self.graph, self.sleep, &start, rng)
                    .map_err(|e| ExploreError::Relaxation {
                        configuration: config.to_string(),
                        source: e.at_vertex(self.graph.vertex_at_rank(rank)),
                    })?;
                relaxations += 1;
                topplings = topplings.saturating_add(outcome.topplings);
                for (next, p) in outcome.branches {
                    let (to, _) = states.insert_full(next);
                    *row.entry(to).or_insert(0.0) += weight * p;
                }
                self.check_limit(states.len())?;
            }
            transitions.extend(row.into_iter().map(|(to, weight)| Transition {
                from: cursor,
                to,
                weight,
            }));

            cursor += 1;
            if self.progress_interval > 0 && cursor % self.progress_interval == 0 {
                let progress = Progress::Exploring {
                    discovered: states.len(),
                    frontier: states.len() - cursor,
                };
                observer.notify(progress);
                log::debug!("processed {cursor}, discovered {}", states.len());
            }
        }

        observer.notify(Progress::Exploring {
            discovered: states.len(),
            frontier: 0,
        });
        log::info!(
            "exploration done: {} configurations, {} transitions, {relaxations} relaxations",
            states.len(),
            transitions.len()
        );
        Ok(Exploration {
            states,
            transitions,
            relaxations,
            topplings,
        })
    }

    fn check_limit(&self, discovered: usize) -> Result<(), ExploreError> {
        if discovered > self.max_configurations {
            return Err(ExploreError::LimitExceeded {
                limit: self.max_configurations,
            });
        }
        Ok(())
    }
}
