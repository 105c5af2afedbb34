//! Sampled relaxation: one random trajectory at a time.
//!
//! The random source is passed in by the caller, so a seeded
//! `ChaCha8Rng` reproduces the same trajectory bit for bit.

use arw_core::RelaxationError;
use arw_graph::{Configuration, Graph};
use rand::Rng;

use crate::microstate::Microstate;
use crate::rule::{Analytic, ArwRule, Branches, FiringRule, Firing};
use crate::sleep::SleepProbabilities;

/// One sampled relaxation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trajectory {
    /// The stable configuration reached.
    pub configuration: Configuration,
    /// Number of firings performed.
    pub topplings: u64,
}

/// Monte-Carlo relaxation strategy.
#[derive(Debug)]
pub struct SampledRelaxation {
    rule: Box<dyn FiringRule>,
    max_topplings: u64,
    samples: u32,
}

impl Default for SampledRelaxation {
    fn default() -> Self {
        Self::new()
    }
}

impl SampledRelaxation {
    /// Default cap on firings per trajectory.
    pub const DEFAULT_MAX_TOPPLINGS: u64 = 1_000_000;
    /// Default number of trajectories per transition estimate.
    pub const DEFAULT_SAMPLES: u32 = 1_000;

    /// Sampled relaxation under [`ArwRule`].
    pub fn new() -> Self {
        Self {
            rule: Box::new(ArwRule),
            max_topplings: Self::DEFAULT_MAX_TOPPLINGS,
            samples: Self::DEFAULT_SAMPLES,
        }
    }

    /// Replace the firing rule.
    pub fn with_rule(mut self, rule: Box<dyn FiringRule>) -> Self {
        self.rule = rule;
        self
    }

    /// Cap the firings of a single trajectory.
    pub fn max_topplings(mut self, max: u64) -> Self {
        self.max_topplings = max;
        self
    }

    /// Trajectories drawn per (configuration, injection vertex) pair.
    /// At least one.
    pub fn samples_per_transition(mut self, samples: u32) -> Self {
        self.samples = samples.max(1);
        self
    }

    /// Trajectories drawn per (configuration, injection vertex) pair.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// The firing rule in use.
    pub fn rule(&self) -> &dyn FiringRule {
        self.rule.as_ref()
    }

    /// Run one trajectory from `start` until it is stable.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        graph: &Graph,
        sleep: &SleepProbabilities,
        start: &Microstate,
        rng: &mut R,
    ) -> Result<Trajectory, RelaxationError> {
        match self.rule.analytic(graph, sleep, start) {
            Some(Analytic::Settles(configuration)) => {
                return Ok(Trajectory {
                    configuration,
                    topplings: 0,
                })
            }
            Some(Analytic::Diverges) => return Err(diverged(start, 0)),
            None => {}
        }

        let mut state = start.clone();
        let mut topplings = 0u64;
        loop {
            match self.rule.fire(graph, sleep, &state) {
                Firing::Stable => {
                    return Ok(Trajectory {
                        configuration: state.to_configuration(),
                        topplings,
                    })
                }
                Firing::Stuck => return Err(diverged(start, topplings)),
                Firing::Branches(branches) => {
                    if topplings >= self.max_topplings {
                        return Err(diverged(start, topplings));
                    }
                    topplings += 1;
                    state = choose(branches, rng).ok_or_else(|| diverged(start, topplings))?;
                }
            }
        }
    }
}

/// Draw one branch by cumulative weight. Falls back to the last branch
/// when rounding leaves the draw just above the running sum.
fn choose<R: Rng + ?Sized>(branches: Branches, rng: &mut R) -> Option<Microstate> {
    let total: f64 = branches.iter().map(|(_, p)| p).sum();
    let mut u = rng.gen::<f64>() * total;
    let mut picked = branches.len().checked_sub(1)?;
    for (i, (_, p)) in branches.iter().enumerate() {
        if u < *p {
            picked = i;
            break;
        }
        u -= p;
    }
    branches.into_iter().nth(picked).map(|(m, _)| m)
}

fn diverged(start: &Microstate, topplings: u64) -> RelaxationError {
    RelaxationError::Diverged {
        start: start.to_string(),
        vertex: None,
        topplings,
    }
}
