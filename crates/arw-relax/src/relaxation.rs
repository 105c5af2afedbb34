//! The relaxation strategy chosen for a run.

use arw_core::RelaxationError;
use arw_graph::{Configuration, Graph};
use indexmap::IndexMap;
use rand::Rng;

use crate::exact::{ExactRelaxation, Outcome};
use crate::microstate::Microstate;
use crate::rule::FiringRule;
use crate::sampled::SampledRelaxation;
use crate::sleep::SleepProbabilities;

/// Exact or sampled relaxation, fixed for the lifetime of a run.
#[derive(Debug)]
pub enum Relaxation {
    /// Exact outcome laws.
    Exact(ExactRelaxation),
    /// Empirical outcome laws from repeated trajectories.
    Sampled(SampledRelaxation),
}

impl Default for Relaxation {
    fn default() -> Self {
        Relaxation::Exact(ExactRelaxation::new())
    }
}

impl From<ExactRelaxation> for Relaxation {
    fn from(r: ExactRelaxation) -> Self {
        Relaxation::Exact(r)
    }
}

impl From<SampledRelaxation> for Relaxation {
    fn from(r: SampledRelaxation) -> Self {
        Relaxation::Sampled(r)
    }
}

impl Relaxation {
    /// `true` for exact relaxation.
    pub fn is_exact(&self) -> bool {
        matches!(self, Relaxation::Exact(_))
    }

    /// `"exact"` or `"sampled"`.
    pub fn mode_name(&self) -> &'static str {
        match self {
            Relaxation::Exact(_) => "exact",
            Relaxation::Sampled(_) => "sampled",
        }
    }

    /// The firing rule in use.
    pub fn rule(&self) -> &dyn FiringRule {
        match self {
            Relaxation::Exact(r) => r.rule(),
            Relaxation::Sampled(r) => r.rule(),
        }
    }

    /// Law of the stable outcome from `start`.
    ///
    /// Exact mode ignores `rng`. Sampled mode draws
    /// [`SampledRelaxation::samples`] trajectories and reports their
    /// empirical frequencies in order of first appearance; `topplings` is
    /// then the total over all trajectories.
    pub fn outcome<R: Rng + ?Sized>(
        &self,
        graph: &Graph,
        sleep: &SleepProbabilities,
        start: &Microstate,
        rng: &mut R,
    ) -> Result<Outcome, RelaxationError> {
        match self {
            Relaxation::Exact(exact) => exact.relax(graph, sleep, start),
            Relaxation::Sampled(sampled) => {
                let n = sampled.samples();
                let mut counts: IndexMap<Configuration, u32> = IndexMap::new();
                let mut topplings = 0u64;
                for _ in 0..n {
                    let t = sampled.sample(graph, sleep, start, rng)?;
                    topplings = topplings.saturating_add(t.topplings);
                    *counts.entry(t.configuration).or_insert(0) += 1;
                }
                let branches = counts
                    .into_iter()
                    .map(|(c, k)| (c, k as f64 / n as f64))
                    .collect();
                Ok(Outcome {
                    branches,
                    topplings,
                })
            }
        }
    }
}
