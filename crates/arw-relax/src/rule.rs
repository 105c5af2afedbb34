//! Microscopic firing rules.

use std::fmt;

use arw_graph::{Configuration, Counts, Graph};
use smallvec::SmallVec;

use crate::microstate::{Microstate, Site};
use crate::sleep::{SleepProbabilities, SleepRegime};

/// Successor microstates of one firing with their probabilities.
pub type Branches = SmallVec<[(Microstate, f64); 8]>;

/// Result of asking a rule to fire once.
#[derive(Clone, Debug, PartialEq)]
pub enum Firing {
    /// No active particle remains.
    Stable,
    /// The next microstate is drawn from these branches. Probabilities
    /// are positive and sum to one; a branch never repeats the current
    /// state (no-op instructions are conditioned away by the rule).
    Branches(Branches),
    /// The only possible continuation is the current state itself, so
    /// relaxation can never finish.
    Stuck,
}

/// Closed-form outcome of a relaxation, when a rule can provide one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Analytic {
    /// Relaxation ends in this configuration with probability one.
    Settles(Configuration),
    /// Relaxation never ends.
    Diverges,
}

/// A microscopic toppling rule.
///
/// A rule picks which vertex fires next and lists the possible results.
/// The firing order must be a deterministic function of the state so
/// that sampled trajectories are reproducible from a seed.
pub trait FiringRule: fmt::Debug + Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Fire once from `state`.
    fn fire(&self, graph: &Graph, sleep: &SleepProbabilities, state: &Microstate) -> Firing;

    /// Closed-form outcome from `state`, if the rule knows one.
    ///
    /// Default: `None`, meaning the engine must enumerate or sample.
    fn analytic(
        &self,
        _graph: &Graph,
        _sleep: &SleepProbabilities,
        _state: &Microstate,
    ) -> Option<Analytic> {
        None
    }
}

/// The activated-random-walk rule.
///
/// The lowest-ranked vertex holding two or more particles fires first,
/// otherwise the lowest-ranked vertex holding one active particle. A
/// firing draws a sleep instruction with probability `q_v`, which puts
/// the particle to sleep only if it is alone, and otherwise moves one
/// particle to a neighbour chosen in proportion to edge multiplicity.
/// Particles moving onto the sink are removed.
///
/// At a vertex with several particles the sleep instruction is a no-op,
/// so the rule conditions on the jump instead of emitting a self-loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArwRule;

impl ArwRule {
    fn pick(state: &Microstate) -> Option<(usize, u32)> {
        let sites = state.sites();
        sites
            .iter()
            .position(|s| matches!(s, Site::Active(n) if *n >= 2))
            .or_else(|| sites.iter().position(|s| matches!(s, Site::Active(1))))
            .map(|rank| (rank, sites[rank].particles()))
    }
}

impl FiringRule for ArwRule {
    fn name(&self) -> &str {
        "arw"
    }

    fn fire(&self, graph: &Graph, sleep: &SleepProbabilities, state: &Microstate) -> Firing {
        let Some((rank, n)) = Self::pick(state) else {
            return Firing::Stable;
        };
        let q = sleep.get(rank);
        let mut branches = Branches::new();

        let jump_mass = if n >= 2 {
            if q >= 1.0 {
                return Firing::Stuck;
            }
            1.0
        } else {
            if q > 0.0 {
                branches.push((state.with_site(rank, Site::Sleeping), q));
            }
            1.0 - q
        };

        if jump_mass > 0.0 {
            let v = graph.vertex_at_rank(rank);
            let total = graph.out_weight(v) as f64;
            let left = if n >= 2 {
                Site::Active(n - 1)
            } else {
                Site::Empty
            };
            for &(u, w) in graph.neighbours(v) {
                let mut next = state.with_site(rank, left);
                if let Some(r) = graph.rank(u) {
                    next.arrive(r);
                }
                branches.push((next, jump_mass * w as f64 / total));
            }
        }
        Firing::Branches(branches)
    }

    fn analytic(
        &self,
        graph: &Graph,
        sleep: &SleepProbabilities,
        state: &Microstate,
    ) -> Option<Analytic> {
        match sleep.regime() {
            // Particles never sleep, but a sleeper the walkers never visit
            // stays put, so only states without sleepers are closed-form.
            SleepRegime::Never => {
                let has_sleepers = state.sites().iter().any(|s| *s == Site::Sleeping);
                (!has_sleepers).then(|| Analytic::Settles(Configuration::empty(graph)))
            }
            // Nothing ever moves: singles fall asleep in place, piles are stuck.
            SleepRegime::Always => {
                if state
                    .sites()
                    .iter()
                    .any(|s| matches!(s, Site::Active(n) if *n >= 2))
                {
                    Some(Analytic::Diverges)
                } else {
                    let counts: Counts = state.sites().iter().map(|s| s.particles()).collect();
                    Some(Analytic::Settles(Configuration::from_ranked(counts)))
                }
            }
            SleepRegime::Mixed => None,
        }
    }
}
