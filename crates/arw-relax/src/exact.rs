//! Exact relaxation: the full law of the stable outcome.
//!
//! Starting from an unstable microstate, the reachable microscopic chain
//! is finite (particles are never created, the sink only removes them).
//! We enumerate it breadth-first, then solve for the expected number of
//! visits to each transient microstate,
//!
//! ```text
//! (I - P_TT)^T y = e_start
//! ```
//!
//! and read off the absorption probability of each stable microstate as
//! `sum_t y_t P(t, a)`.
//!
//! Small systems are solved by dense LU. Larger ones use Gauss-Seidel
//! sweeps over the sparse rows in enumeration order, which converge
//! because every transient microstate can reach a stable one.

use std::collections::VecDeque;

use arw_core::RelaxationError;
use arw_graph::{Configuration, Graph};
use indexmap::IndexSet;
use nalgebra::{DMatrix, DVector};
use smallvec::SmallVec;

use crate::microstate::Microstate;
use crate::rule::{Analytic, ArwRule, FiringRule, Firing};
use crate::sleep::SleepProbabilities;

/// Absorption mass may deviate from one by at most this much before the
/// relaxation is reported as divergent.
const MASS_TOLERANCE: f64 = 1e-9;

/// Largest transient system solved densely.
const DENSE_LIMIT: usize = 256;

/// Gauss-Seidel stops once no expected visit count changes by more than
/// this, relative to its size.
const SWEEP_TOLERANCE: f64 = 1e-14;

const MAX_SWEEPS: usize = 100_000;

/// Stable outcomes of one relaxation with their probabilities.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    /// Distinct stable configurations and their probabilities, in order of
    /// discovery. Probabilities are positive and sum to one.
    pub branches: Vec<(Configuration, f64)>,
    /// Work spent: microstates enumerated (0 for closed-form outcomes).
    pub topplings: u64,
}

impl Outcome {
    /// A deterministic outcome.
    pub fn certain(config: Configuration) -> Self {
        Self {
            branches: vec![(config, 1.0)],
            topplings: 0,
        }
    }
}

/// Exact relaxation strategy.
///
/// # Examples
///
/// ```
/// use arw_graph::{presets, Configuration};
/// use arw_relax::{ExactRelaxation, Microstate, SleepProbabilities};
///
/// // One non-sink vertex: an injected particle sleeps with probability q.
/// let g = presets::path(2).unwrap();
/// let sleep = SleepProbabilities::uniform(&g, 0.25).unwrap();
/// let start = Microstate::add_particle(&Configuration::empty(&g), 0);
/// let out = ExactRelaxation::new().relax(&g, &sleep, &start).unwrap();
/// assert_eq!(out.branches.len(), 2);
/// let asleep = out.branches.iter().find(|(c, _)| c.total() == 1).unwrap();
/// assert!((asleep.1 - 0.25).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct ExactRelaxation {
    rule: Box<dyn FiringRule>,
    max_microstates: u64,
}

impl Default for ExactRelaxation {
    fn default() -> Self {
        Self::new()
    }
}

impl ExactRelaxation {
    /// Default cap on enumerated microstates per relaxation.
    pub const DEFAULT_MAX_MICROSTATES: u64 = 1 << 16;

    /// Exact relaxation under [`ArwRule`].
    pub fn new() -> Self {
        Self {
            rule: Box::new(ArwRule),
            max_microstates: Self::DEFAULT_MAX_MICROSTATES,
        }
    }

    /// Replace the firing rule.
    pub fn with_rule(mut self, rule: Box<dyn FiringRule>) -> Self {
        self.rule = rule;
        self
    }

    /// Cap the number of microstates a single relaxation may enumerate.
    /// Exceeding it reports [`RelaxationError::EnumerationLimit`].
    pub fn max_microstates(mut self, max: u64) -> Self {
        self.max_microstates = max.max(1);
        self
    }

    /// The firing rule in use.
    pub fn rule(&self) -> &dyn FiringRule {
        self.rule.as_ref()
    }

    /// Relax `start` to the exact distribution of stable outcomes.
    pub fn relax(
        &self,
        graph: &Graph,
        sleep: &SleepProbabilities,
        start: &Microstate,
    ) -> Result<Outcome, RelaxationError> {
        if start.is_stable() {
            return Ok(Outcome::certain(start.to_configuration()));
        }
        match self.rule.analytic(graph, sleep, start) {
            Some(Analytic::Settles(config)) => return Ok(Outcome::certain(config)),
            Some(Analytic::Diverges) => return Err(diverged(start, 0)),
            None => {}
        }

        let chain = self.enumerate(graph, sleep, start)?;
        chain.check_absorbing_reachable(start)?;
        let outcome = chain.absorption(start)?;
        log::trace!(
            "relaxed {start}: {} microstates, {} outcomes",
            outcome.topplings,
            outcome.branches.len()
        );
        Ok(outcome)
    }

    fn enumerate(
        &self,
        graph: &Graph,
        sleep: &SleepProbabilities,
        start: &Microstate,
    ) -> Result<MicroChain, RelaxationError> {
        let mut states: IndexSet<Microstate> = IndexSet::new();
        states.insert(start.clone());
        let mut edges: Vec<SmallVec<[(usize, f64); 8]>> = Vec::new();
        let mut stable: Vec<bool> = Vec::new();

        let mut cursor = 0;
        while cursor < states.len() {
            if states.len() as u64 > self.max_microstates {
                return Err(RelaxationError::EnumerationLimit {
                    start: start.to_string(),
                    vertex: None,
                    limit: self.max_microstates,
                });
            }
            let state = states[cursor].clone();
            let mut row = SmallVec::new();
            match self.rule.fire(graph, sleep, &state) {
                Firing::Stable => stable.push(true),
                Firing::Stuck => return Err(diverged(start, states.len() as u64)),
                Firing::Branches(branches) => {
                    stable.push(false);
                    for (next, p) in branches {
                        if p > 0.0 {
                            let (j, _) = states.insert_full(next);
                            row.push((j, p));
                        }
                    }
                }
            }
            edges.push(row);
            cursor += 1;
        }
        Ok(MicroChain {
            states,
            edges,
            stable,
        })
    }
}

/// The enumerated microscopic chain. Index 0 is the start state.
struct MicroChain {
    states: IndexSet<Microstate>,
    edges: Vec<SmallVec<[(usize, f64); 8]>>,
    stable: Vec<bool>,
}

impl MicroChain {
    /// Every enumerated state must be able to reach a stable one, else some
    /// trajectories never end.
    fn check_absorbing_reachable(&self, start: &Microstate) -> Result<(), RelaxationError> {
        let n = self.states.len();
        let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, row) in self.edges.iter().enumerate() {
            for &(j, _) in row {
                reverse[j].push(i);
            }
        }
        let mut seen = vec![false; n];
        let mut queue: VecDeque<usize> = VecDeque::new();
        for (i, &s) in self.stable.iter().enumerate() {
            if s {
                seen[i] = true;
                queue.push_back(i);
            }
        }
        while let Some(j) = queue.pop_front() {
            for &i in &reverse[j] {
                if !seen[i] {
                    seen[i] = true;
                    queue.push_back(i);
                }
            }
        }
        if seen.iter().all(|&s| s) {
            Ok(())
        } else {
            Err(diverged(start, n as u64))
        }
    }

    fn absorption(&self, start: &Microstate) -> Result<Outcome, RelaxationError> {
        let n = self.states.len();
        let mut dense = vec![usize::MAX; n];
        let mut transient = Vec::new();
        for i in 0..n {
            if !self.stable[i] {
                dense[i] = transient.len();
                transient.push(i);
            }
        }
        let visits = if transient.len() <= DENSE_LIMIT {
            self.visits_dense(&transient, &dense)
        } else {
            self.visits_sparse(&transient, &dense)
        }
        .ok_or_else(|| diverged(start, n as u64))?;

        let mut mass = vec![0.0; n];
        for (ti, &i) in transient.iter().enumerate() {
            for &(j, p) in &self.edges[i] {
                if self.stable[j] {
                    mass[j] += visits[ti] * p;
                }
            }
        }

        let total: f64 = mass.iter().filter(|&&m| m > 0.0).sum();
        if !total.is_finite() || (total - 1.0).abs() > MASS_TOLERANCE {
            return Err(diverged(start, n as u64));
        }
        let branches = mass
            .iter()
            .enumerate()
            .filter(|&(_, &m)| m > 0.0)
            .map(|(j, &m)| (self.states[j].to_configuration(), m / total))
            .collect();
        Ok(Outcome {
            branches,
            topplings: n as u64,
        })
    }

    /// Expected visits by dense LU of `(I - P_TT)^T`.
    fn visits_dense(&self, transient: &[usize], dense: &[usize]) -> Option<Vec<f64>> {
        let t = transient.len();
        let mut a = DMatrix::<f64>::identity(t, t);
        for (ti, &i) in transient.iter().enumerate() {
            for &(j, p) in &self.edges[i] {
                if !self.stable[j] {
                    a[(dense[j], ti)] -= p;
                }
            }
        }
        let mut b = DVector::<f64>::zeros(t);
        b[dense[0]] = 1.0;
        a.lu().solve(&b).map(|y| y.iter().copied().collect())
    }

    /// Expected visits by Gauss-Seidel on `y = e_start + P_TT^T y`.
    fn visits_sparse(&self, transient: &[usize], dense: &[usize]) -> Option<Vec<f64>> {
        let t = transient.len();
        let mut incoming: Vec<SmallVec<[(usize, f64); 8]>> = vec![SmallVec::new(); t];
        for (ti, &i) in transient.iter().enumerate() {
            for &(j, p) in &self.edges[i] {
                if !self.stable[j] {
                    incoming[dense[j]].push((ti, p));
                }
            }
        }
        let source = dense[0];
        let mut y = vec![0.0; t];
        for sweep in 0..MAX_SWEEPS {
            let mut change = 0.0f64;
            for tj in 0..t {
                let mut v = if tj == source { 1.0 } else { 0.0 };
                for &(ti, p) in &incoming[tj] {
                    v += y[ti] * p;
                }
                if !v.is_finite() {
                    return None;
                }
                change = change.max((v - y[tj]).abs() / v.max(1.0));
                y[tj] = v;
            }
            if change <= SWEEP_TOLERANCE {
                log::trace!("absorption converged after {} sweeps over {t} states", sweep + 1);
                return Some(y);
            }
        }
        log::debug!("absorption sweeps exhausted over {t} states");
        Some(y)
    }
}

fn diverged(start: &Microstate, topplings: u64) -> RelaxationError {
    RelaxationError::Diverged {
        start: start.to_string(),
        vertex: None,
        topplings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::microstate::Site;
    use crate::rule::Branches;
    use arw_graph::presets;
    use smallvec::SmallVec;

    fn resting(counts: &[u32]) -> Configuration {
        Configuration::from_ranked(SmallVec::from_slice(counts))
    }

    fn prob_of(out: &Outcome, counts: &[u32]) -> f64 {
        out.branches
            .iter()
            .find(|(c, _)| c.counts() == counts)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    /// Moves every active particle one rank to the right, wrapping, and
    /// never lets it sleep or leave.
    #[derive(Debug)]
    struct Carousel;

    impl FiringRule for Carousel {
        fn name(&self) -> &str {
            "carousel"
        }

        fn fire(&self, _: &Graph, _: &SleepProbabilities, state: &Microstate) -> Firing {
            let sites = state.sites();
            let Some(r) = sites.iter().position(|s| matches!(s, Site::Active(_))) else {
                return Firing::Stable;
            };
            let mut next = state.with_site(r, Site::Empty);
            next.arrive((r + 1) % sites.len());
            let mut b = Branches::new();
            b.push((next, 1.0));
            Firing::Branches(b)
        }
    }

    #[test]
    fn single_site_sleeps_with_probability_q() {
        let g = presets::path(2).unwrap();
        let sleep = SleepProbabilities::uniform(&g, 0.3).unwrap();
        let exact = ExactRelaxation::new();

        let from_empty = Microstate::add_particle(&resting(&[0]), 0);
        let out = exact.relax(&g, &sleep, &from_empty).unwrap();
        assert!((prob_of(&out, &[1]) - 0.3).abs() < 1e-12);
        assert!((prob_of(&out, &[0]) - 0.7).abs() < 1e-12);

        // Waking the sleeper: one particle must leave first, then the
        // survivor is alone again.
        let from_full = Microstate::add_particle(&resting(&[1]), 0);
        let out = exact.relax(&g, &sleep, &from_full).unwrap();
        assert!((prob_of(&out, &[1]) - 0.3).abs() < 1e-12);
        assert!((prob_of(&out, &[0]) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn path_with_back_and_forth_walks() {
        // 0 - 1 - 2(sink), particle injected at 0 with q = 1/2. From 0 it
        // sleeps or steps to 1; from 1 it sleeps (1/2), steps back (1/4) or
        // leaves (1/4). Writing a, b for "ends asleep at 0" from 0 and 1:
        //   a = 1/2 + b/2, b = a/4  ->  a = 4/7
        // and likewise "ends asleep at 1" comes to 2/7.
        let g = presets::path(3).unwrap();
        let sleep = SleepProbabilities::uniform(&g, 0.5).unwrap();
        let start = Microstate::add_particle(&resting(&[0, 0]), 0);
        let out = ExactRelaxation::new().relax(&g, &sleep, &start).unwrap();
        assert!((prob_of(&out, &[1, 0]) - 4.0 / 7.0).abs() < 1e-12);
        assert!((prob_of(&out, &[0, 1]) - 2.0 / 7.0).abs() < 1e-12);
        assert!((prob_of(&out, &[0, 0]) - 1.0 / 7.0).abs() < 1e-12);
        let total: f64 = out.branches.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(out.topplings > 0);
    }

    #[test]
    fn outcomes_are_stable_and_bounded() {
        let g = presets::clique(4).unwrap();
        let sleep = SleepProbabilities::uniform(&g, 0.4).unwrap();
        let seed = Microstate::activated(&Configuration::spread(&g, 3));
        let out = ExactRelaxation::new().relax(&g, &sleep, &seed).unwrap();
        for (c, p) in &out.branches {
            assert!(c.is_stable());
            assert!(c.total() <= 3);
            assert!(*p > 0.0);
        }
    }

    #[test]
    fn degenerate_regimes_are_closed_form() {
        let g = presets::path(3).unwrap();
        let never = SleepProbabilities::uniform(&g, 0.0).unwrap();
        let start = Microstate::activated(&resting(&[3, 1]));
        let out = ExactRelaxation::new().relax(&g, &never, &start).unwrap();
        assert_eq!(out, Outcome::certain(Configuration::empty(&g)));

        let always = SleepProbabilities::uniform(&g, 1.0).unwrap();
        let start = Microstate::add_particle(&resting(&[0, 1]), 0);
        let out = ExactRelaxation::new().relax(&g, &always, &start).unwrap();
        assert_eq!(out, Outcome::certain(resting(&[1, 1])));
    }

    #[test]
    fn stuck_pile_diverges() {
        let g = presets::path(3).unwrap();
        let always = SleepProbabilities::uniform(&g, 1.0).unwrap();
        let start = Microstate::add_particle(&resting(&[1, 0]), 0);
        let err = ExactRelaxation::new().relax(&g, &always, &start).unwrap_err();
        assert!(matches!(err, RelaxationError::Diverged { .. }));

        // Same via enumeration: vertex 0 always sleeps, vertex 1 never.
        let mixed = SleepProbabilities::new(&g, vec![1.0, 0.0]).unwrap();
        let err = ExactRelaxation::new().relax(&g, &mixed, &start).unwrap_err();
        assert!(matches!(err, RelaxationError::Diverged { .. }));
    }

    #[test]
    fn closed_non_absorbing_cycle_diverges() {
        let g = presets::cycle(4).unwrap();
        let sleep = SleepProbabilities::uniform(&g, 0.5).unwrap();
        let start = Microstate::add_particle(&resting(&[0, 0, 0]), 0);
        let exact = ExactRelaxation::new().with_rule(Box::new(Carousel));
        assert_eq!(exact.rule().name(), "carousel");
        let err = exact.relax(&g, &sleep, &start).unwrap_err();
        assert_eq!(
            err,
            RelaxationError::Diverged {
                start: "[1a, 0, 0]".into(),
                vertex: None,
                topplings: 3,
            }
        );
    }

    #[test]
    fn microstate_cap_is_an_enumeration_limit() {
        let g = presets::clique(5).unwrap();
        let sleep = SleepProbabilities::uniform(&g, 0.5).unwrap();
        let start = Microstate::activated(&Configuration::spread(&g, 4));
        let err = ExactRelaxation::new()
            .max_microstates(4)
            .relax(&g, &sleep, &start)
            .unwrap_err();
        assert_eq!(
            err,
            RelaxationError::EnumerationLimit {
                start: start.to_string(),
                vertex: None,
                limit: 4,
            }
        );
    }

    #[test]
    fn full_path_of_nine_relaxes_under_the_default_budget() {
        // Eight sleepers plus one injected particle enumerate well over
        // two thousand microstates.
        let g = presets::path(9).unwrap();
        let sleep = SleepProbabilities::uniform(&g, 0.5).unwrap();
        let full = Configuration::spread(&g, 8);
        let start = Microstate::add_particle(&full, 0);
        let out = ExactRelaxation::new().relax(&g, &sleep, &start).unwrap();
        assert!(out.topplings > 2048);
        let total: f64 = out.branches.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(out.branches.iter().all(|(c, _)| c.is_stable() && c.total() <= 8));
    }

    #[test]
    fn sparse_and_dense_visit_counts_agree() {
        let g = presets::clique(5).unwrap();
        let sleep = SleepProbabilities::uniform(&g, 0.35).unwrap();
        let start = Microstate::activated(&Configuration::spread(&g, 4));
        let chain = ExactRelaxation::new().enumerate(&g, &sleep, &start).unwrap();

        let mut dense = vec![usize::MAX; chain.states.len()];
        let mut transient = Vec::new();
        for i in 0..chain.states.len() {
            if !chain.stable[i] {
                dense[i] = transient.len();
                transient.push(i);
            }
        }
        let a = chain.visits_dense(&transient, &dense).unwrap();
        let b = chain.visits_sparse(&transient, &dense).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-9 * x.max(1.0), "{x} vs {y}");
        }
    }

    #[test]
    fn stable_start_is_returned_unchanged() {
        let g = presets::path(3).unwrap();
        let sleep = SleepProbabilities::uniform(&g, 0.5).unwrap();
        let start = Microstate::resting(&resting(&[1, 1]));
        let out = ExactRelaxation::new().relax(&g, &sleep, &start).unwrap();
        assert_eq!(out, Outcome::certain(resting(&[1, 1])));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn outcome_law_is_a_distribution(
                counts in proptest::collection::vec(0u32..=2, 3),
                q in 0.05f64..0.95,
                clique in any::<bool>(),
            ) {
                let g = if clique {
                    presets::clique(4).unwrap()
                } else {
                    presets::path(4).unwrap()
                };
                let sleep = SleepProbabilities::uniform(&g, q).unwrap();
                let start_config = resting(&counts);
                let start = Microstate::activated(&start_config);
                let out = ExactRelaxation::new().relax(&g, &sleep, &start).unwrap();

                let total: f64 = out.branches.iter().map(|(_, p)| p).sum();
                prop_assert!((total - 1.0).abs() < 1e-9);
                for (c, p) in &out.branches {
                    prop_assert!(c.is_stable());
                    prop_assert!(c.total() <= start_config.total());
                    prop_assert!(*p >= 0.0);
                }
            }
        }
    }
}
