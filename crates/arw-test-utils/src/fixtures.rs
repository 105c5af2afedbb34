//! Graph fixtures and broken firing rules.
//!
//! - [`triangle`]: two non-sink vertices and the sink, all adjacent.
//! - [`path3`]: `A - B - sink`.
//! - [`ShuttleRule`]: moves a particle back and forth forever.
//! - [`StuckRule`]: reports every unstable state as stuck.

use arw_graph::{presets, Graph};
use arw_relax::{Branches, Firing, FiringRule, Microstate, Site, SleepProbabilities};

/// Vertices 0 and 1 plus the sink 2, pairwise adjacent.
pub fn triangle() -> Graph {
    presets::clique(3).expect("triangle is a valid graph")
}

/// `0 - 1 - 2`, with 2 the sink.
pub fn path3() -> Graph {
    presets::path(3).expect("path is a valid graph")
}

/// A rule that never stabilises: the lowest active particle hops between
/// ranks 0 and 1 and is never absorbed or put to sleep.
///
/// Needs at least two non-sink vertices.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShuttleRule;

impl FiringRule for ShuttleRule {
    fn name(&self) -> &str {
        "shuttle"
    }

    fn fire(&self, _graph: &Graph, _sleep: &SleepProbabilities, state: &Microstate) -> Firing {
        let Some(rank) = state
            .sites()
            .iter()
            .position(|s| matches!(s, Site::Active(_)))
        else {
            return Firing::Stable;
        };
        let left = match state.site(rank) {
            Site::Active(n) if n > 1 => Site::Active(n - 1),
            _ => Site::Empty,
        };
        let mut next = state.with_site(rank, left);
        next.arrive(if rank == 0 { 1 } else { 0 });
        let mut branches = Branches::new();
        branches.push((next, 1.0));
        Firing::Branches(branches)
    }
}

/// A rule that claims every unstable state can only repeat itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct StuckRule;

impl FiringRule for StuckRule {
    fn name(&self) -> &str {
        "stuck"
    }

    fn fire(&self, _graph: &Graph, _sleep: &SleepProbabilities, state: &Microstate) -> Firing {
        if state.is_stable() {
            Firing::Stable
        } else {
            Firing::Stuck
        }
    }
}
