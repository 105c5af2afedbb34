//! Microscopic states: configurations with active/asleep bookkeeping.
//!
//! A [`Configuration`] only records counts because, once stable, every
//! particle is asleep. During relaxation we need to know which particles
//! are still active, so the engine works on [`Microstate`]s and collapses
//! them back to configurations once nothing is active.

use std::fmt;

use arw_core::{ConfigurationError, VertexId};
use arw_graph::{Configuration, Counts, Graph};
use smallvec::SmallVec;

/// Contents of one non-sink vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Site {
    /// No particle.
    Empty,
    /// Exactly one particle, asleep.
    Sleeping,
    /// `n >= 1` active particles.
    Active(u32),
}

impl Site {
    /// Number of particles on the site.
    #[inline]
    pub fn particles(self) -> u32 {
        match self {
            Site::Empty => 0,
            Site::Sleeping => 1,
            Site::Active(n) => n,
        }
    }

    /// The site after one particle arrives. A sleeper is woken, so it
    /// and the newcomer are both active.
    #[inline]
    pub fn receive(self) -> Site {
        match self {
            Site::Empty => Site::Active(1),
            Site::Sleeping => Site::Active(2),
            Site::Active(n) => Site::Active(n.saturating_add(1)),
        }
    }
}

/// Rank-indexed sites of a configuration in the middle of relaxation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Microstate {
    sites: SmallVec<[Site; 8]>,
}

impl Microstate {
    /// A configuration at rest: single particles are asleep. Sites with
    /// two or more particles cannot sleep and are active.
    pub fn resting(config: &Configuration) -> Self {
        let sites = config
            .counts()
            .iter()
            .map(|&c| match c {
                0 => Site::Empty,
                1 => Site::Sleeping,
                n => Site::Active(n),
            })
            .collect();
        Self { sites }
    }

    /// Every particle of `config` active, as in a freshly placed seed.
    pub fn activated(config: &Configuration) -> Self {
        let sites = config
            .counts()
            .iter()
            .map(|&c| if c == 0 { Site::Empty } else { Site::Active(c) })
            .collect();
        Self { sites }
    }

    /// `config` at rest with one extra active particle at `rank`, which
    /// wakes a sleeper there. Pure: `config` is not modified.
    ///
    /// # Panics
    ///
    /// Panics if `rank` is out of range.
    pub fn add_particle(config: &Configuration, rank: usize) -> Self {
        let mut state = Self::resting(config);
        state.arrive(rank);
        state
    }

    /// Sites in rank order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Site at a rank.
    #[inline]
    pub fn site(&self, rank: usize) -> Site {
        self.sites[rank]
    }

    /// `true` when no particle is active.
    pub fn is_stable(&self) -> bool {
        self.sites.iter().all(|s| !matches!(s, Site::Active(_)))
    }

    /// Total number of particles, active or asleep.
    pub fn total(&self) -> u64 {
        self.sites.iter().map(|s| s.particles() as u64).sum()
    }

    /// Copy of this state with `rank` replaced by `site`.
    pub fn with_site(&self, rank: usize, site: Site) -> Self {
        let mut next = self.clone();
        next.sites[rank] = site;
        next
    }

    /// One particle arrives at `rank`.
    pub fn arrive(&mut self, rank: usize) {
        self.sites[rank] = self.sites[rank].receive();
    }

    /// Particle counts, discarding the active/asleep distinction.
    pub fn to_configuration(&self) -> Configuration {
        let counts: Counts = self.sites.iter().map(|s| s.particles()).collect();
        Configuration::from_ranked(counts)
    }
}

impl fmt::Display for Microstate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, s) in self.sites.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match s {
                Site::Empty => write!(f, "0")?,
                Site::Sleeping => write!(f, "s")?,
                Site::Active(n) => write!(f, "{n}a")?,
            }
        }
        write!(f, "]")
    }
}

/// `config` plus one active particle at `vertex`, validating the vertex.
///
/// This is the pre-relaxation intermediate state of an injection.
pub fn add_particle(
    graph: &Graph,
    config: &Configuration,
    vertex: VertexId,
) -> Result<Microstate, ConfigurationError> {
    if !graph.contains(vertex) {
        return Err(ConfigurationError::UnknownVertex { vertex });
    }
    let rank = graph
        .rank(vertex)
        .ok_or(ConfigurationError::SinkVertex { vertex })?;
    if config.len() != graph.non_sink_count() {
        return Err(ConfigurationError::LengthMismatch {
            expected: graph.non_sink_count(),
            found: config.len(),
        });
    }
    Ok(Microstate::add_particle(config, rank))
}
