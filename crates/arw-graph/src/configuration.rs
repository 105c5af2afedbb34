//! Canonical particle configurations.
//!
//! A [`Configuration`] stores one particle count per non-sink vertex,
//! indexed by rank. Because the representation is a plain rank-indexed
//! vector, two configurations are equal (and hash equally) exactly when
//! every vertex holds the same count, regardless of the order in which
//! particles arrived or the order in which counts were supplied.

use std::fmt;

use arw_core::{ConfigurationError, VertexId};
use smallvec::{smallvec, SmallVec};

use crate::graph::Graph;

/// Rank-indexed particle counts.
///
/// Inline storage covers graphs with up to 8 non-sink vertices, which is
/// where exact enumeration stays tractable anyway.
pub type Counts = SmallVec<[u32; 8]>;

/// A particle placement over the non-sink vertices of a graph.
///
/// Stable configurations (see [`is_stable`](Self::is_stable)) hold at
/// most one particle per vertex, and that particle is asleep. Larger
/// counts only appear in seeds that still have to be relaxed.
///
/// # Examples
///
/// ```
/// use arw_core::VertexId;
/// use arw_graph::{presets, Configuration};
///
/// let g = presets::path(3).unwrap(); // 0 - 1 - 2(sink)
/// let a = Configuration::encode(&g, [(VertexId(1), 1), (VertexId(0), 0)]).unwrap();
/// let b = Configuration::encode(&g, [(VertexId(1), 1)]).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "[0, s]");
/// assert!(a.is_stable());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Configuration {
    counts: Counts,
}

impl Configuration {
    /// Build a configuration from a vertex → count mapping.
    ///
    /// Vertices not mentioned hold zero particles. Fails if a count is
    /// negative, a vertex is unknown, the sink is given a count, or a
    /// vertex appears twice.
    pub fn encode<I>(graph: &Graph, counts: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (VertexId, i64)>,
    {
        let mut out: Counts = smallvec![0; graph.non_sink_count()];
        let mut given = vec![false; graph.non_sink_count()];
        for (vertex, count) in counts {
            if !graph.contains(vertex) {
                return Err(ConfigurationError::UnknownVertex { vertex });
            }
            let rank = graph
                .rank(vertex)
                .ok_or(ConfigurationError::SinkVertex { vertex })?;
            if count < 0 {
                return Err(ConfigurationError::NegativeCount { vertex, count });
            }
            if given[rank] {
                return Err(ConfigurationError::DuplicateVertex { vertex });
            }
            given[rank] = true;
            out[rank] =
                u32::try_from(count).map_err(|_| ConfigurationError::CountOverflow { vertex, count })?;
        }
        Ok(Self { counts: out })
    }

    /// Build from rank-indexed counts, checking the length against `graph`.
    pub fn from_ranked_counts(graph: &Graph, counts: &[u32]) -> Result<Self, ConfigurationError> {
        if counts.len() != graph.non_sink_count() {
            return Err(ConfigurationError::LengthMismatch {
                expected: graph.non_sink_count(),
                found: counts.len(),
            });
        }
        Ok(Self {
            counts: SmallVec::from_slice(counts),
        })
    }

    /// Wrap rank-indexed counts without a graph at hand.
    ///
    /// The caller guarantees `counts.len()` equals the non-sink count of
    /// the graph the configuration will be used with.
    pub fn from_ranked(counts: Counts) -> Self {
        Self { counts }
    }

    /// The configuration with no particles.
    pub fn empty(graph: &Graph) -> Self {
        Self {
            counts: smallvec![0; graph.non_sink_count()],
        }
    }

    /// All `n` particles on `vertex`.
    pub fn pile(graph: &Graph, vertex: VertexId, n: u32) -> Result<Self, ConfigurationError> {
        Self::encode(graph, [(vertex, n as i64)])
    }

    /// `n` particles dealt round-robin over the non-sink vertices in rank
    /// order. With `n == non_sink_count()` this is one particle per site.
    ///
    /// A graph with no non-sink vertices yields the empty configuration
    /// (there is nowhere to place particles).
    pub fn spread(graph: &Graph, n: u32) -> Self {
        let sites = graph.non_sink_count();
        let mut counts: Counts = smallvec![0; sites];
        if sites > 0 {
            let base = n / sites as u32;
            let extra = (n % sites as u32) as usize;
            for (rank, c) in counts.iter_mut().enumerate() {
                *c = base + u32::from(rank < extra);
            }
        }
        Self { counts }
    }

    /// Rank-indexed counts.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Count at a rank.
    ///
    /// # Panics
    ///
    /// Panics if `rank` is out of range.
    #[inline]
    pub fn count(&self, rank: usize) -> u32 {
        self.counts[rank]
    }

    /// Number of ranks (non-sink vertices).
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// `true` when the graph has no non-sink vertices.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of particles.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Number of vertices holding at least one particle.
    pub fn occupied(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// `true` if no vertex holds more than one particle.
    pub fn is_stable(&self) -> bool {
        self.counts.iter().all(|&c| c <= 1)
    }
}

/// Formats as `[0, s, 2]`: `0` for an empty site, `s` for a single
/// (sleeping) particle, the count otherwise.
impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, &c) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match c {
                1 => write!(f, "s")?,
                c => write!(f, "{c}")?,
            }
        }
        write!(f, "]")
    }
}
