//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a vertex of the input graph.
///
/// Vertices are numbered `0..vertex_count` at graph construction. The
/// sink is an ordinary vertex id singled out by the graph; non-sink
/// vertices additionally carry a dense *rank* (see `arw-graph`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

impl VertexId {
    /// The id as a `usize` index into per-vertex tables.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VertexId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_index_agree() {
        let v = VertexId(7);
        assert_eq!(v.to_string(), "7");
        assert_eq!(v.index(), 7);
        assert_eq!(VertexId::from(7u32), v);
    }

    #[test]
    fn ordering_follows_raw_id() {
        let mut ids = vec![VertexId(3), VertexId(0), VertexId(2)];
        ids.sort();
        assert_eq!(ids, vec![VertexId(0), VertexId(2), VertexId(3)]);
    }
}
