//! Small named graphs. In every preset the last vertex is the sink.
//!
//! Sizes count vertices including the sink. A size of zero is rejected
//! by the builder as an empty graph.

use arw_core::{GraphError, VertexId};

use crate::graph::{Graph, GraphBuilder};

/// Path `0 - 1 - ... - (n-1)`.
pub fn path(n: u32) -> Result<Graph, GraphError> {
    let mut b = GraphBuilder::new(n);
    for i in 1..n {
        b = b.edge(VertexId(i - 1), VertexId(i));
    }
    b.sink(VertexId(n.saturating_sub(1))).build()
}

/// Cycle on `n` vertices. Below three vertices the cycle degenerates to
/// the path (a 2-cycle is a single simple edge).
pub fn cycle(n: u32) -> Result<Graph, GraphError> {
    if n < 3 {
        return path(n);
    }
    let mut b = GraphBuilder::new(n);
    for i in 0..n {
        b = b.edge(VertexId(i), VertexId((i + 1) % n));
    }
    b.sink(VertexId(n - 1)).build()
}

/// Complete graph on `n` vertices.
pub fn clique(n: u32) -> Result<Graph, GraphError> {
    let mut b = GraphBuilder::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            b = b.edge(VertexId(i), VertexId(j));
        }
    }
    b.sink(VertexId(n.saturating_sub(1))).build()
}

/// Star with centre `0` and leaves `1..n`; the last leaf is the sink.
pub fn star(n: u32) -> Result<Graph, GraphError> {
    let mut b = GraphBuilder::new(n);
    for i in 1..n {
        b = b.edge(VertexId(0), VertexId(i));
    }
    b.sink(VertexId(n.saturating_sub(1))).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_degrees() {
        let g = path(4).unwrap();
        assert_eq!(g.out_weight(VertexId(0)), 1);
        assert_eq!(g.out_weight(VertexId(1)), 2);
        assert_eq!(g.sink(), VertexId(3));
    }

    #[test]
    fn small_cycles_are_paths() {
        assert_eq!(cycle(2).unwrap(), path(2).unwrap());
        let c3 = cycle(3).unwrap();
        assert_eq!(c3, clique(3).unwrap());
    }

    #[test]
    fn cycle_is_two_regular() {
        let g = cycle(5).unwrap();
        for v in 0..5 {
            assert_eq!(g.out_weight(VertexId(v)), 2);
        }
    }

    #[test]
    fn clique_degrees() {
        let g = clique(4).unwrap();
        for v in 0..4 {
            assert_eq!(g.out_weight(VertexId(v)), 3);
        }
        assert_eq!(g.non_sink_count(), 3);
    }

    #[test]
    fn star_centre_is_hub() {
        let g = star(5).unwrap();
        assert_eq!(g.out_weight(VertexId(0)), 4);
        assert_eq!(g.out_weight(VertexId(2)), 1);
        assert_eq!(g.sink(), VertexId(4));
    }

    #[test]
    fn zero_size_is_empty() {
        assert_eq!(path(0), Err(GraphError::Empty));
        assert_eq!(clique(0), Err(GraphError::Empty));
    }
}
