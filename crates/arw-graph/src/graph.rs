//! The immutable graph model.

use std::collections::VecDeque;

use arw_core::{GraphError, VertexId};
use smallvec::SmallVec;

use crate::hash::{fnv1a_u32, FNV_OFFSET};

/// Out-neighbours of a vertex with their edge multiplicities, sorted by
/// neighbour id. Parallel edges are merged into one entry.
pub type Neighbours = SmallVec<[(VertexId, u32); 8]>;

/// A finite graph with weighted edges and exactly one sink.
///
/// Constructed through [`GraphBuilder`] (or [`Graph::from_adjacency`]),
/// which validates every structural invariant; a `Graph` value is
/// therefore always well-formed and is never mutated afterwards.
///
/// # Examples
///
/// ```
/// use arw_core::VertexId;
/// use arw_graph::Graph;
///
/// // Path 0 - 1 - 2 with vertex 2 as sink.
/// let g = Graph::builder(3)
///     .edge(VertexId(0), VertexId(1))
///     .edge(VertexId(1), VertexId(2))
///     .sink(VertexId(2))
///     .build()
///     .unwrap();
/// assert_eq!(g.non_sink_count(), 2);
/// assert_eq!(g.neighbours(VertexId(1)).len(), 2);
/// assert_eq!(g.rank(VertexId(2)), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    adjacency: Vec<Neighbours>,
    out_weight: Vec<u64>,
    sink: VertexId,
    rank_of: Vec<Option<usize>>,
    ranked: Vec<VertexId>,
}

impl Graph {
    /// Start building a graph with `vertex_count` vertices.
    pub fn builder(vertex_count: u32) -> GraphBuilder {
        GraphBuilder::new(vertex_count)
    }

    /// Build from adjacency lists. List `v` holds the out-neighbours of
    /// vertex `v`; a neighbour listed twice counts as a double edge. The
    /// last vertex is the sink.
    pub fn from_adjacency(lists: &[Vec<u32>]) -> Result<Self, GraphError> {
        let n = u32::try_from(lists.len()).map_err(|_| GraphError::VertexOutOfRange {
            vertex: VertexId(u32::MAX),
            vertex_count: u32::MAX,
        })?;
        if n == 0 {
            return Err(GraphError::Empty);
        }
        let mut builder = GraphBuilder::new(n).sink(VertexId(n - 1));
        for (v, list) in lists.iter().enumerate() {
            for &u in list {
                builder = builder.directed_edge(VertexId(v as u32), VertexId(u), 1);
            }
        }
        builder.build()
    }

    /// Total number of vertices, sink included.
    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of non-sink vertices (the length of every rank-indexed table).
    pub fn non_sink_count(&self) -> usize {
        self.ranked.len()
    }

    /// The sink vertex.
    pub fn sink(&self) -> VertexId {
        self.sink
    }

    /// `true` if `v` is the sink.
    #[inline]
    pub fn is_sink(&self, v: VertexId) -> bool {
        v == self.sink
    }

    /// `true` if `v` is a vertex of this graph.
    pub fn contains(&self, v: VertexId) -> bool {
        v.index() < self.adjacency.len()
    }

    /// Non-sink vertices in rank order.
    pub fn non_sink_vertices(&self) -> &[VertexId] {
        &self.ranked
    }

    /// Rank of a non-sink vertex, or `None` for the sink and unknown ids.
    #[inline]
    pub fn rank(&self, v: VertexId) -> Option<usize> {
        self.rank_of.get(v.index()).copied().flatten()
    }

    /// The non-sink vertex holding rank `rank`.
    ///
    /// # Panics
    ///
    /// Panics if `rank >= non_sink_count()`.
    #[inline]
    pub fn vertex_at_rank(&self, rank: usize) -> VertexId {
        self.ranked[rank]
    }

    /// Out-neighbours of `v` with multiplicities, sorted by id.
    ///
    /// # Panics
    ///
    /// Panics if `v` is not a vertex of this graph.
    #[inline]
    pub fn neighbours(&self, v: VertexId) -> &[(VertexId, u32)] {
        &self.adjacency[v.index()]
    }

    /// Sum of out-edge multiplicities of `v`.
    #[inline]
    pub fn out_weight(&self, v: VertexId) -> u64 {
        self.out_weight[v.index()]
    }

    /// Deterministic FNV-1a fingerprint of the topology (vertex count,
    /// sink, and every weighted adjacency entry in order).
    pub fn topology_hash(&self) -> u64 {
        let mut hash = FNV_OFFSET;
        hash = fnv1a_u32(hash, self.adjacency.len() as u32);
        hash = fnv1a_u32(hash, self.sink.0);
        for (v, list) in self.adjacency.iter().enumerate() {
            // Fold in the vertex index at each boundary.
            hash = fnv1a_u32(hash, v as u32);
            for &(u, w) in list {
                hash = fnv1a_u32(hash, u.0);
                hash = fnv1a_u32(hash, w);
            }
        }
        hash
    }
}

/// Builder for [`Graph`].
///
/// Collects edges and the sink designation; every check happens in
/// [`build`](Self::build), which reports the first problem found.
#[derive(Clone, Debug)]
pub struct GraphBuilder {
    vertex_count: u32,
    edges: Vec<(VertexId, VertexId, u32)>,
    sinks: Vec<VertexId>,
}

impl GraphBuilder {
    /// A builder for a graph on `vertex_count` vertices and no edges.
    pub fn new(vertex_count: u32) -> Self {
        Self {
            vertex_count,
            edges: Vec::new(),
            sinks: Vec::new(),
        }
    }

    /// Add an undirected edge of multiplicity 1.
    pub fn edge(self, a: VertexId, b: VertexId) -> Self {
        self.weighted_edge(a, b, 1)
    }

    /// Add an undirected edge of multiplicity `weight`.
    pub fn weighted_edge(mut self, a: VertexId, b: VertexId, weight: u32) -> Self {
        self.edges.push((a, b, weight));
        self.edges.push((b, a, weight));
        self
    }

    /// Add a directed edge `from -> to` of multiplicity `weight`.
    pub fn directed_edge(mut self, from: VertexId, to: VertexId, weight: u32) -> Self {
        self.edges.push((from, to, weight));
        self
    }

    /// Designate the sink. Designating twice is an error at build time.
    pub fn sink(mut self, v: VertexId) -> Self {
        self.sinks.push(v);
        self
    }

    /// Validate and build the graph.
    pub fn build(self) -> Result<Graph, GraphError> {
        let n = self.vertex_count;
        if n == 0 {
            return Err(GraphError::Empty);
        }
        let sink = match self.sinks.as_slice() {
            [] => return Err(GraphError::MissingSink),
            [s] => *s,
            [first, second, ..] => {
                return Err(GraphError::DuplicateSink {
                    first: *first,
                    second: *second,
                })
            }
        };
        let in_range = |v: VertexId| -> Result<(), GraphError> {
            if v.0 < n {
                Ok(())
            } else {
                Err(GraphError::VertexOutOfRange {
                    vertex: v,
                    vertex_count: n,
                })
            }
        };
        in_range(sink)?;

        let mut raw: Vec<Vec<(VertexId, u32)>> = vec![Vec::new(); n as usize];
        for &(from, to, weight) in &self.edges {
            in_range(from)?;
            in_range(to)?;
            if from == to {
                return Err(GraphError::SelfLoop { vertex: from });
            }
            if weight == 0 {
                return Err(GraphError::ZeroWeight { from, to });
            }
            raw[from.index()].push((to, weight));
        }

        let mut adjacency: Vec<Neighbours> = Vec::with_capacity(n as usize);
        let mut out_weight = Vec::with_capacity(n as usize);
        for mut list in raw {
            list.sort_by_key(|&(u, _)| u);
            let mut merged = Neighbours::new();
            for (u, w) in list {
                match merged.last_mut() {
                    Some((last, acc)) if *last == u => *acc = acc.saturating_add(w),
                    _ => merged.push((u, w)),
                }
            }
            out_weight.push(merged.iter().map(|&(_, w)| w as u64).sum());
            adjacency.push(merged);
        }

        check_sink_reachable(&adjacency, sink)?;

        let mut rank_of = vec![None; n as usize];
        let mut ranked = Vec::with_capacity(n as usize - 1);
        for v in 0..n {
            let v = VertexId(v);
            if v != sink {
                rank_of[v.index()] = Some(ranked.len());
                ranked.push(v);
            }
        }

        Ok(Graph {
            adjacency,
            out_weight,
            sink,
            rank_of,
            ranked,
        })
    }
}

/// Reverse BFS from the sink; every vertex must be reached.
fn check_sink_reachable(adjacency: &[Neighbours], sink: VertexId) -> Result<(), GraphError> {
    let n = adjacency.len();
    let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (v, list) in adjacency.iter().enumerate() {
        for &(u, _) in list {
            reverse[u.index()].push(v);
        }
    }
    let mut seen = vec![false; n];
    let mut queue = VecDeque::new();
    seen[sink.index()] = true;
    queue.push_back(sink.index());
    while let Some(v) = queue.pop_front() {
        for &u in &reverse[v] {
            if !seen[u] {
                seen[u] = true;
                queue.push_back(u);
            }
        }
    }
    match seen.iter().position(|&s| !s) {
        Some(v) => Err(GraphError::SinkUnreachable {
            vertex: VertexId(v as u32),
        }),
        None => Ok(()),
    }
}
