//! In-memory form of a stored distribution.

use arw_graph::{Configuration, Graph};

use crate::error::PersistError;

/// A stationary distribution together with the graph facts needed to
/// validate it on load.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredDistribution {
    /// [`Graph::topology_hash`] of the graph it was solved on.
    pub topology_hash: u64,
    /// Number of vertices, sink included.
    pub vertex_count: u32,
    /// The sink vertex.
    pub sink: u32,
    /// Sleep probability per non-sink vertex, in rank order.
    pub sleep: Vec<f64>,
    /// Configuration index.
    pub states: Vec<Configuration>,
    /// `probabilities[i]` belongs to `states[i]`.
    pub probabilities: Vec<f64>,
}

impl StoredDistribution {
    /// Capture a solved distribution.
    pub fn new(
        graph: &Graph,
        sleep: &[f64],
        states: Vec<Configuration>,
        probabilities: Vec<f64>,
    ) -> Self {
        Self {
            topology_hash: graph.topology_hash(),
            vertex_count: graph.vertex_count() as u32,
            sink: graph.sink().0,
            sleep: sleep.to_vec(),
            states,
            probabilities,
        }
    }

    /// Fail unless this was solved on a graph with `graph`'s topology.
    pub fn check_graph(&self, graph: &Graph) -> Result<(), PersistError> {
        let current = graph.topology_hash();
        if current == self.topology_hash {
            Ok(())
        } else {
            Err(PersistError::GraphMismatch {
                recorded: self.topology_hash,
                current,
            })
        }
    }

    /// `(configuration, probability)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Configuration, f64)> + '_ {
        self.states.iter().zip(self.probabilities.iter().copied())
    }
}
