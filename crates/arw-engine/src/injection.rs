//! Where the driving particle is injected.

use arw_graph::Graph;

use crate::error::ExploreError;

/// Distribution of the injection vertex over the non-sink vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Injection {
    /// Every non-sink vertex equally likely.
    #[default]
    Uniform,
    /// One non-negative weight per non-sink vertex, in rank order.
    /// Normalised before use; zero weights never inject.
    Weighted(Vec<f64>),
}

impl Injection {
    /// `(rank, probability)` for every vertex with positive probability,
    /// in rank order. Empty for a graph without non-sink vertices.
    pub fn resolve(&self, graph: &Graph) -> Result<Vec<(usize, f64)>, ExploreError> {
        let n = graph.non_sink_count();
        match self {
            Injection::Uniform => Ok((0..n).map(|r| (r, 1.0 / n as f64)).collect()),
            Injection::Weighted(weights) => {
                if weights.len() != n {
                    return Err(ExploreError::InvalidInjection {
                        reason: format!("expected {n} weights, got {}", weights.len()),
                    });
                }
                if let Some((rank, w)) = weights
                    .iter()
                    .enumerate()
                    .find(|(_, w)| !w.is_finite() || **w < 0.0)
                {
                    return Err(ExploreError::InvalidInjection {
                        reason: format!("weight {w} at rank {rank} is not a finite non-negative number"),
                    });
                }
                let total: f64 = weights.iter().sum();
                if n > 0 && total <= 0.0 {
                    return Err(ExploreError::InvalidInjection {
                        reason: "weights sum to zero".into(),
                    });
                }
                Ok(weights
                    .iter()
                    .enumerate()
                    .filter(|(_, w)| **w > 0.0)
                    .map(|(r, w)| (r, w / total))
                    .collect())
            }
        }
    }
}
