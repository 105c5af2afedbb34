//! Per-vertex sleep probabilities and the regime they imply.

use arw_core::RelaxationError;
use arw_graph::Graph;

/// Classification of a set of sleep probabilities.
///
/// The two degenerate regimes make relaxation deterministic, which lets
/// [`ExactRelaxation`](crate::ExactRelaxation) skip enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SleepRegime {
    /// Every probability is 0: particles never sleep and all of them
    /// eventually leave through the sink.
    Never,
    /// Every probability is 1: a lone particle falls asleep where it
    /// lands and particles never jump.
    Always,
    /// Anything else.
    Mixed,
}

/// Sleep probability `q_v` for every non-sink vertex, indexed by rank.
///
/// When vertex `v` fires, it draws a sleep instruction with probability
/// `q_v` and a jump instruction otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct SleepProbabilities {
    probs: Vec<f64>,
    regime: SleepRegime,
}

impl SleepProbabilities {
    /// Validate one probability per non-sink vertex of `graph`.
    pub fn new(graph: &Graph, probs: Vec<f64>) -> Result<Self, RelaxationError> {
        if probs.len() != graph.non_sink_count() {
            return Err(RelaxationError::SleepLengthMismatch {
                expected: graph.non_sink_count(),
                found: probs.len(),
            });
        }
        for (rank, &value) in probs.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(RelaxationError::InvalidSleepProbability { rank, value });
            }
        }
        let regime = if probs.iter().all(|&q| q == 0.0) {
            SleepRegime::Never
        } else if probs.iter().all(|&q| q == 1.0) {
            SleepRegime::Always
        } else {
            SleepRegime::Mixed
        };
        Ok(Self { probs, regime })
    }

    /// The same probability `q` at every non-sink vertex.
    pub fn uniform(graph: &Graph, q: f64) -> Result<Self, RelaxationError> {
        Self::new(graph, vec![q; graph.non_sink_count()])
    }

    /// Sleep probability at a rank.
    #[inline]
    pub fn get(&self, rank: usize) -> f64 {
        self.probs[rank]
    }

    /// All probabilities in rank order.
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }

    /// The regime these probabilities fall into.
    pub fn regime(&self) -> SleepRegime {
        self.regime
    }
}
