//! Statistics of a stationary distribution over stable configurations.
//!
//! A site is *occupied* when it holds a (sleeping) particle. All
//! functions take the configuration index and the parallel probability
//! vector as produced by the pipeline or read back from a blob.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod error;
mod subsets;

use arw_graph::Configuration;

pub use error::AnalysisError;
pub use subsets::Subsets;

fn check(states: &[Configuration], probabilities: &[f64]) -> Result<usize, AnalysisError> {
    if states.len() != probabilities.len() {
        return Err(AnalysisError::LengthMismatch {
            states: states.len(),
            probabilities: probabilities.len(),
        });
    }
    let sites = states.first().map_or(0, Configuration::len);
    if let Some((index, s)) = states.iter().enumerate().find(|(_, s)| s.len() != sites) {
        return Err(AnalysisError::WidthMismatch {
            index,
            expected: sites,
            found: s.len(),
        });
    }
    Ok(sites)
}

/// `k`-point joint intensities: for every `k`-subset of sites in
/// lexicographic order, the probability that all of them are occupied.
///
/// Empty when `k` exceeds the number of sites. `k = 0` yields the total
/// mass.
pub fn joint_intensities(
    k: usize,
    states: &[Configuration],
    probabilities: &[f64],
) -> Result<Vec<f64>, AnalysisError> {
    let sites = check(states, probabilities)?;
    Ok(Subsets::new(sites, k)
        .map(|subset| {
            states
                .iter()
                .zip(probabilities)
                .filter(|(s, _)| subset.iter().all(|&r| s.count(r) > 0))
                .map(|(_, p)| p)
                .sum()
        })
        .collect())
}

/// Occupation probability of each site.
pub fn marginals(states: &[Configuration], probabilities: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    joint_intensities(1, states, probabilities)
}

/// Pair correlations `P(i and j occupied) - P(i) P(j)` for `i < j`, in
/// lexicographic order of the pairs.
pub fn correlations(
    states: &[Configuration],
    probabilities: &[f64],
) -> Result<Vec<f64>, AnalysisError> {
    let m = marginals(states, probabilities)?;
    let joints = joint_intensities(2, states, probabilities)?;
    let sites = m.len();
    Ok(Subsets::new(sites, 2)
        .zip(joints)
        .map(|(pair, joint)| joint - m[pair[0]] * m[pair[1]])
        .collect())
}

/// Probability that at least `k` particles survive.
pub fn survivors_at_least(
    k: usize,
    states: &[Configuration],
    probabilities: &[f64],
) -> Result<f64, AnalysisError> {
    check(states, probabilities)?;
    Ok(states
        .iter()
        .zip(probabilities)
        .filter(|(s, _)| s.occupied() >= k)
        .map(|(_, p)| p)
        .sum())
}

/// Probability that exactly `k` particles survive.
pub fn survivors_exactly(
    k: usize,
    states: &[Configuration],
    probabilities: &[f64],
) -> Result<f64, AnalysisError> {
    check(states, probabilities)?;
    Ok(states
        .iter()
        .zip(probabilities)
        .filter(|(s, _)| s.occupied() == k)
        .map(|(_, p)| p)
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smallvec::SmallVec;

    fn c(counts: &[u32]) -> Configuration {
        Configuration::from_ranked(SmallVec::from_slice(counts))
    }

    fn two_sites() -> (Vec<Configuration>, Vec<f64>) {
        (
            vec![c(&[0, 0]), c(&[1, 0]), c(&[0, 1]), c(&[1, 1])],
            vec![0.1, 0.2, 0.3, 0.4],
        )
    }

    #[test]
    fn marginals_and_joints() {
        let (s, p) = two_sites();
        let m = marginals(&s, &p).unwrap();
        assert!((m[0] - 0.6).abs() < 1e-12);
        assert!((m[1] - 0.7).abs() < 1e-12);
        let j = joint_intensities(2, &s, &p).unwrap();
        assert_eq!(j.len(), 1);
        assert!((j[0] - 0.4).abs() < 1e-12);
        assert!(joint_intensities(3, &s, &p).unwrap().is_empty());
        let total = joint_intensities(0, &s, &p).unwrap();
        assert!((total[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_is_joint_minus_product() {
        let (s, p) = two_sites();
        let r = correlations(&s, &p).unwrap();
        assert_eq!(r.len(), 1);
        assert!((r[0] - (0.4 - 0.6 * 0.7)).abs() < 1e-12);
    }

    #[test]
    fn survivors() {
        let (s, p) = two_sites();
        assert!((survivors_at_least(0, &s, &p).unwrap() - 1.0).abs() < 1e-12);
        assert!((survivors_at_least(1, &s, &p).unwrap() - 0.9).abs() < 1e-12);
        assert!((survivors_exactly(1, &s, &p).unwrap() - 0.5).abs() < 1e-12);
        assert!((survivors_exactly(2, &s, &p).unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(survivors_at_least(3, &s, &p).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_inputs_rejected() {
        let (s, p) = two_sites();
        assert_eq!(
            marginals(&s, &p[..3]).unwrap_err(),
            AnalysisError::LengthMismatch {
                states: 4,
                probabilities: 3
            }
        );
        let ragged = vec![c(&[0, 0]), c(&[1])];
        assert!(matches!(
            survivors_exactly(0, &ragged, &[0.5, 0.5]),
            Err(AnalysisError::WidthMismatch { index: 1, .. })
        ));
    }

    proptest! {
        #[test]
        fn exact_survivor_counts_partition_the_mass(
            masks in prop::collection::vec(0u8..16, 1..12),
        ) {
            let states: Vec<_> = masks
                .iter()
                .map(|m| c(&[(m & 1) as u32, (m >> 1 & 1) as u32, (m >> 2 & 1) as u32, (m >> 3 & 1) as u32]))
                .collect();
            let p = vec![1.0 / states.len() as f64; states.len()];
            let total: f64 = (0..=4).map(|k| survivors_exactly(k, &states, &p).unwrap()).sum();
            prop_assert!((total - 1.0).abs() < 1e-12);
            let m = marginals(&states, &p).unwrap();
            // Expected survivors equals the sum of the marginals.
            let mean: f64 = (1..=4).map(|k| k as f64 * survivors_exactly(k, &states, &p).unwrap()).sum();
            prop_assert!((mean - m.iter().sum::<f64>()).abs() < 1e-12);
        }
    }
}
