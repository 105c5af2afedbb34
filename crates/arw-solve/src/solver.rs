//! Stationary distribution of a row-stochastic matrix.
//!
//! Three methods:
//!
//! - **Direct**: dense LU of `(Q^T - I)` with the last equation replaced
//!   by the normalisation `sum(pi) = 1`. Exact up to rounding, but
//!   quadratic in memory and cubic in time, so only for small chains.
//! - **Gauss-Seidel** sweeps over the sparse balance equations
//!   `pi_j (1 - Q_jj) = sum_{i != j} pi_i Q_ij`, reading in-flows from the
//!   CSR transpose and renormalising after each sweep.
//! - **Power iteration** on the lazy chain `(I + Q) / 2`. The lazy chain
//!   has the same stationary vector and is aperiodic, so iteration
//!   converges for periodic chains too.
//!
//! Either way the result is clamped, normalised, and checked against the
//! balance equations before being returned.

use arw_core::{Progress, ProgressObserver, SolveError};
use nalgebra::DVector;

use crate::matrix::TransitionMatrix;

/// How to compute the stationary vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverMethod {
    /// Dense LU.
    Direct,
    /// Sparse Gauss-Seidel on the balance equations.
    GaussSeidel,
    /// Power iteration on the lazy chain.
    PowerIteration,
    /// Direct up to `direct_limit` states, Gauss-Seidel beyond. A
    /// Gauss-Seidel run that exhausts its budget is retried by power
    /// iteration.
    Auto {
        /// Largest dimension solved directly.
        direct_limit: usize,
    },
}

impl SolverMethod {
    /// The concrete method used for a `dim`-state chain.
    pub fn resolve(self, dim: usize) -> SolverMethod {
        match self {
            SolverMethod::Auto { direct_limit } if dim <= direct_limit => SolverMethod::Direct,
            SolverMethod::Auto { .. } => SolverMethod::GaussSeidel,
            m => m,
        }
    }
}

impl Default for SolverMethod {
    fn default() -> Self {
        SolverMethod::Auto { direct_limit: 500 }
    }
}

/// Solver parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
    /// Method selection.
    pub method: SolverMethod,
    /// Iterative methods stop once successive iterates differ by less
    /// than this in the infinity norm.
    pub tolerance: f64,
    /// Sweep or iteration cap of the iterative methods.
    pub max_iterations: usize,
    /// Negative components no smaller than `-clamp_tolerance` are
    /// rounding noise and are set to zero.
    pub clamp_tolerance: f64,
    /// Report progress every this many iterations. 0 disables.
    pub progress_interval: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: SolverMethod::default(),
            tolerance: 1e-12,
            max_iterations: 1_000_000,
            clamp_tolerance: 1e-10,
            progress_interval: 1000,
        }
    }
}

/// A solved stationary vector.
#[derive(Clone, Debug, PartialEq)]
pub struct StationaryDistribution {
    /// Probabilities, indexed like the matrix rows. Non-negative, summing
    /// to one.
    pub probabilities: Vec<f64>,
    /// `max_j |(pi Q)_j - pi_j|` after normalisation.
    pub residual: f64,
    /// Sweeps or iterations performed (0 for a direct solve).
    pub iterations: usize,
    /// The method actually used.
    pub method: SolverMethod,
}

/// Solve `pi Q = pi`, `sum(pi) = 1`.
///
/// # Errors
///
/// - [`SolveError::Singular`] when the direct system cannot be solved.
/// - [`SolveError::Convergence`] when an iterative method exhausts its cap.
/// - [`SolveError::NumericalInstability`] for a non-finite component or a
///   negative one beyond the clamp tolerance.
pub fn solve(
    q: &TransitionMatrix,
    config: &SolverConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<StationaryDistribution, SolveError> {
    let dim = q.dim();
    let mut method = config.method.resolve(dim);
    log::debug!("solving {dim}-state chain with {method:?}");

    let (raw, iterations) = match method {
        SolverMethod::PowerIteration => power_iteration(q, config, observer)?,
        SolverMethod::GaussSeidel => match gauss_seidel(q, config, observer) {
            Err(SolveError::Convergence { residual, .. })
                if matches!(config.method, SolverMethod::Auto { .. }) =>
            {
                log::warn!("Gauss-Seidel stalled at {residual:e}, retrying with power iteration");
                method = SolverMethod::PowerIteration;
                power_iteration(q, config, observer)?
            }
            other => other?,
        },
        _ => (direct(q)?, 0),
    };
    let probabilities = finalize(raw, config.clamp_tolerance)?;
    let residual = balance_residual(q, &probabilities);
    observer.notify(Progress::Solving {
        iteration: iterations,
        residual,
    });
    Ok(StationaryDistribution {
        probabilities,
        residual,
        iterations,
        method,
    })
}

/// `max_j |(pi Q)_j - pi_j|`.
pub fn balance_residual(q: &TransitionMatrix, pi: &[f64]) -> f64 {
    q.left_multiply(pi)
        .iter()
        .zip(pi)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

fn direct(q: &TransitionMatrix) -> Result<Vec<f64>, SolveError> {
    let dim = q.dim();
    let mut a = q.to_dense().transpose();
    for i in 0..dim {
        a[(i, i)] -= 1.0;
    }
    for j in 0..dim {
        a[(dim - 1, j)] = 1.0;
    }
    let mut b = DVector::zeros(dim);
    b[dim - 1] = 1.0;
    let x = a.lu().solve(&b).ok_or(SolveError::Singular { dim })?;
    Ok(x.iter().copied().collect())
}

fn gauss_seidel(
    q: &TransitionMatrix,
    config: &SolverConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<(Vec<f64>, usize), SolveError> {
    let dim = q.dim();
    let inflow = q.transpose();
    let mut x = vec![1.0 / dim as f64; dim];
    let mut residual = f64::INFINITY;
    for iteration in 1..=config.max_iterations {
        let previous = x.clone();
        for j in 0..dim {
            let mut incoming = 0.0;
            let mut stay = 0.0;
            for (i, w) in inflow.row(j) {
                if i == j {
                    stay = w;
                } else {
                    incoming += x[i] * w;
                }
            }
            // An absorbing state keeps its mass.
            if stay < 1.0 {
                x[j] = incoming / (1.0 - stay);
            }
        }
        let s: f64 = x.iter().sum();
        if s > 0.0 && s.is_finite() {
            x.iter_mut().for_each(|v| *v /= s);
        }
        residual = x
            .iter()
            .zip(&previous)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);

        if config.progress_interval > 0 && iteration % config.progress_interval == 0 {
            observer.notify(Progress::Solving {
                iteration,
                residual,
            });
        }
        if residual < config.tolerance {
            return Ok((x, iteration));
        }
    }
    Err(SolveError::Convergence {
        iterations: config.max_iterations,
        residual,
    })
}

fn power_iteration(
    q: &TransitionMatrix,
    config: &SolverConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<(Vec<f64>, usize), SolveError> {
    let dim = q.dim();
    let mut x = vec![1.0 / dim as f64; dim];
    let mut residual = f64::INFINITY;
    for iteration in 1..=config.max_iterations {
        let qx = q.left_multiply(&x);
        let mut next: Vec<f64> = x.iter().zip(&qx).map(|(a, b)| 0.5 * (a + b)).collect();
        let s: f64 = next.iter().sum();
        if s > 0.0 && s.is_finite() {
            next.iter_mut().for_each(|v| *v /= s);
        }
        residual = next
            .iter()
            .zip(&x)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        x = next;

        if config.progress_interval > 0 && iteration % config.progress_interval == 0 {
            observer.notify(Progress::Solving {
                iteration,
                residual,
            });
        }
        if residual < config.tolerance {
            return Ok((x, iteration));
        }
    }
    Err(SolveError::Convergence {
        iterations: config.max_iterations,
        residual,
    })
}

/// Clamp rounding-level negatives, reject real ones, and normalise.
fn finalize(mut x: Vec<f64>, clamp_tolerance: f64) -> Result<Vec<f64>, SolveError> {
    for (index, v) in x.iter_mut().enumerate() {
        if !v.is_finite() {
            return Err(SolveError::NumericalInstability { index, value: *v });
        }
        if *v < 0.0 {
            if *v < -clamp_tolerance {
                return Err(SolveError::NumericalInstability { index, value: *v });
            }
            log::warn!("clamping component {index} = {v:e} to zero");
            *v = 0.0;
        }
    }
    let sum: f64 = x.iter().sum();
    if sum <= 0.0 {
        return Err(SolveError::NumericalInstability {
            index: 0,
            value: sum,
        });
    }
    x.iter_mut().for_each(|v| *v /= sum);
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arw_core::NullObserver;
    use proptest::prelude::*;

    fn two_state(a: f64, b: f64) -> TransitionMatrix {
        TransitionMatrix::from_triplets(
            2,
            [(0, 0, 1.0 - a), (0, 1, a), (1, 0, b), (1, 1, 1.0 - b)],
            1e-12,
        )
        .unwrap()
    }

    fn config(method: SolverMethod) -> SolverConfig {
        SolverConfig {
            method,
            ..SolverConfig::default()
        }
    }

    #[test]
    fn two_state_chain_matches_closed_form() {
        // pi = (b, a) / (a + b)
        let q = two_state(0.3, 0.1);
        for method in [
            SolverMethod::Direct,
            SolverMethod::GaussSeidel,
            SolverMethod::PowerIteration,
        ] {
            let d = solve(&q, &config(method), &mut NullObserver).unwrap();
            assert!((d.probabilities[0] - 0.25).abs() < 1e-9, "{method:?}");
            assert!((d.probabilities[1] - 0.75).abs() < 1e-9, "{method:?}");
            assert!(d.residual < 1e-9);
            assert_eq!(d.method, method);
        }
    }

    #[test]
    fn periodic_chain_converges_under_laziness() {
        let q = two_state(1.0, 1.0);
        let d = solve(&q, &config(SolverMethod::PowerIteration), &mut NullObserver).unwrap();
        assert!((d.probabilities[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn single_state_is_certain() {
        let q = TransitionMatrix::from_triplets(1, [(0, 0, 1.0)], 1e-12).unwrap();
        let d = solve(&q, &SolverConfig::default(), &mut NullObserver).unwrap();
        assert_eq!(d.probabilities, vec![1.0]);
        assert_eq!(d.method, SolverMethod::Direct);
    }

    #[test]
    fn auto_switches_on_dimension() {
        let auto = SolverMethod::Auto { direct_limit: 2 };
        assert_eq!(auto.resolve(2), SolverMethod::Direct);
        assert_eq!(auto.resolve(3), SolverMethod::GaussSeidel);
        assert_eq!(SolverMethod::default().resolve(501), SolverMethod::GaussSeidel);
        assert_eq!(SolverMethod::Direct.resolve(10_000), SolverMethod::Direct);
    }

    #[test]
    fn gauss_seidel_handles_a_periodic_cycle() {
        // Deterministic 4-cycle: every state has in-flow from exactly one
        // other, so the sweep settles on the uniform vector.
        let q = TransitionMatrix::from_triplets(
            4,
            [(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)],
            1e-12,
        )
        .unwrap();
        let d = solve(&q, &config(SolverMethod::GaussSeidel), &mut NullObserver).unwrap();
        for p in &d.probabilities {
            assert!((p - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn auto_sweeps_beyond_the_direct_limit() {
        let q = two_state(0.01, 0.02);
        let cfg = SolverConfig {
            method: SolverMethod::Auto { direct_limit: 1 },
            max_iterations: 1,
            ..SolverConfig::default()
        };
        // One step is not enough for Gauss-Seidel nor for the power
        // iteration it falls back to.
        let err = solve(&q, &cfg, &mut NullObserver).unwrap_err();
        assert!(matches!(err, SolveError::Convergence { iterations: 1, .. }));

        let roomy = SolverConfig {
            max_iterations: 100_000,
            ..cfg
        };
        let d = solve(&q, &roomy, &mut NullObserver).unwrap();
        assert_eq!(d.method, SolverMethod::GaussSeidel);
        assert!((d.probabilities[0] - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn iteration_cap_reports_convergence_error() {
        let q = two_state(0.01, 0.02);
        let cfg = SolverConfig {
            method: SolverMethod::PowerIteration,
            max_iterations: 3,
            ..SolverConfig::default()
        };
        let err = solve(&q, &cfg, &mut NullObserver).unwrap_err();
        assert!(matches!(err, SolveError::Convergence { iterations: 3, .. }));
    }

    #[test]
    fn reducible_direct_system_is_singular_or_rejected() {
        // Two absorbing states: Q^T - I has rank 0 before the
        // normalisation row, so the system is singular.
        let q = TransitionMatrix::from_triplets(2, [(0, 0, 1.0), (1, 1, 1.0)], 1e-12).unwrap();
        let err = solve(&q, &config(SolverMethod::Direct), &mut NullObserver).unwrap_err();
        assert_eq!(err, SolveError::Singular { dim: 2 });
    }

    #[test]
    fn progress_is_reported() {
        let q = two_state(0.3, 0.1);
        let cfg = SolverConfig {
            method: SolverMethod::PowerIteration,
            progress_interval: 1,
            ..SolverConfig::default()
        };
        let mut events = Vec::new();
        let d = solve(&q, &cfg, &mut |p: Progress| events.push(p)).unwrap();
        assert_eq!(events.len(), d.iterations + 1);
        assert!(matches!(
            events.last(),
            Some(Progress::Solving { iteration, .. }) if *iteration == d.iterations
        ));
    }

    #[test]
    fn finalize_clamps_noise_and_rejects_real_negatives() {
        let x = finalize(vec![0.5, -1e-13, 0.5], 1e-10).unwrap();
        assert_eq!(x, vec![0.5, 0.0, 0.5]);
        assert_eq!(
            finalize(vec![1.0, -0.1], 1e-10).unwrap_err(),
            SolveError::NumericalInstability {
                index: 1,
                value: -0.1
            }
        );
        assert!(matches!(
            finalize(vec![f64::NAN], 1e-10).unwrap_err(),
            SolveError::NumericalInstability { index: 0, .. }
        ));
    }

    proptest! {
        #[test]
        fn direct_and_power_agree_on_positive_chains(
            rows in prop::collection::vec(prop::collection::vec(0.05f64..1.0, 5), 5)
        ) {
            let mut triplets = Vec::new();
            for (i, row) in rows.iter().enumerate() {
                let s: f64 = row.iter().sum();
                for (j, w) in row.iter().enumerate() {
                    triplets.push((i, j, w / s));
                }
            }
            let q = TransitionMatrix::from_triplets(5, triplets, 1e-9).unwrap();
            let d = solve(&q, &config(SolverMethod::Direct), &mut NullObserver).unwrap();
            let p = solve(&q, &config(SolverMethod::PowerIteration), &mut NullObserver).unwrap();
            let g = solve(&q, &config(SolverMethod::GaussSeidel), &mut NullObserver).unwrap();
            prop_assert!((d.probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            prop_assert!(d.residual < 1e-9);
            prop_assert!(g.residual < 1e-9);
            for ((a, b), c) in d.probabilities.iter().zip(&p.probabilities).zip(&g.probabilities) {
                prop_assert!((a - b).abs() < 1e-8);
                prop_assert!((a - c).abs() < 1e-8);
            }
        }
    }
}
