//! Row-stochastic transition matrix in CSR form.

use arw_core::MatrixError;
use nalgebra::DMatrix;

/// A square row-stochastic matrix stored as compressed sparse rows.
///
/// Column indices within a row are strictly increasing and every
/// stored weight is finite and positive.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionMatrix {
    dim: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl TransitionMatrix {
    /// Assemble a matrix from `(row, col, weight)` triplets.
    ///
    /// Triplets for the same cell are summed and zero weights dropped.
    /// Each row must then sum to one within `epsilon`.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::Empty`] when `dim == 0`.
    /// - [`MatrixError::InvalidEntry`] for an out-of-range index or a
    ///   negative or non-finite weight.
    /// - [`MatrixError::Consistency`] for a row whose sum is off.
    pub fn from_triplets<I>(dim: usize, triplets: I, epsilon: f64) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        if dim == 0 {
            return Err(MatrixError::Empty);
        }
        let mut entries: Vec<(usize, usize, f64)> = Vec::new();
        for (row, col, weight) in triplets {
            if row >= dim || col >= dim || !weight.is_finite() || weight < 0.0 {
                return Err(MatrixError::InvalidEntry { row, col, weight });
            }
            if weight > 0.0 {
                entries.push((row, col, weight));
            }
        }
        entries.sort_by_key(|&(r, c, _)| (r, c));

        let mut row_ptr = vec![0usize; dim + 1];
        let mut col_idx = Vec::with_capacity(entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(entries.len());
        let mut last: Option<(usize, usize)> = None;
        for (r, c, w) in entries {
            if last == Some((r, c)) {
                if let Some(v) = values.last_mut() {
                    *v += w;
                }
                continue;
            }
            last = Some((r, c));
            row_ptr[r + 1] += 1;
            col_idx.push(c);
            values.push(w);
        }
        for r in 0..dim {
            row_ptr[r + 1] += row_ptr[r];
        }

        let m = Self {
            dim,
            row_ptr,
            col_idx,
            values,
        };
        m.check_stochastic(epsilon)?;
        Ok(m)
    }

    /// Fail with [`MatrixError::Consistency`] on the first row whose sum
    /// deviates from one by more than `epsilon`.
    pub fn check_stochastic(&self, epsilon: f64) -> Result<(), MatrixError> {
        for row in 0..self.dim {
            let sum = self.row_sum(row);
            if sum.is_nan() || (sum - 1.0).abs() > epsilon {
                return Err(MatrixError::Consistency { row, sum, epsilon });
            }
        }
        Ok(())
    }

    /// Number of rows (and columns).
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored entries of one row as `(col, weight)`, columns ascending.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let span = self.row_ptr[row]..self.row_ptr[row + 1];
        self.col_idx[span.clone()]
            .iter()
            .copied()
            .zip(self.values[span].iter().copied())
    }

    /// Entry at `(row, col)`, zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let span = self.row_ptr[row]..self.row_ptr[row + 1];
        match self.col_idx[span.clone()].binary_search(&col) {
            Ok(k) => self.values[span.start + k],
            Err(_) => 0.0,
        }
    }

    /// Sum of one row.
    pub fn row_sum(&self, row: usize) -> f64 {
        self.row(row).map(|(_, w)| w).sum()
    }

    /// `x Q` for a row vector `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != self.dim()`.
    pub fn left_multiply(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.dim, "vector length must match dimension");
        let mut out = vec![0.0; self.dim];
        for (i, &xi) in x.iter().enumerate() {
            if xi == 0.0 {
                continue;
            }
            for (j, w) in self.row(i) {
                out[j] += xi * w;
            }
        }
        out
    }

    /// Every stored entry as `(col, row, weight)`, i.e. the entries of
    /// the transpose in row-major order of the original.
    pub fn transpose_iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.dim).flat_map(move |i| self.row(i).map(move |(j, w)| (j, i, w)))
    }

    /// The transpose in CSR form. Row `j` of the result lists every
    /// `(i, Q[i][j])`, so it is the in-flow of state `j`.
    pub fn transpose(&self) -> Self {
        let mut row_ptr = vec![0usize; self.dim + 1];
        for &j in &self.col_idx {
            row_ptr[j + 1] += 1;
        }
        for k in 0..self.dim {
            row_ptr[k + 1] += row_ptr[k];
        }
        let mut next = row_ptr.clone();
        let mut col_idx = vec![0usize; self.nnz()];
        let mut values = vec![0.0; self.nnz()];
        for (row, col, w) in self.transpose_iter() {
            let k = next[row];
            next[row] += 1;
            col_idx[k] = col;
            values[k] = w;
        }
        Self {
            dim: self.dim,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Sub-matrix on `states` (ascending, distinct), re-indexed
    /// `0..states.len()`. Entries leaving the set are dropped, so the
    /// rows stay stochastic only when the set is closed.
    pub fn restrict(&self, states: &[usize]) -> Self {
        let mut new_index = vec![usize::MAX; self.dim];
        for (k, &s) in states.iter().enumerate() {
            new_index[s] = k;
        }
        let mut row_ptr = Vec::with_capacity(states.len() + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for &s in states {
            for (j, w) in self.row(s) {
                if new_index[j] != usize::MAX {
                    col_idx.push(new_index[j]);
                    values.push(w);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            dim: states.len(),
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Dense copy, for direct solves.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut d = DMatrix::zeros(self.dim, self.dim);
        for i in 0..self.dim {
            for (j, w) in self.row(i) {
                d[(i, j)] = w;
            }
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_state(a: f64, b: f64) -> TransitionMatrix {
        TransitionMatrix::from_triplets(
            2,
            [(0, 0, 1.0 - a), (0, 1, a), (1, 0, b), (1, 1, 1.0 - b)],
            1e-12,
        )
        .unwrap()
    }

    #[test]
    fn duplicates_are_summed() {
        let m = TransitionMatrix::from_triplets(
            2,
            [(0, 1, 0.25), (0, 1, 0.25), (0, 0, 0.5), (1, 0, 1.0)],
            1e-12,
        )
        .unwrap();
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.get(0, 1), 0.5);
        assert_eq!(m.get(1, 1), 0.0);
        assert_eq!(m.row(0).collect::<Vec<_>>(), vec![(0, 0.5), (1, 0.5)]);
    }

    #[test]
    fn bad_row_sum_is_a_consistency_error() {
        let err =
            TransitionMatrix::from_triplets(2, [(0, 0, 1.0), (1, 0, 0.5)], 1e-9).unwrap_err();
        assert_eq!(
            err,
            MatrixError::Consistency {
                row: 1,
                sum: 0.5,
                epsilon: 1e-9
            }
        );
    }

    #[test]
    fn missing_row_is_a_consistency_error() {
        let err = TransitionMatrix::from_triplets(2, [(0, 0, 1.0)], 1e-9).unwrap_err();
        assert!(matches!(err, MatrixError::Consistency { row: 1, .. }));
    }

    #[test]
    fn invalid_entries_rejected() {
        assert_eq!(
            TransitionMatrix::from_triplets(1, [(0, 2, 1.0)], 1e-9).unwrap_err(),
            MatrixError::InvalidEntry {
                row: 0,
                col: 2,
                weight: 1.0
            }
        );
        assert!(matches!(
            TransitionMatrix::from_triplets(1, [(0, 0, -0.5)], 1e-9).unwrap_err(),
            MatrixError::InvalidEntry { .. }
        ));
        assert_eq!(
            TransitionMatrix::from_triplets(0, std::iter::empty(), 1e-9).unwrap_err(),
            MatrixError::Empty
        );
    }

    #[test]
    fn left_multiply_and_transpose() {
        let m = two_state(0.5, 0.25);
        let x = m.left_multiply(&[1.0, 0.0]);
        assert_eq!(x, vec![0.5, 0.5]);
        let t: Vec<_> = m.transpose_iter().collect();
        assert!(t.contains(&(1, 0, 0.5)));
        assert!(t.contains(&(0, 1, 0.25)));
        assert_eq!(m.to_dense()[(1, 1)], 0.75);
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let m = TransitionMatrix::from_triplets(
            3,
            [(0, 1, 0.5), (0, 2, 0.5), (1, 2, 1.0), (2, 0, 0.4), (2, 2, 0.6)],
            1e-12,
        )
        .unwrap();
        let t = m.transpose();
        assert_eq!(t.dim(), 3);
        assert_eq!(t.nnz(), m.nnz());
        assert_eq!(t.row(2).collect::<Vec<_>>(), vec![(0, 0.5), (1, 1.0), (2, 0.6)]);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(t.get(j, i), m.get(i, j));
            }
        }
    }

    #[test]
    fn restrict_keeps_closed_rows_stochastic() {
        // 0 -> {1, 2}; {1, 2} closed.
        let m = TransitionMatrix::from_triplets(
            3,
            [(0, 1, 0.5), (0, 2, 0.5), (1, 2, 1.0), (2, 1, 0.3), (2, 2, 0.7)],
            1e-12,
        )
        .unwrap();
        let sub = m.restrict(&[1, 2]);
        assert_eq!(sub.dim(), 2);
        assert_eq!(sub.get(0, 1), 1.0);
        assert_eq!(sub.get(1, 0), 0.3);
        sub.check_stochastic(1e-12).unwrap();
    }

    proptest! {
        #[test]
        fn normalized_random_rows_are_stochastic(
            rows in prop::collection::vec(prop::collection::vec(0.01f64..1.0, 4), 4)
        ) {
            let mut triplets = Vec::new();
            for (i, row) in rows.iter().enumerate() {
                let s: f64 = row.iter().sum();
                for (j, w) in row.iter().enumerate() {
                    triplets.push((i, j, w / s));
                }
            }
            let m = TransitionMatrix::from_triplets(4, triplets, 1e-9).unwrap();
            for i in 0..4 {
                prop_assert!((m.row_sum(i) - 1.0).abs() < 1e-9);
            }
            let x = m.left_multiply(&[0.25; 4]);
            prop_assert!((x.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }
}
