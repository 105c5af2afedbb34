/// `k`-subsets of `0..n` in lexicographic order.
///
/// ```
/// use arw_analysis::Subsets;
///
/// let pairs: Vec<_> = Subsets::new(3, 2).collect();
/// assert_eq!(pairs, vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
/// ```
#[derive(Clone, Debug)]
pub struct Subsets {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Subsets {
    /// All `k`-subsets of `0..n`. Yields nothing when `k > n`, and the
    /// single empty subset when `k == 0`.
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            current: (k <= n).then(|| (0..k).collect()),
        }
    }
}

impl Iterator for Subsets {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let out = self.current.take()?;
        let k = out.len();
        let mut next = out.clone();
        // Rightmost position that can still advance.
        let mut i = k;
        while i > 0 {
            i -= 1;
            if next[i] < self.n - k + i {
                next[i] += 1;
                for j in i + 1..k {
                    next[j] = next[j - 1] + 1;
                }
                self.current = Some(next);
                break;
            }
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_binomials() {
        assert_eq!(Subsets::new(5, 2).count(), 10);
        assert_eq!(Subsets::new(5, 0).count(), 1);
        assert_eq!(Subsets::new(2, 3).count(), 0);
        assert_eq!(Subsets::new(4, 4).collect::<Vec<_>>(), vec![vec![0, 1, 2, 3]]);
    }
}
