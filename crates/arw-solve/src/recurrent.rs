//! Communicating classes of a transition matrix.
//!
//! A closed class is a strongly connected component with no edge
//! leaving it. The stationary distribution is unique exactly when there
//! is one closed class; every configuration outside it is transient and
//! carries zero stationary mass.

use arw_core::MatrixError;

use crate::matrix::TransitionMatrix;

/// Strongly connected components of the positive-weight graph of `m`.
///
/// Each component is sorted ascending. Components come out in reverse
/// topological order (Tarjan's algorithm, run iteratively).
pub fn strongly_connected_components(m: &TransitionMatrix) -> Vec<Vec<usize>> {
    let n = m.dim();
    let succ: Vec<Vec<usize>> = (0..n)
        .map(|i| m.row(i).filter(|&(_, w)| w > 0.0).map(|(j, _)| j).collect())
        .collect();

    const UNVISITED: usize = usize::MAX;
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut components = Vec::new();
    let mut next_index = 0usize;

    // (vertex, position in its successor list)
    let mut call: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        call.push((root, 0));
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(&(v, pos)) = call.last() {
            if let Some(&w) = succ[v].get(pos) {
                if let Some(top) = call.last_mut() {
                    top.1 += 1;
                }
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    call.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            call.pop();
            if let Some(&(parent, _)) = call.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
            if lowlink[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                component.sort_unstable();
                components.push(component);
            }
        }
    }
    components
}

/// Closed communicating classes, ordered by their smallest member.
pub fn closed_classes(m: &TransitionMatrix) -> Vec<Vec<usize>> {
    let components = strongly_connected_components(m);
    let mut component_of = vec![0usize; m.dim()];
    for (c, members) in components.iter().enumerate() {
        for &v in members {
            component_of[v] = c;
        }
    }
    let mut closed: Vec<Vec<usize>> = components
        .into_iter()
        .enumerate()
        .filter(|(c, members)| {
            members.iter().all(|&v| {
                m.row(v)
                    .all(|(j, w)| w <= 0.0 || component_of[j] == *c)
            })
        })
        .map(|(_, members)| members)
        .collect();
    closed.sort_by_key(|members| members.first().copied());
    closed
}

/// The unique closed class of `m`, ascending.
///
/// # Errors
///
/// [`MatrixError::ReducibleChain`] when there is more than one.
pub fn recurrent_class(m: &TransitionMatrix) -> Result<Vec<usize>, MatrixError> {
    let mut closed = closed_classes(m);
    match closed.len() {
        1 => Ok(closed.remove(0)),
        n => Err(MatrixError::ReducibleChain { closed_classes: n }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(dim: usize, t: &[(usize, usize, f64)]) -> TransitionMatrix {
        TransitionMatrix::from_triplets(dim, t.iter().copied(), 1e-12).unwrap()
    }

    #[test]
    fn irreducible_chain_is_one_class() {
        let m = matrix(3, &[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0)]);
        assert_eq!(strongly_connected_components(&m), vec![vec![0, 1, 2]]);
        assert_eq!(recurrent_class(&m).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn transient_prefix_is_excluded() {
        // 0 -> 1 -> 2 <-> 3, with 0 and 1 transient.
        let m = matrix(
            4,
            &[
                (0, 0, 0.5),
                (0, 1, 0.5),
                (1, 2, 1.0),
                (2, 3, 1.0),
                (3, 2, 0.5),
                (3, 3, 0.5),
            ],
        );
        assert_eq!(strongly_connected_components(&m).len(), 3);
        assert_eq!(recurrent_class(&m).unwrap(), vec![2, 3]);
    }

    #[test]
    fn two_absorbing_states_are_reducible() {
        let m = matrix(3, &[(0, 1, 0.5), (0, 2, 0.5), (1, 1, 1.0), (2, 2, 1.0)]);
        assert_eq!(closed_classes(&m), vec![vec![1], vec![2]]);
        assert_eq!(
            recurrent_class(&m).unwrap_err(),
            MatrixError::ReducibleChain { closed_classes: 2 }
        );
    }

    #[test]
    fn long_chain_does_not_recurse() {
        let n = 50_000;
        let mut t: Vec<_> = (0..n - 1).map(|i| (i, i + 1, 1.0)).collect();
        t.push((n - 1, 0, 1.0));
        let m = matrix(n, &t);
        assert_eq!(recurrent_class(&m).unwrap().len(), n);
    }
}
