//! Unique edge ("bar") extraction.
//!
//! Each simplex row `[v0, v1, ..., vD]` contributes the D+1 cyclic edges
//! `(v_i, v_(i+1) mod (D+1))`. Edges are stored in canonical order, smaller
//! point index first, so that `[a, b]` and `[b, a]` name the same bar.

use std::collections::{BTreeSet, HashMap};

use nalgebra::DMatrix;

use crate::error::{MeshError, Result};

/// An undirected edge in canonical order (`edge[0] < edge[1]` for non-degenerate edges).
pub type Edge = [usize; 2];

/// Put an index pair into canonical order.
#[inline]
pub fn canonical_edge(a: usize, b: usize) -> Edge {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// The `local`-th cyclic edge of simplex row `simplex`, in canonical order.
#[inline]
pub(crate) fn local_edge(simplices: &DMatrix<usize>, simplex: usize, local: usize) -> Edge {
    let width = simplices.ncols();
    canonical_edge(
        simplices[(simplex, local)],
        simplices[(simplex, (local + 1) % width)],
    )
}

/// Collect the unique edges referenced by a simplex array.
///
/// The result is sorted lexicographically by `(edge[0], edge[1])`, which
/// makes it deterministic for a given simplex array.
///
/// # Example
/// ```
/// use distmesh::mesh::unique_edges;
/// use nalgebra::DMatrix;
///
/// let triangles = DMatrix::from_row_slice(2, 3, &[0usize, 1, 2, 1, 2, 3]);
/// let edges = unique_edges(&triangles);
/// assert_eq!(edges, vec![[0, 1], [0, 2], [1, 2], [1, 3], [2, 3]]);
/// ```
pub fn unique_edges(simplices: &DMatrix<usize>) -> Vec<Edge> {
    let mut set = BTreeSet::new();
    for simplex in 0..simplices.nrows() {
        for local in 0..simplices.ncols() {
            set.insert(local_edge(simplices, simplex, local));
        }
    }
    set.into_iter().collect()
}

/// Map every local edge of every simplex to its row in `edges`.
///
/// Entry `(s, i)` of the result is the index in `edges` of the edge between
/// columns `i` and `(i + 1) mod (D + 1)` of simplex `s`. `edges` may list
/// either orientation of a pair.
///
/// # Errors
/// Returns [`MeshError::MissingEdge`] if a simplex edge is not in `edges`.
pub fn edge_indices_for_simplices(
    simplices: &DMatrix<usize>,
    edges: &[Edge],
) -> Result<DMatrix<usize>> {
    let lookup: HashMap<Edge, usize> = edges
        .iter()
        .enumerate()
        .map(|(row, edge)| (canonical_edge(edge[0], edge[1]), row))
        .collect();

    let mut indices = DMatrix::zeros(simplices.nrows(), simplices.ncols());
    for simplex in 0..simplices.nrows() {
        for local in 0..simplices.ncols() {
            let edge = local_edge(simplices, simplex, local);
            indices[(simplex, local)] = *lookup
                .get(&edge)
                .ok_or(MeshError::MissingEdge { simplex, edge })?;
        }
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_edge_is_listed_once() {
        let triangles = DMatrix::from_row_slice(2, 3, &[0usize, 1, 2, 1, 2, 3]);
        let edges = unique_edges(&triangles);

        assert_eq!(edges.len(), 5);
        for expected in [[0, 1], [1, 2], [0, 2], [2, 3], [1, 3]] {
            assert_eq!(edges.iter().filter(|&&e| e == expected).count(), 1);
        }
    }

    #[test]
    fn test_orientation_does_not_matter() {
        let forward = DMatrix::from_row_slice(1, 3, &[4usize, 9, 2]);
        let backward = DMatrix::from_row_slice(1, 3, &[2usize, 9, 4]);
        assert_eq!(unique_edges(&forward), unique_edges(&backward));
    }

    #[test]
    fn test_tetrahedron_uses_cyclic_edges() {
        let tets = DMatrix::from_row_slice(1, 4, &[0usize, 1, 2, 3]);
        let edges = unique_edges(&tets);
        assert_eq!(edges, vec![[0, 1], [0, 3], [1, 2], [2, 3]]);
    }

    #[test]
    fn test_empty() {
        let none = DMatrix::<usize>::zeros(0, 3);
        assert!(unique_edges(&none).is_empty());
        let indices = edge_indices_for_simplices(&none, &[]).unwrap();
        assert_eq!(indices.shape(), (0, 3));
    }

    #[test]
    fn test_edge_indices() {
        let triangles = DMatrix::from_row_slice(2, 3, &[0usize, 1, 2, 1, 2, 3]);
        let edges = unique_edges(&triangles);
        let indices = edge_indices_for_simplices(&triangles, &edges).unwrap();

        assert_eq!(indices.shape(), (2, 3));
        for simplex in 0..2 {
            for local in 0..3 {
                let a = triangles[(simplex, local)];
                let b = triangles[(simplex, (local + 1) % 3)];
                assert_eq!(edges[indices[(simplex, local)]], canonical_edge(a, b));
            }
        }
        // Shared edge {1, 2} resolves to the same row from both triangles.
        assert_eq!(indices[(0, 1)], indices[(1, 0)]);
    }

    #[test]
    fn test_edge_indices_accepts_reversed_pairs() {
        let triangles = DMatrix::from_row_slice(1, 3, &[0usize, 1, 2]);
        let edges = vec![[1, 0], [2, 1], [2, 0]];
        let indices = edge_indices_for_simplices(&triangles, &edges).unwrap();
        assert_eq!(indices.row(0).iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_edge_indices_missing() {
        let triangles = DMatrix::from_row_slice(1, 3, &[0usize, 1, 2]);
        let result = edge_indices_for_simplices(&triangles, &[[0, 1], [1, 2]]);
        assert_eq!(
            result,
            Err(MeshError::MissingEdge {
                simplex: 0,
                edge: [0, 2]
            })
        );
    }
}
