//! Boundary edge extraction.

use std::collections::HashMap;

use nalgebra::DMatrix;

use super::edges::{edge_indices_for_simplices, unique_edges, Edge};
use crate::error::{MeshError, Result};

/// An edge on the mesh boundary.
///
/// `edge` is a row of the edge array the boundary was computed against.
/// In 2D, `reversed` is set when walking the stored edge from `edge[0]` to
/// `edge[1]` would put the owning triangle on the right. In other dimensions
/// it is always `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryEdge {
    /// Row index into the edge array.
    pub edge: usize,
    /// Whether the stored orientation must be flipped.
    pub reversed: bool,
}

impl BoundaryEdge {
    /// Endpoints of this boundary edge in boundary order.
    ///
    /// For a 2D mesh the owning triangle lies to the left of the returned
    /// segment.
    pub fn vertices(&self, edges: &[Edge]) -> [usize; 2] {
        let [a, b] = edges[self.edge];
        if self.reversed {
            [b, a]
        } else {
            [a, b]
        }
    }
}

/// Find the edges that belong to exactly one simplex.
///
/// If `edges` is `None`, the edge array is derived with
/// [`unique_edges`](super::unique_edges); the returned indices then refer to
/// that array. Boundary edges are listed in order of their first appearance
/// in `simplices`.
///
/// # Errors
/// Returns [`MeshError::DimensionMismatch`] when `simplices` is not
/// `points.ncols() + 1` wide, [`MeshError::InvalidVertexIndex`] for an
/// out-of-range point index and [`MeshError::MissingEdge`] if the supplied
/// edge array does not cover every simplex edge.
///
/// # Example
/// ```
/// use distmesh::mesh::boundary_edges;
/// use nalgebra::DMatrix;
///
/// let points = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
/// let triangles = DMatrix::from_row_slice(2, 3, &[0usize, 1, 2, 0, 2, 3]);
///
/// let boundary = boundary_edges(&points, &triangles, None).unwrap();
/// assert_eq!(boundary.len(), 4);
/// ```
pub fn boundary_edges(
    points: &DMatrix<f64>,
    simplices: &DMatrix<usize>,
    edges: Option<&[Edge]>,
) -> Result<Vec<BoundaryEdge>> {
    let dimension = points.ncols();
    if simplices.ncols() != dimension + 1 {
        return Err(MeshError::DimensionMismatch {
            expected: dimension + 1,
            found: simplices.ncols(),
        });
    }
    for (index, &vertex) in simplices.iter().enumerate() {
        if vertex >= points.nrows() {
            return Err(MeshError::InvalidVertexIndex {
                simplex: index % simplices.nrows(),
                vertex,
            });
        }
    }

    let derived;
    let edges = match edges {
        Some(edges) => edges,
        None => {
            derived = unique_edges(simplices);
            &derived
        }
    };
    let edge_indices = edge_indices_for_simplices(simplices, edges)?;

    // Incidence count plus the first (simplex, local edge) owning each edge.
    let mut incidence: HashMap<usize, (usize, usize)> = HashMap::new();
    let mut first_seen = Vec::new();
    for simplex in 0..simplices.nrows() {
        for local in 0..simplices.ncols() {
            let edge = edge_indices[(simplex, local)];
            let entry = incidence.entry(edge).or_insert_with(|| {
                first_seen.push(edge);
                (0, simplex)
            });
            entry.0 += 1;
        }
    }

    let boundary = first_seen
        .into_iter()
        .filter_map(|edge| {
            let (count, owner) = incidence[&edge];
            (count == 1).then(|| BoundaryEdge {
                edge,
                reversed: dimension == 2 && is_clockwise(points, simplices, owner, edges[edge]),
            })
        })
        .collect();

    Ok(boundary)
}

/// Whether triangle `owner` lies to the right of the directed edge `a -> b`.
fn is_clockwise(
    points: &DMatrix<f64>,
    simplices: &DMatrix<usize>,
    owner: usize,
    [a, b]: Edge,
) -> bool {
    let Some(apex) = simplices
        .row(owner)
        .iter()
        .copied()
        .find(|&v| v != a && v != b)
    else {
        return false;
    };

    let v1 = (points[(b, 0)] - points[(a, 0)], points[(b, 1)] - points[(a, 1)]);
    let v2 = (
        points[(apex, 0)] - points[(b, 0)],
        points[(apex, 1)] - points[(b, 1)],
    );
    v1.0 * v2.1 - v1.1 * v2.0 < 0.0
}
