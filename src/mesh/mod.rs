//! Core mesh data structures.
//!
//! A mesh is a pair of dense arrays:
//!
//! - **points**: `N x D` coordinates, one point per row. The row index is the
//!   point's identity.
//! - **simplices**: `M x (D + 1)` point indices, one triangle (2D) or
//!   tetrahedron (3D) per row.
//!
//! Edges ("bars") are derived from the simplices with [`unique_edges`] and
//! boundary edges with [`boundary_edges`].
//!
//! ```
//! use distmesh::mesh::Mesh;
//! use nalgebra::DMatrix;
//!
//! let points = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
//! let simplices = DMatrix::from_row_slice(1, 3, &[0usize, 1, 2]);
//! let mesh = Mesh::new(points, simplices).unwrap();
//!
//! assert_eq!(mesh.dimension(), 2);
//! assert_eq!(mesh.edges().len(), 3);
//! ```

mod array;
mod boundary;
mod edges;

pub use array::{gather_rows, mask_rows, max_row_distance, row_centroids, stack_rows};
pub use boundary::{boundary_edges, BoundaryEdge};
pub use edges::{canonical_edge, edge_indices_for_simplices, unique_edges, Edge};

use nalgebra::DMatrix;

use crate::error::{MeshError, Result};

/// Default `[-1, 1]^D` bounding box, one `[min, max]` row per dimension.
///
/// ```
/// let bbox = distmesh::mesh::bounding_box(3);
/// assert_eq!(bbox.shape(), (3, 2));
/// assert_eq!(bbox[(2, 0)], -1.0);
/// assert_eq!(bbox[(2, 1)], 1.0);
/// ```
pub fn bounding_box(dimension: usize) -> DMatrix<f64> {
    DMatrix::from_fn(dimension, 2, |_, col| if col == 0 { -1.0 } else { 1.0 })
}

/// Check that `bbox` is a `D x 2` array with positive, finite extent in every row.
pub fn validate_bounding_box(bbox: &DMatrix<f64>) -> Result<()> {
    if bbox.ncols() != 2 {
        return Err(MeshError::DimensionMismatch {
            expected: 2,
            found: bbox.ncols(),
        });
    }
    if bbox.nrows() == 0 {
        return Err(MeshError::invalid_param(
            "bounding_box",
            "0 rows",
            "needs one row per dimension",
        ));
    }
    for dimension in 0..bbox.nrows() {
        let (min, max) = (bbox[(dimension, 0)], bbox[(dimension, 1)]);
        if !(min.is_finite() && max.is_finite() && max > min) {
            return Err(MeshError::InvalidBoundingBox {
                dimension,
                min,
                max,
            });
        }
    }
    Ok(())
}

/// A simplex mesh: point coordinates plus the simplices connecting them.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    points: DMatrix<f64>,
    simplices: DMatrix<usize>,
}

impl Mesh {
    /// Build a mesh, checking that the simplex width matches the dimension
    /// and that every index refers to an existing point.
    pub fn new(points: DMatrix<f64>, simplices: DMatrix<usize>) -> Result<Self> {
        let expected = points.ncols() + 1;
        if simplices.ncols() != expected {
            return Err(MeshError::DimensionMismatch {
                expected,
                found: simplices.ncols(),
            });
        }
        for simplex in 0..simplices.nrows() {
            for &vertex in simplices.row(simplex).iter() {
                if vertex >= points.nrows() {
                    return Err(MeshError::InvalidVertexIndex { simplex, vertex });
                }
            }
        }
        Ok(Self { points, simplices })
    }

    /// Build a mesh without validation; callers guarantee the invariants.
    pub(crate) fn from_parts(points: DMatrix<f64>, simplices: DMatrix<usize>) -> Self {
        debug_assert_eq!(simplices.ncols(), points.ncols() + 1);
        Self { points, simplices }
    }

    /// Spatial dimension D.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.points.ncols()
    }

    /// Number of points.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.nrows()
    }

    /// Number of simplices.
    #[inline]
    pub fn num_simplices(&self) -> usize {
        self.simplices.nrows()
    }

    /// The `N x D` point array.
    #[inline]
    pub fn points(&self) -> &DMatrix<f64> {
        &self.points
    }

    /// The `M x (D + 1)` simplex array.
    #[inline]
    pub fn simplices(&self) -> &DMatrix<usize> {
        &self.simplices
    }

    /// Coordinates of point `index`.
    pub fn point(&self, index: usize) -> Vec<f64> {
        self.points.row(index).iter().copied().collect()
    }

    /// Point indices of simplex `index`.
    pub fn simplex(&self, index: usize) -> Vec<usize> {
        self.simplices.row(index).iter().copied().collect()
    }

    /// Unique edges of the mesh, see [`unique_edges`].
    pub fn edges(&self) -> Vec<Edge> {
        unique_edges(&self.simplices)
    }

    /// Euclidean length of every edge returned by [`Mesh::edges`].
    pub fn edge_lengths(&self) -> Vec<f64> {
        self.edges()
            .iter()
            .map(|&[a, b]| (self.points.row(a) - self.points.row(b)).norm())
            .collect()
    }

    /// Boundary edges against [`Mesh::edges`], see [`boundary_edges`].
    pub fn boundary_edges(&self) -> Result<Vec<BoundaryEdge>> {
        boundary_edges(&self.points, &self.simplices, None)
    }

    /// Split the mesh into its point and simplex arrays.
    pub fn into_parts(self) -> (DMatrix<f64>, DMatrix<usize>) {
        (self.points, self.simplices)
    }
}
