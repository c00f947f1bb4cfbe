//! # distmesh
//!
//! Unstructured simplex mesh generation (triangles in 2D, tetrahedra in 3D)
//! for domains given by a signed distance field.
//!
//! The method treats mesh edges as springs between point masses. Points
//! sampled inside the domain are pushed towards force equilibrium while
//! the mesh is periodically retriangulated and escaped points are
//! projected back onto the boundary.
//!
//! ## Features
//!
//! - **Implicit geometry**: any [`ScalarField`](field::ScalarField) with
//!   negative values inside serves as the domain
//! - **Graded meshes**: a second scalar field sets the local element size
//! - **Fixed points**: prescribed nodes that never move
//! - **Pluggable triangulation**: a built-in Bowyer-Watson Delaunay
//!   triangulator, or any [`Triangulator`](triangulate::Triangulator)
//! - **Reproducible**: the initial distribution is seeded explicitly
//!
//! ## Quick Start
//!
//! ```
//! use distmesh::prelude::*;
//! use nalgebra::DMatrix;
//!
//! // Unit disk with uniform element size.
//! let result = distmesh(
//!     &Sphere::unit(2),
//!     0.3,
//!     &Constant(1.0),
//!     &bounding_box(2),
//!     &DMatrix::zeros(0, 2),
//!     &DistmeshOptions::default(),
//! )
//! .unwrap();
//!
//! println!("Points: {}", result.mesh.num_points());
//! println!("Triangles: {}", result.mesh.num_simplices());
//!
//! // Boundary edges, oriented with the mesh on their left.
//! let edges = result.mesh.edges();
//! for boundary in result.mesh.boundary_edges().unwrap() {
//!     let [a, b] = boundary.vertices(&edges);
//!     assert_ne!(a, b);
//! }
//! ```
//!
//! ## Composite Domains
//!
//! ```
//! use distmesh::prelude::*;
//! use nalgebra::DMatrix;
//!
//! // Square with a circular hole; corners are fixed.
//! let domain = Rectangle::new(&[-1.0, -1.0], &[1.0, 1.0])
//!     .difference(Sphere::new(&[0.0, 0.0], 0.4));
//! let size = from_fn(|p: &[f64]| 0.05 + 0.3 * ((p[0] * p[0] + p[1] * p[1]).sqrt() - 0.4));
//! let corners = DMatrix::from_row_slice(4, 2, &[-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0]);
//!
//! let options = DistmeshOptions::default().with_max_steps(200);
//! let result = distmesh(&domain, 0.1, &size, &bounding_box(2), &corners, &options).unwrap();
//! assert_eq!(result.mesh.point(0), vec![-1.0, -1.0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod field;
pub mod mesh;
pub mod triangulate;

/// Prelude module for convenient imports.
///
/// ```
/// use distmesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        distmesh, distmesh_with, project_to_boundary, relax, sample_points, Distmesh,
        DistmeshOptions, Progress, RelaxStatus,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::field::{
        from_fn, Constant, Difference, Intersection, Polygon, Rectangle, ScalarField, Sphere,
        Union,
    };
    pub use crate::mesh::{
        bounding_box, boundary_edges, edge_indices_for_simplices, unique_edges, BoundaryEdge,
        Edge, Mesh,
    };
    pub use crate::triangulate::{BowyerWatson, Triangulator};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::DMatrix;

    #[test]
    fn test_disk_pipeline() {
        let result = distmesh(
            &Sphere::unit(2),
            0.3,
            &Constant(1.0),
            &bounding_box(2),
            &DMatrix::zeros(0, 2),
            &DistmeshOptions::default(),
        )
        .unwrap();

        let mesh = &result.mesh;
        assert_eq!(mesh.dimension(), 2);
        assert!(mesh.num_simplices() > 0);

        // Every simplex is a proper triangle over existing points.
        let rebuilt = Mesh::new(mesh.points().clone(), mesh.simplices().clone()).unwrap();
        assert_eq!(&rebuilt, mesh);

        let boundary = mesh.boundary_edges().unwrap();
        assert!(!boundary.is_empty());
        assert!(boundary.len() < mesh.edges().len());
    }
}
