//! Error types for distmesh.
//!
//! Sampling and shape problems are reported immediately through
//! [`MeshError`]. Running out of relaxation steps is not an error; see
//! [`RelaxStatus`](crate::algo::relax::RelaxStatus).

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while generating or inspecting a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The bounding box has zero, negative or non-finite extent in a dimension.
    #[error("bounding box has invalid extent [{min}, {max}] in dimension {dimension}")]
    InvalidBoundingBox {
        /// The offending dimension.
        dimension: usize,
        /// Lower bound of that dimension.
        min: f64,
        /// Upper bound of that dimension.
        max: f64,
    },

    /// Too few points to build a single simplex.
    #[error("only {points} points available, at least {required} are needed to triangulate")]
    DegenerateSampling {
        /// Number of points available.
        points: usize,
        /// Number of points required (dimension + 1).
        required: usize,
    },

    /// A numerical computation collapsed (zero-measure simplex, singular system).
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// Array widths disagree with the mesh dimension.
    #[error("dimension mismatch: expected {expected} columns, found {found}")]
    DimensionMismatch {
        /// Expected number of columns.
        expected: usize,
        /// Number of columns found.
        found: usize,
    },

    /// A simplex references a point that does not exist.
    #[error("simplex {simplex} references invalid point index {vertex}")]
    InvalidVertexIndex {
        /// The simplex row.
        simplex: usize,
        /// The invalid point index.
        vertex: usize,
    },

    /// A simplex edge has no row in the supplied edge array.
    #[error("edge ({}, {}) of simplex {simplex} is missing from the edge array", edge[0], edge[1])]
    MissingEdge {
        /// The simplex row.
        simplex: usize,
        /// The missing edge in canonical order.
        edge: [usize; 2],
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a degenerate sampling error for a `dimension`-dimensional mesh.
    pub fn degenerate_sampling(points: usize, dimension: usize) -> Self {
        MeshError::DegenerateSampling {
            points,
            required: dimension + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = MeshError::invalid_param("h0", -1.0, "must be positive");
        assert_eq!(err.to_string(), "invalid parameter: h0 = -1 (must be positive)");

        let err = MeshError::degenerate_sampling(2, 2);
        assert_eq!(
            err,
            MeshError::DegenerateSampling {
                points: 2,
                required: 3
            }
        );

        let err = MeshError::MissingEdge {
            simplex: 4,
            edge: [1, 7],
        };
        assert!(err.to_string().contains("(1, 7)"));
    }
}
