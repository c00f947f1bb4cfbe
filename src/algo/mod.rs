//! Mesh generation algorithms.
//!
//! - **Sampling**: initial point distribution following the size field
//! - **Projection**: pulling escaped points back onto the domain boundary
//! - **Relaxation**: the force-equilibrium loop driving the whole pipeline
//! - **Progress**: callbacks for long relaxation runs

pub mod progress;
pub mod project;
pub mod relax;
pub mod sample;

pub use progress::Progress;
pub use project::project_to_boundary;
pub use relax::{distmesh, distmesh_with, relax, Distmesh, DistmeshOptions, RelaxStatus};
pub use sample::{grid_points, sample_points};
