//! Force-equilibrium mesh relaxation.
//!
//! Every edge of the current triangulation is a spring that only pushes:
//! edges shorter than their desired length repel their endpoints, longer
//! edges exert no force. Each step integrates these forces with a fixed
//! time step, projects escaped points back onto the boundary and
//! retriangulates once points have drifted far enough since the last
//! triangulation.
//!
//! # Example
//!
//! ```
//! use distmesh::algo::relax::{distmesh, DistmeshOptions};
//! use distmesh::field::{Constant, Sphere};
//! use distmesh::mesh::bounding_box;
//! use nalgebra::DMatrix;
//!
//! let result = distmesh(
//!     &Sphere::unit(2),
//!     0.4,
//!     &Constant(1.0),
//!     &bounding_box(2),
//!     &DMatrix::zeros(0, 2),
//!     &DistmeshOptions::default(),
//! )
//! .unwrap();
//!
//! assert!(result.mesh.num_simplices() > 0);
//! ```

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{MeshError, Result};
use crate::field::ScalarField;
use crate::mesh::{mask_rows, max_row_distance, row_centroids, unique_edges, Edge, Mesh};
use crate::triangulate::{BowyerWatson, Triangulator};

use super::project::project_rows_from;
use super::sample::sample_points;
use super::Progress;

/// Seed used when none is configured, so repeated runs give the same mesh.
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Options for mesh generation.
///
/// Thresholds are fractions of the initial edge length `h0`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistmeshOptions {
    /// Maximum number of relaxation steps.
    pub max_steps: usize,

    /// Retriangulate once some point moved more than this since the last
    /// triangulation.
    pub retriangulation_threshold: f64,

    /// Simplices whose centroid is not at least this deep inside the domain
    /// are discarded after triangulation.
    pub geometry_evaluation_threshold: f64,

    /// Stop once no point moves more than this in a single step.
    pub points_movement_threshold: f64,

    /// Time step of the force integration.
    pub delta_t: f64,

    /// Width of the band outside the boundary where initial grid points are
    /// still accepted.
    pub precision: f64,

    /// Seed of the random thinning in the initial point distribution.
    pub seed: u64,
}

impl Default for DistmeshOptions {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            retriangulation_threshold: 0.1,
            geometry_evaluation_threshold: 1e-3,
            points_movement_threshold: 1e-3,
            delta_t: 0.2,
            precision: 1e-3,
            seed: DEFAULT_SEED,
        }
    }
}

impl DistmeshOptions {
    /// Set the maximum number of relaxation steps.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the retriangulation threshold.
    pub fn with_retriangulation_threshold(mut self, threshold: f64) -> Self {
        self.retriangulation_threshold = threshold;
        self
    }

    /// Set the centroid rejection threshold.
    pub fn with_geometry_evaluation_threshold(mut self, threshold: f64) -> Self {
        self.geometry_evaluation_threshold = threshold;
        self
    }

    /// Set the convergence threshold.
    pub fn with_points_movement_threshold(mut self, threshold: f64) -> Self {
        self.points_movement_threshold = threshold;
        self
    }

    /// Set the integration time step.
    pub fn with_delta_t(mut self, delta_t: f64) -> Self {
        self.delta_t = delta_t;
        self
    }

    /// Set the sampling tolerance band.
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    /// Set the random seed of the initial point distribution.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check that every option is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(MeshError::invalid_param("max_steps", 0, "must be at least 1"));
        }
        let positive = [
            ("retriangulation_threshold", self.retriangulation_threshold),
            ("geometry_evaluation_threshold", self.geometry_evaluation_threshold),
            ("points_movement_threshold", self.points_movement_threshold),
            ("delta_t", self.delta_t),
            ("precision", self.precision),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MeshError::invalid_param(name, value, "must be positive and finite"));
            }
        }
        Ok(())
    }
}

/// How a relaxation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxStatus {
    /// Point movement fell below the convergence threshold.
    Converged,
    /// The step cap was hit first; the mesh is still usable.
    MaxStepsReached,
}

/// The outcome of a mesh generation run.
#[derive(Debug, Clone)]
pub struct Distmesh {
    /// The generated mesh.
    pub mesh: Mesh,
    /// Whether the run converged.
    pub status: RelaxStatus,
    /// Number of relaxation steps performed.
    pub steps: usize,
    /// Number of triangulations computed.
    pub retriangulations: usize,
}

impl Distmesh {
    /// `true` if the movement threshold was reached before the step cap.
    pub fn is_converged(&self) -> bool {
        self.status == RelaxStatus::Converged
    }

    /// Split into the point and simplex arrays.
    pub fn into_parts(self) -> (DMatrix<f64>, DMatrix<usize>) {
        self.mesh.into_parts()
    }
}

/// Generate a mesh of the domain `distance < 0` with relative element size `size`.
///
/// Uses the built-in [`BowyerWatson`] triangulator; see [`distmesh_with`].
///
/// # Arguments
///
/// * `distance` - Signed distance field, negative inside the domain
/// * `h0` - Initial edge length (where `size` is smallest)
/// * `size` - Relative element size field
/// * `bbox` - `D x 2` bounding box enclosing the domain
/// * `fixed` - `F x D` points kept in place (pass `DMatrix::zeros(0, D)` for none)
/// * `options` - Loop parameters and random seed
pub fn distmesh<D, S>(
    distance: &D,
    h0: f64,
    size: &S,
    bbox: &DMatrix<f64>,
    fixed: &DMatrix<f64>,
    options: &DistmeshOptions,
) -> Result<Distmesh>
where
    D: ScalarField + ?Sized,
    S: ScalarField + ?Sized,
{
    distmesh_with(
        distance,
        h0,
        size,
        bbox,
        fixed,
        options,
        &BowyerWatson::default(),
        &Progress::none(),
    )
}

/// [`distmesh`] with a custom triangulator and progress reporting.
///
/// Samples the initial points with [`sample_points`] seeded from
/// `options.seed`, then runs [`relax`] with the fixed points as the
/// immobile prefix.
#[allow(clippy::too_many_arguments)]
pub fn distmesh_with<D, S, T>(
    distance: &D,
    h0: f64,
    size: &S,
    bbox: &DMatrix<f64>,
    fixed: &DMatrix<f64>,
    options: &DistmeshOptions,
    triangulator: &T,
    progress: &Progress,
) -> Result<Distmesh>
where
    D: ScalarField + ?Sized,
    S: ScalarField + ?Sized,
    T: Triangulator + ?Sized,
{
    options.validate()?;
    let mut rng = StdRng::seed_from_u64(options.seed);
    let points = sample_points(distance, size, h0, bbox, fixed, options.precision, &mut rng)?;
    relax(
        distance,
        size,
        h0,
        points,
        fixed.nrows(),
        options,
        triangulator,
        progress,
    )
}

/// Relax an existing point set towards force equilibrium.
///
/// The first `fixed_count` rows of `points` never move. The number of
/// points is unchanged by the run.
///
/// # Errors
///
/// Fails on invalid options or `h0`, on non-finite coordinates, when
/// `fixed_count` exceeds the number of points, on triangulation errors, and with
/// [`MeshError::DegenerateSampling`] when no simplex has its centroid
/// inside the domain.
#[allow(clippy::too_many_arguments)]
pub fn relax<D, S, T>(
    distance: &D,
    size: &S,
    h0: f64,
    mut points: DMatrix<f64>,
    fixed_count: usize,
    options: &DistmeshOptions,
    triangulator: &T,
    progress: &Progress,
) -> Result<Distmesh>
where
    D: ScalarField + ?Sized,
    S: ScalarField + ?Sized,
    T: Triangulator + ?Sized,
{
    options.validate()?;
    if !(h0.is_finite() && h0 > 0.0) {
        return Err(MeshError::invalid_param("h0", h0, "must be positive and finite"));
    }
    let (count, dimension) = points.shape();
    if fixed_count > count {
        return Err(MeshError::invalid_param(
            "fixed_count",
            fixed_count,
            "exceeds the number of points",
        ));
    }
    if dimension == 0 || count < dimension + 1 {
        return Err(MeshError::degenerate_sampling(count, dimension));
    }
    if let Some(bad) = points.iter().find(|x| !x.is_finite()) {
        return Err(MeshError::invalid_param(
            "points",
            bad,
            "coordinates must be finite",
        ));
    }

    let bias = 1.0 + 0.4 / 2f64.powi(dimension as i32 - 1);
    let exponent = dimension as i32;

    // +inf forces a triangulation on the first step.
    let mut triangulated_at = DMatrix::from_element(count, dimension, f64::INFINITY);
    let mut step_start = points.clone();
    let mut simplices = DMatrix::<usize>::zeros(0, dimension + 1);
    let mut edges: Vec<Edge> = Vec::new();
    let mut edge_vectors = DMatrix::zeros(0, dimension);
    let mut midpoints = DMatrix::zeros(0, dimension);
    let mut lengths: Vec<f64> = Vec::new();

    let mut retriangulations = 0;
    let mut status = RelaxStatus::MaxStepsReached;
    let mut steps = options.max_steps;

    for step in 0..options.max_steps {
        progress.report(step, options.max_steps, "Relaxing mesh");

        if max_row_distance(&points, &triangulated_at) > options.retriangulation_threshold * h0 {
            let candidates = triangulator.triangulate(&points)?;
            let depth = distance.evaluate(&row_centroids(&points, &candidates));
            let inside: Vec<bool> = depth
                .iter()
                .map(|&d| d < -options.geometry_evaluation_threshold * h0)
                .collect();
            simplices = mask_rows(&candidates, &inside);
            if simplices.nrows() == 0 {
                return Err(MeshError::degenerate_sampling(0, dimension));
            }

            edges = unique_edges(&simplices);
            edge_vectors = DMatrix::zeros(edges.len(), dimension);
            midpoints = DMatrix::zeros(edges.len(), dimension);
            lengths.resize(edges.len(), 0.0);
            triangulated_at.copy_from(&points);
            retriangulations += 1;

            log::debug!(
                "step {step}: retriangulated, kept {} of {} simplices, {} edges",
                simplices.nrows(),
                candidates.nrows(),
                edges.len()
            );
        }

        for (k, &[a, b]) in edges.iter().enumerate() {
            for axis in 0..dimension {
                let (pa, pb) = (points[(a, axis)], points[(b, axis)]);
                edge_vectors[(k, axis)] = pa - pb;
                midpoints[(k, axis)] = 0.5 * (pa + pb);
            }
            // Coincident endpoints would divide by zero below.
            lengths[k] = edge_vectors.row(k).norm().max(f64::EPSILON * h0);
        }

        let desired = size.evaluate(&midpoints);
        let actual_volume: f64 = lengths.iter().map(|l| l.powi(exponent)).sum();
        let desired_volume: f64 = desired.iter().map(|h| h.powi(exponent)).sum();
        let mut scale = (actual_volume / desired_volume).powf(1.0 / dimension as f64);
        if !(scale.is_finite() && scale > 0.0) {
            log::trace!("step {step}: degenerate size normalisation, using unit scale");
            scale = 1.0;
        }

        step_start.copy_from(&points);

        for (k, &[a, b]) in edges.iter().enumerate() {
            let target = desired[k] * bias * scale;
            let magnitude = ((target - lengths[k]) / lengths[k]).max(0.0);
            if magnitude == 0.0 {
                continue;
            }
            let force = edge_vectors.row(k) * (options.delta_t * magnitude);
            if a >= fixed_count {
                let mut row = points.row_mut(a);
                row += &force;
            }
            if b >= fixed_count {
                let mut row = points.row_mut(b);
                row -= &force;
            }
        }

        project_rows_from(distance, h0, &mut points, fixed_count);

        let movement = max_row_distance(&points, &step_start);
        log::trace!("step {step}: max movement {movement:.3e}");
        if movement < options.points_movement_threshold * h0 {
            status = RelaxStatus::Converged;
            steps = step + 1;
            progress.report(steps, options.max_steps, "Converged");
            break;
        }
    }

    match status {
        RelaxStatus::Converged => log::debug!(
            "converged after {steps} steps and {retriangulations} triangulations"
        ),
        RelaxStatus::MaxStepsReached => log::warn!(
            "stopped after {steps} steps without reaching the movement threshold"
        ),
    }

    Ok(Distmesh {
        mesh: Mesh::from_parts(points, simplices),
        status,
        steps,
        retriangulations,
    })
}
