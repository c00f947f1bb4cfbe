//! Initial point distribution.
//!
//! Points start on a regular grid of spacing `h0` covering the bounding box.
//! Grid points outside the domain are rejected, and the survivors are thinned
//! at random so that the local density follows the size field: a point is
//! kept with probability `(min(h) / h(p))^D`.

use nalgebra::DMatrix;
use rand::Rng;

use crate::error::{MeshError, Result};
use crate::field::ScalarField;
use crate::mesh::{mask_rows, stack_rows, validate_bounding_box};

/// Number of grid points per dimension.
///
/// Fails when the grid would not fit in memory addressing.
fn grid_counts(bbox: &DMatrix<f64>, h0: f64) -> Result<Vec<usize>> {
    let too_large = || MeshError::invalid_param("h0", h0, "grid would be too large");
    let mut counts = Vec::with_capacity(bbox.nrows());
    let mut total = bbox.nrows().max(1);
    for dim in 0..bbox.nrows() {
        let steps = ((bbox[(dim, 1)] - bbox[(dim, 0)]) / h0).floor();
        if !(steps.is_finite() && steps < usize::MAX as f64) {
            return Err(too_large());
        }
        let count = (steps as usize).checked_add(1).ok_or_else(too_large)?;
        total = total.checked_mul(count).ok_or_else(too_large)?;
        counts.push(count);
    }
    Ok(counts)
}

/// The regular grid of spacing `h0` anchored at the lower corner of `bbox`.
///
/// Dimension 0 varies fastest.
///
/// # Errors
///
/// Fails with [`MeshError::InvalidParameter`] when the number of
/// coordinates overflows `usize`.
pub fn grid_points(bbox: &DMatrix<f64>, h0: f64) -> Result<DMatrix<f64>> {
    let counts = grid_counts(bbox, h0)?;
    let total: usize = counts.iter().product();
    let mut strides = Vec::with_capacity(counts.len());
    let mut stride = 1;
    for &count in &counts {
        strides.push(stride);
        stride *= count;
    }

    Ok(DMatrix::from_fn(total, counts.len(), |point, dim| {
        let step = (point / strides[dim]) % counts[dim];
        bbox[(dim, 0)] + h0 * step as f64
    }))
}

/// Generate the initial point set.
///
/// The result holds `fixed` first (unchanged and unfiltered), then the
/// sampled interior points.
///
/// # Arguments
///
/// * `distance` - Signed distance field of the domain
/// * `size` - Desired relative element size
/// * `h0` - Grid spacing, i.e. the edge length where `size` is smallest
/// * `bbox` - `D x 2` bounding box, one `[min, max]` row per dimension
/// * `fixed` - `F x D` points that must appear in the mesh (may have 0 rows)
/// * `precision` - Grid points with `distance >= precision * h0` are rejected
/// * `rng` - Source of the thinning draws
///
/// # Errors
///
/// Fails on an invalid bounding box or `h0` (including an `h0` so small that
/// the grid cannot be indexed), when `fixed` does not have `D`
/// columns, and with [`MeshError::DegenerateSampling`] when fewer than
/// `D + 1` points remain.
pub fn sample_points<D, S, R>(
    distance: &D,
    size: &S,
    h0: f64,
    bbox: &DMatrix<f64>,
    fixed: &DMatrix<f64>,
    precision: f64,
    rng: &mut R,
) -> Result<DMatrix<f64>>
where
    D: ScalarField + ?Sized,
    S: ScalarField + ?Sized,
    R: Rng,
{
    validate_bounding_box(bbox)?;
    let dimension = bbox.nrows();
    if !(h0.is_finite() && h0 > 0.0) {
        return Err(MeshError::invalid_param("h0", h0, "must be positive and finite"));
    }
    if fixed.nrows() > 0 && fixed.ncols() != dimension {
        return Err(MeshError::DimensionMismatch {
            expected: dimension,
            found: fixed.ncols(),
        });
    }

    let grid = grid_points(bbox, h0)?;
    let inside: Vec<bool> = distance
        .evaluate(&grid)
        .iter()
        .map(|&d| d < precision * h0)
        .collect();
    let candidates = mask_rows(&grid, &inside);

    let sizes = size.evaluate(&candidates);
    let rho_min = sizes.iter().copied().fold(f64::INFINITY, f64::min);
    let keep: Vec<bool> = sizes
        .iter()
        .map(|&h| {
            let probability = (rho_min / h).powi(dimension as i32);
            rng.gen::<f64>() < probability
        })
        .collect();
    let mut interior = mask_rows(&candidates, &keep);
    if fixed.nrows() > 0 {
        interior = drop_coincident(&interior, fixed, precision * h0);
    }

    log::debug!(
        "sampled {} grid points, {} inside the domain, {} kept after thinning",
        grid.nrows(),
        candidates.nrows(),
        interior.nrows()
    );

    let points = if fixed.nrows() == 0 {
        interior
    } else {
        stack_rows(fixed, &interior)
    };
    if points.nrows() < dimension + 1 {
        return Err(MeshError::degenerate_sampling(points.nrows(), dimension));
    }
    Ok(points)
}

/// Remove rows of `points` closer than `tolerance` to any row of `fixed`.
fn drop_coincident(points: &DMatrix<f64>, fixed: &DMatrix<f64>, tolerance: f64) -> DMatrix<f64> {
    let tolerance_sq = tolerance * tolerance;
    let distinct: Vec<bool> = (0..points.nrows())
        .map(|i| {
            (0..fixed.nrows()).all(|j| (points.row(i) - fixed.row(j)).norm_squared() >= tolerance_sq)
        })
        .collect();
    mask_rows(points, &distinct)
}
