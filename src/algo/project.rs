//! Projection of stray points back onto the domain boundary.

use nalgebra::DMatrix;

use crate::field::ScalarField;
use crate::mesh::gather_rows;

/// Move every point with positive distance onto the zero level set.
///
/// Each outside point takes one Newton step along the numerical gradient
/// of `distance`:
///
/// ```text
/// grad_k = (d(p + eps * e_k) - d(p)) / eps,   eps = sqrt(f64::EPSILON) * h0
/// p     -= d(p) * grad / |grad|^2
/// ```
///
/// Points with `d <= 0` are not touched. The step is exact for planar
/// boundaries and first-order accurate elsewhere. A point where the
/// gradient vanishes is left in place. Returns the number of points moved.
///
/// # Example
///
/// ```
/// use distmesh::algo::project::project_to_boundary;
/// use distmesh::field::Sphere;
/// use nalgebra::DMatrix;
///
/// let mut points = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.5, 0.0]);
/// let moved = project_to_boundary(&Sphere::unit(2), 0.1, &mut points);
///
/// assert_eq!(moved, 1);
/// assert!((points[(0, 0)] - 1.0).abs() < 1e-6);
/// assert_eq!(points[(1, 0)], 0.5);
/// ```
pub fn project_to_boundary<D>(distance: &D, h0: f64, points: &mut DMatrix<f64>) -> usize
where
    D: ScalarField + ?Sized,
{
    project_rows_from(distance, h0, points, 0)
}

/// [`project_to_boundary`] restricted to rows `first..`; earlier rows never move.
pub(crate) fn project_rows_from<D>(
    distance: &D,
    h0: f64,
    points: &mut DMatrix<f64>,
    first: usize,
) -> usize
where
    D: ScalarField + ?Sized,
{
    let values = distance.evaluate(points);
    let outside: Vec<usize> = (first..points.nrows()).filter(|&i| values[i] > 0.0).collect();
    if outside.is_empty() {
        return 0;
    }

    let eps = f64::EPSILON.sqrt() * h0;
    let stray = gather_rows(points, &outside);
    let base: Vec<f64> = outside.iter().map(|&i| values[i]).collect();

    let mut gradient = DMatrix::zeros(outside.len(), points.ncols());
    for axis in 0..points.ncols() {
        let mut shifted = stray.clone();
        shifted.column_mut(axis).add_scalar_mut(eps);
        let probed = distance.evaluate(&shifted);
        for (row, &d) in base.iter().enumerate() {
            gradient[(row, axis)] = (probed[row] - d) / eps;
        }
    }

    let mut moved = 0;
    for (row, &index) in outside.iter().enumerate() {
        let norm_sq = gradient.row(row).norm_squared();
        if !(norm_sq > f64::MIN_POSITIVE) || !norm_sq.is_finite() {
            log::trace!("point {index}: vanishing distance gradient, not projected");
            continue;
        }
        let step = gradient.row(row) * (base[row] / norm_sq);
        let mut target = points.row_mut(index);
        target -= step;
        moved += 1;
    }
    moved
}
