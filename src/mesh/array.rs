//! Row-oriented helpers for dense point and index arrays.
//!
//! Points, simplices and bounding boxes are all stored as [`DMatrix`] values
//! where each row is one record. These helpers gather, filter and compare
//! rows without caring about the element type.

use nalgebra::{DMatrix, Scalar};

/// Gather the rows of `array` listed in `indices`, in that order.
///
/// # Panics
/// Panics if an index is out of range.
///
/// # Example
/// ```
/// use distmesh::mesh::gather_rows;
/// use nalgebra::DMatrix;
///
/// let points = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
/// let picked = gather_rows(&points, &[2, 0]);
/// assert_eq!(picked[(0, 1)], 1.0);
/// assert_eq!(picked[(1, 0)], 0.0);
/// ```
pub fn gather_rows<T: Scalar>(array: &DMatrix<T>, indices: &[usize]) -> DMatrix<T> {
    DMatrix::from_fn(indices.len(), array.ncols(), |row, col| {
        array[(indices[row], col)].clone()
    })
}

/// Keep the rows of `array` whose entry in `mask` is `true`.
///
/// # Panics
/// Panics if `mask` is shorter than the number of rows.
pub fn mask_rows<T: Scalar>(array: &DMatrix<T>, mask: &[bool]) -> DMatrix<T> {
    assert!(
        mask.len() >= array.nrows(),
        "mask has {} entries for {} rows",
        mask.len(),
        array.nrows()
    );
    let kept: Vec<usize> = (0..array.nrows()).filter(|&row| mask[row]).collect();
    gather_rows(array, &kept)
}

/// Concatenate two arrays with the same column count, `top` first.
pub fn stack_rows<T: Scalar>(top: &DMatrix<T>, bottom: &DMatrix<T>) -> DMatrix<T> {
    debug_assert_eq!(top.ncols(), bottom.ncols());
    let split = top.nrows();
    DMatrix::from_fn(split + bottom.nrows(), top.ncols(), |row, col| {
        if row < split {
            top[(row, col)].clone()
        } else {
            bottom[(row - split, col)].clone()
        }
    })
}

/// Largest Euclidean distance between corresponding rows of `a` and `b`.
///
/// Returns `0.0` for empty arrays and `+inf` when either array holds
/// infinite or NaN coordinates.
pub fn max_row_distance(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    debug_assert_eq!(a.shape(), b.shape());
    (0..a.nrows())
        .map(|row| {
            (0..a.ncols())
                .map(|col| {
                    let delta = a[(row, col)] - b[(row, col)];
                    delta * delta
                })
                .sum::<f64>()
                .sqrt()
        })
        .fold(0.0, |max, distance| {
            // f64::max would skip NaN.
            if distance.is_nan() {
                f64::INFINITY
            } else {
                max.max(distance)
            }
        })
}

/// Mean of the rows selected by each row of `simplices`.
///
/// For a simplex array this yields one centroid per simplex.
pub fn row_centroids(points: &DMatrix<f64>, simplices: &DMatrix<usize>) -> DMatrix<f64> {
    let mut centroids = DMatrix::zeros(simplices.nrows(), points.ncols());
    if simplices.ncols() == 0 {
        return centroids;
    }
    let weight = 1.0 / simplices.ncols() as f64;
    for corner in simplices.column_iter() {
        let indices: Vec<usize> = corner.iter().copied().collect();
        centroids += gather_rows(points, &indices) * weight;
    }
    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gather_and_mask() {
        let indices = DMatrix::from_row_slice(3, 3, &[0usize, 1, 2, 1, 2, 3, 2, 3, 4]);

        let gathered = gather_rows(&indices, &[2, 2, 0]);
        assert_eq!(gathered.nrows(), 3);
        assert_eq!(gathered.row(0), gathered.row(1));
        assert_eq!(gathered[(2, 2)], 2);

        let masked = mask_rows(&indices, &[true, false, true]);
        assert_eq!(masked.nrows(), 2);
        assert_eq!(masked[(1, 0)], 2);

        let none = mask_rows(&indices, &[false, false, false]);
        assert_eq!(none.shape(), (0, 3));
    }

    #[test]
    fn test_stack_rows() {
        let top = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let bottom = DMatrix::from_row_slice(2, 2, &[3.0, 4.0, 5.0, 6.0]);
        let stacked = stack_rows(&top, &bottom);
        assert_eq!(stacked.shape(), (3, 2));
        assert_eq!(stacked[(0, 1)], 2.0);
        assert_eq!(stacked[(2, 0)], 5.0);
    }

    #[test]
    fn test_max_row_distance() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
        let b = DMatrix::from_row_slice(2, 2, &[3.0, 4.0, 1.0, 1.0]);
        assert_relative_eq!(max_row_distance(&a, &b), 5.0);

        let far = DMatrix::from_element(2, 2, f64::INFINITY);
        assert!(max_row_distance(&a, &far).is_infinite());
    }

    #[test]
    fn test_max_row_distance_with_nan() {
        let a = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, f64::NAN, 1.0, 2.0, 2.0]);
        let b = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        assert_eq!(max_row_distance(&a, &b), f64::INFINITY);
        assert_eq!(max_row_distance(&b, &a), f64::INFINITY);

        // NaN in the last row must not be folded away either.
        let c = DMatrix::from_row_slice(3, 2, &[5.0, 0.0, 1.0, 1.0, f64::NAN, 2.0]);
        assert_eq!(max_row_distance(&c, &b), f64::INFINITY);
    }

    #[test]
    fn test_row_centroids() {
        let points = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 3.0, 0.0, 0.0, 3.0, 3.0, 3.0]);
        let simplices = DMatrix::from_row_slice(2, 3, &[0usize, 1, 2, 1, 3, 2]);
        let centroids = row_centroids(&points, &simplices);
        assert_relative_eq!(centroids[(0, 0)], 1.0);
        assert_relative_eq!(centroids[(0, 1)], 1.0);
        assert_relative_eq!(centroids[(1, 0)], 2.0);
        assert_relative_eq!(centroids[(1, 1)], 2.0);
    }
}
