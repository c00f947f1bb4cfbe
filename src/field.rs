//! Scalar fields over point batches.
//!
//! Both the domain description (a signed distance field) and the desired
//! element size are [`ScalarField`]s: they take an `N x D` point array and
//! return one value per row. Fields are always evaluated for a whole batch
//! at a time.
//!
//! Closures of type `Fn(&DMatrix<f64>) -> DVector<f64>` are fields, and
//! [`from_fn`] lifts a per-point function. The remaining types cover common
//! analytic domains and the boolean combinators used to build new ones.
//!
//! # Example
//!
//! ```
//! use distmesh::field::{Rectangle, ScalarField, Sphere};
//! use nalgebra::DMatrix;
//!
//! // Unit square with a hole of radius 0.25 in the middle.
//! let domain = Rectangle::new(&[-1.0, -1.0], &[1.0, 1.0]).difference(Sphere::new(&[0.0, 0.0], 0.25));
//!
//! let probes = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.5, 0.5]);
//! let d = domain.evaluate(&probes);
//! assert!(d[0] > 0.0); // inside the hole
//! assert!(d[1] < 0.0); // inside the domain
//! ```

use nalgebra::{DMatrix, DVector};

/// A scalar function evaluated on a batch of points.
pub trait ScalarField {
    /// Evaluate the field at every row of `points`.
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64>;

    /// Union of two domains (pointwise minimum).
    fn union<B: ScalarField>(self, other: B) -> Union<Self, B>
    where
        Self: Sized,
    {
        Union(self, other)
    }

    /// Intersection of two domains (pointwise maximum).
    fn intersection<B: ScalarField>(self, other: B) -> Intersection<Self, B>
    where
        Self: Sized,
    {
        Intersection(self, other)
    }

    /// This domain with `other` removed.
    fn difference<B: ScalarField>(self, other: B) -> Difference<Self, B>
    where
        Self: Sized,
    {
        Difference(self, other)
    }
}

impl<F> ScalarField for F
where
    F: Fn(&DMatrix<f64>) -> DVector<f64>,
{
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64> {
        self(points)
    }
}

/// A field defined by a function of a single point's coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PointwiseField<F>(F);

/// Lift a per-point function into a [`ScalarField`].
///
/// ```
/// use distmesh::field::{from_fn, ScalarField};
/// use nalgebra::DMatrix;
///
/// // Element size growing away from the origin.
/// let size = from_fn(|p: &[f64]| 0.05 + 0.3 * (p[0] * p[0] + p[1] * p[1]).sqrt());
/// let values = size.evaluate(&DMatrix::from_row_slice(1, 2, &[0.0, 0.0]));
/// assert_eq!(values[0], 0.05);
/// ```
pub fn from_fn<F>(f: F) -> PointwiseField<F>
where
    F: Fn(&[f64]) -> f64,
{
    PointwiseField(f)
}

impl<F> ScalarField for PointwiseField<F>
where
    F: Fn(&[f64]) -> f64,
{
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64> {
        let mut row = vec![0.0; points.ncols()];
        DVector::from_fn(points.nrows(), |i, _| {
            for (slot, &x) in row.iter_mut().zip(points.row(i).iter()) {
                *slot = x;
            }
            (self.0)(&row)
        })
    }
}

/// The same value everywhere, typically a uniform size field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f64);

impl ScalarField for Constant {
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_element(points.nrows(), self.0)
    }
}

/// Signed distance to a circle (2D) or sphere (3D).
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    center: Vec<f64>,
    radius: f64,
}

impl Sphere {
    /// A sphere with the given center and radius.
    pub fn new(center: &[f64], radius: f64) -> Self {
        Self {
            center: center.to_vec(),
            radius,
        }
    }

    /// The unit sphere centered at the origin of a `dimension`-dimensional space.
    pub fn unit(dimension: usize) -> Self {
        Self::new(&vec![0.0; dimension], 1.0)
    }
}

impl ScalarField for Sphere {
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(points.nrows(), |i, _| {
            let squared: f64 = points
                .row(i)
                .iter()
                .zip(&self.center)
                .map(|(x, c)| (x - c) * (x - c))
                .sum();
            squared.sqrt() - self.radius
        })
    }
}

/// Axis-aligned box `[lower, upper]`.
///
/// The distance is exact on both sides of the boundary, so points outside a
/// corner project onto the corner itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Rectangle {
    /// A box spanning `lower` to `upper` in every dimension.
    pub fn new(lower: &[f64], upper: &[f64]) -> Self {
        debug_assert_eq!(lower.len(), upper.len());
        Self {
            lower: lower.to_vec(),
            upper: upper.to_vec(),
        }
    }
}

impl ScalarField for Rectangle {
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(points.nrows(), |i, _| {
            let mut outside_sq = 0.0;
            let mut clearance = f64::INFINITY;
            for ((lo, hi), x) in self.lower.iter().zip(&self.upper).zip(points.row(i).iter()) {
                let gap = (x - lo).min(hi - x);
                clearance = clearance.min(gap);
                if gap < 0.0 {
                    outside_sq += gap * gap;
                }
            }
            if clearance < 0.0 {
                outside_sq.sqrt()
            } else {
                -clearance
            }
        })
    }
}

/// Signed distance to a closed 2D polygon, negative inside.
///
/// Inside/outside uses the even-odd rule, so self-intersecting outlines
/// behave like their filled regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<[f64; 2]>,
}

impl Polygon {
    /// A polygon through `vertices`; the last vertex connects back to the first.
    pub fn new(vertices: &[[f64; 2]]) -> Self {
        Self {
            vertices: vertices.to_vec(),
        }
    }

    fn signed_distance(&self, x: f64, y: f64) -> f64 {
        let n = self.vertices.len();
        let mut distance = f64::INFINITY;
        let mut inside = false;
        for i in 0..n {
            let [ax, ay] = self.vertices[i];
            let [bx, by] = self.vertices[(i + 1) % n];

            let (ex, ey) = (bx - ax, by - ay);
            let length_sq = ex * ex + ey * ey;
            let t = if length_sq > 0.0 {
                (((x - ax) * ex + (y - ay) * ey) / length_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (dx, dy) = (x - ax - t * ex, y - ay - t * ey);
            distance = distance.min((dx * dx + dy * dy).sqrt());

            if (ay > y) != (by > y) && x < ax + (y - ay) * ex / ey {
                inside = !inside;
            }
        }
        if inside {
            -distance
        } else {
            distance
        }
    }
}

impl ScalarField for Polygon {
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(points.nrows(), |i, _| {
            self.signed_distance(points[(i, 0)], points[(i, 1)])
        })
    }
}

/// Union of two domains.
#[derive(Debug, Clone, Copy)]
pub struct Union<A, B>(pub A, pub B);

impl<A: ScalarField, B: ScalarField> ScalarField for Union<A, B> {
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64> {
        self.0.evaluate(points).zip_map(&self.1.evaluate(points), f64::min)
    }
}

/// Intersection of two domains.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<A, B>(pub A, pub B);

impl<A: ScalarField, B: ScalarField> ScalarField for Intersection<A, B> {
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64> {
        self.0.evaluate(points).zip_map(&self.1.evaluate(points), f64::max)
    }
}

/// First domain minus the second.
#[derive(Debug, Clone, Copy)]
pub struct Difference<A, B>(pub A, pub B);

impl<A: ScalarField, B: ScalarField> ScalarField for Difference<A, B> {
    fn evaluate(&self, points: &DMatrix<f64>) -> DVector<f64> {
        self.0
            .evaluate(points)
            .zip_map(&self.1.evaluate(points), |a, b| a.max(-b))
    }
}
