//! Delaunay triangulation of point arrays.
//!
//! The relaxation loop only needs a function from an `N x D` point array to
//! an `M x (D + 1)` simplex array, captured by the [`Triangulator`] trait.
//! Any closure with the right signature is a triangulator, so an external
//! Delaunay library can be plugged in directly.
//!
//! [`BowyerWatson`] is the built-in implementation. It works in any
//! dimension and is adequate for the point counts distmesh produces from
//! moderate `h0`; point location scans all live simplices per insertion.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use nalgebra::{DMatrix, DVector};

use crate::error::{MeshError, Result};
use crate::mesh::stack_rows;

/// Computes a Delaunay triangulation of a point array.
pub trait Triangulator {
    /// Triangulate the rows of `points`, returning one simplex per row.
    fn triangulate(&self, points: &DMatrix<f64>) -> Result<DMatrix<usize>>;
}

impl<F> Triangulator for F
where
    F: Fn(&DMatrix<f64>) -> Result<DMatrix<usize>>,
{
    fn triangulate(&self, points: &DMatrix<f64>) -> Result<DMatrix<usize>> {
        self(points)
    }
}

/// Incremental Bowyer-Watson Delaunay triangulation.
///
/// Points are inserted one at a time into an enclosing super-simplex. Each
/// insertion locates the simplex containing the new point, grows the
/// conflict cavity through facet neighbours whose circumsphere strictly
/// contains the point, and re-stars the cavity. Simplices touching the
/// super-simplex are discarded at the end. Every output row lists its
/// vertices in ascending order, with the first two swapped where needed so
/// that the determinant of its edge vectors is positive (counter-clockwise
/// triangles in 2D).
///
/// Cocircular and cospherical points make the conflict test ambiguous, so
/// the cavity is adjusted until it is star-shaped around the new point with
/// every old vertex on its boundary. The result stays a valid triangulation
/// however rounding resolves the ties. Flat simplices are never created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BowyerWatson {
    /// Distance of the super-simplex from the input, relative to the
    /// extent of the input.
    ///
    /// Convex-hull simplices whose circumsphere reaches another input point
    /// through a super-simplex vertex are lost, so larger values keep thinner
    /// hull simplices at the cost of some floating point precision.
    pub super_scale: f64,
}

impl Default for BowyerWatson {
    fn default() -> Self {
        Self {
            super_scale: 1000.0,
        }
    }
}

impl BowyerWatson {
    /// Create a triangulator with the given super-simplex scale.
    pub fn with_super_scale(mut self, scale: f64) -> Self {
        self.super_scale = scale;
        self
    }
}

/// A live simplex with its circumsphere.
#[derive(Debug, Clone)]
struct Cell {
    vertices: Vec<usize>,
    center: DVector<f64>,
    radius_sq: f64,
}

impl Cell {
    /// `None` when the vertices are affinely dependent.
    fn new(coords: &DMatrix<f64>, vertices: Vec<usize>) -> Option<Self> {
        let (center, radius_sq) = circumsphere(coords, &vertices)?;
        Some(Self {
            vertices,
            center,
            radius_sq,
        })
    }

    fn encloses(&self, coords: &DMatrix<f64>, point: usize) -> bool {
        let distance_sq: f64 = self
            .center
            .iter()
            .zip(coords.row(point).iter())
            .map(|(c, x)| (x - c) * (x - c))
            .sum();
        distance_sq < self.radius_sq
    }

    /// The facet opposite local vertex `skip`, in cell order.
    fn facet(&self, skip: usize) -> Vec<usize> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != skip)
            .map(|(_, &v)| v)
            .collect()
    }
}

fn facet_key(facet: &[usize]) -> Vec<usize> {
    let mut key = facet.to_vec();
    key.sort_unstable();
    key
}

/// Live cells plus the facet adjacency between them.
#[derive(Debug, Default)]
struct Complex {
    cells: Vec<Option<Cell>>,
    facets: HashMap<Vec<usize>, Vec<usize>>,
}

impl Complex {
    fn insert(&mut self, cell: Cell) {
        let id = self.cells.len();
        for skip in 0..cell.vertices.len() {
            self.facets
                .entry(facet_key(&cell.facet(skip)))
                .or_default()
                .push(id);
        }
        self.cells.push(Some(cell));
    }

    fn remove(&mut self, id: usize) {
        let Some(cell) = self.cells.get_mut(id).and_then(Option::take) else {
            return;
        };
        for skip in 0..cell.vertices.len() {
            let key = facet_key(&cell.facet(skip));
            if let Some(owners) = self.facets.get_mut(&key) {
                owners.retain(|&owner| owner != id);
                if owners.is_empty() {
                    self.facets.remove(&key);
                }
            }
        }
    }

    fn cell(&self, id: usize) -> Option<&Cell> {
        self.cells.get(id).and_then(Option::as_ref)
    }

    /// The cell sharing the facet opposite local vertex `skip` of cell `id`.
    fn neighbor(&self, id: usize, skip: usize) -> Option<usize> {
        let cell = self.cell(id)?;
        self.facets
            .get(&facet_key(&cell.facet(skip)))?
            .iter()
            .copied()
            .find(|&owner| owner != id)
    }

    fn live(&self) -> impl Iterator<Item = (usize, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(id, cell)| cell.as_ref().map(|cell| (id, cell)))
    }

    /// The cell containing `point` most deeply.
    fn locate(&self, coords: &DMatrix<f64>, point: usize) -> Option<usize> {
        let mut best = None;
        let mut best_depth = f64::NEG_INFINITY;
        for (id, cell) in self.live() {
            if let Some(depth) = barycentric_depth(coords, &cell.vertices, point) {
                if depth > best_depth {
                    best = Some(id);
                    best_depth = depth;
                }
            }
        }
        best
    }

    /// Keep only the cavity cells reachable from `seed` through the cavity.
    fn retain_connected(&self, cavity: &mut BTreeSet<usize>, seed: usize) {
        let mut reached = BTreeSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        while let Some(id) = queue.pop_front() {
            let arity = self.cell(id).map_or(0, |cell| cell.vertices.len());
            for skip in 0..arity {
                if let Some(next) = self.neighbor(id, skip) {
                    if cavity.contains(&next) && reached.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        *cavity = reached;
    }

    /// Re-star the cavity of `point`. Returns `false`, leaving the complex
    /// untouched, when the point duplicates a vertex or no valid cavity exists.
    fn insert_point(&mut self, coords: &DMatrix<f64>, point: usize, coincidence_sq: f64) -> bool {
        let Some(seed) = self.locate(coords, point) else {
            return false;
        };
        let coincides =
            |v: usize| (coords.row(v) - coords.row(point)).norm_squared() <= coincidence_sq;

        let mut cavity = BTreeSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        while let Some(id) = queue.pop_front() {
            for skip in 0..=coords.ncols() {
                let Some(next) = self.neighbor(id, skip) else {
                    continue;
                };
                let conflicts = self
                    .cell(next)
                    .is_some_and(|cell| cell.encloses(coords, point));
                if conflicts && cavity.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        // Pinned cells contain the point, or were added so that it sees a
        // facet of a pinned cell. They never leave the cavity.
        let mut pinned = BTreeSet::from([seed]);
        loop {
            self.retain_connected(&mut cavity, seed);

            let mut fan = Vec::new();
            let mut hidden = Vec::new();
            let mut on_boundary = HashSet::new();
            for &id in &cavity {
                let Some(cell) = self.cell(id) else {
                    continue;
                };
                for skip in 0..cell.vertices.len() {
                    let across = self.neighbor(id, skip);
                    if across.is_some_and(|next| cavity.contains(&next)) {
                        continue;
                    }
                    let facet = cell.facet(skip);
                    on_boundary.extend(facet.iter().copied());
                    match star_cell(coords, facet, cell.vertices[skip], point) {
                        Some(new) => fan.push(new),
                        None => hidden.push((id, across)),
                    }
                }
            }
            let interior: BTreeSet<usize> = cavity
                .iter()
                .filter_map(|&id| self.cell(id))
                .flat_map(|cell| cell.vertices.iter().copied())
                .filter(|v| !on_boundary.contains(v))
                .collect();

            if on_boundary.iter().any(|&v| coincides(v)) {
                return false;
            }
            if hidden.is_empty() && interior.is_empty() {
                for id in cavity {
                    self.remove(id);
                }
                for cell in fan {
                    self.insert(cell);
                }
                return true;
            }

            for (id, across) in hidden {
                if !pinned.contains(&id) {
                    cavity.remove(&id);
                    continue;
                }
                let Some(next) = across else {
                    return false;
                };
                cavity.insert(next);
                pinned.insert(next);
            }
            for vertex in interior {
                let holders: Vec<usize> = cavity
                    .iter()
                    .copied()
                    .filter(|&id| {
                        self.cell(id)
                            .is_some_and(|cell| cell.vertices.contains(&vertex))
                    })
                    .collect();
                if holders.iter().any(|id| pinned.contains(id)) {
                    return false;
                }
                for id in holders {
                    cavity.remove(&id);
                }
            }
        }
    }
}

/// The cell joining `facet` to `point`, if `point` lies strictly on the same
/// side of the facet as `opposite` and the new cell is not flat.
fn star_cell(
    coords: &DMatrix<f64>,
    facet: Vec<usize>,
    opposite: usize,
    point: usize,
) -> Option<Cell> {
    let mut vertices = facet;
    vertices.push(opposite);
    let side = signed_volume(coords, &vertices);
    if let Some(last) = vertices.last_mut() {
        *last = point;
    }
    if side == 0.0 || orientation(coords, &vertices)? != side.signum() {
        return None;
    }
    Cell::new(coords, vertices)
}

impl Triangulator for BowyerWatson {
    fn triangulate(&self, points: &DMatrix<f64>) -> Result<DMatrix<usize>> {
        let (count, dimension) = points.shape();
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
        if !(self.super_scale.is_finite() && self.super_scale > 1.0) {
            return Err(MeshError::invalid_param(
                "super_scale",
                self.super_scale,
                "must be finite and greater than 1",
            ));
        }

        let coords = stack_rows(points, &self.super_simplex(points));
        let coincidence_sq = (1e-12 * bounding_extent(points)).powi(2);
        let root = Cell::new(&coords, (count..count + dimension + 1).collect()).ok_or_else(|| {
            MeshError::NumericalDegeneracy("super-simplex has no volume".to_string())
        })?;

        let mut complex = Complex::default();
        complex.insert(root);
        let mut skipped = 0;
        for point in 0..count {
            if !complex.insert_point(&coords, point, coincidence_sq) {
                log::trace!("skipping point {point}: duplicate or no star-shaped cavity");
                skipped += 1;
            }
        }

        let mut rows: Vec<Vec<usize>> = Vec::new();
        for (_, cell) in complex.live() {
            if cell.vertices.iter().any(|&v| v >= count) {
                continue;
            }
            let mut vertices = cell.vertices.clone();
            vertices.sort_unstable();
            if signed_volume(&coords, &vertices) < 0.0 {
                vertices.swap(0, 1);
            }
            rows.push(vertices);
        }
        if rows.is_empty() {
            return Err(MeshError::NumericalDegeneracy(format!(
                "{count} points span no {dimension}-dimensional simplex"
            )));
        }
        rows.sort_unstable();

        log::trace!(
            "triangulated {count} points into {} simplices, {skipped} skipped",
            rows.len()
        );
        Ok(DMatrix::from_fn(rows.len(), dimension + 1, |r, c| rows[r][c]))
    }
}

impl BowyerWatson {
    /// Vertices of a simplex that comfortably contains every input point.
    ///
    /// The simplex is the corner region `{x >= origin, sum(x - origin) <= span}`.
    fn super_simplex(&self, points: &DMatrix<f64>) -> DMatrix<f64> {
        let dimension = points.ncols();
        let lower: Vec<f64> = points
            .column_iter()
            .map(|c| c.iter().copied().fold(f64::INFINITY, f64::min))
            .collect();
        let extent = bounding_extent(points);

        let margin = self.super_scale * extent;
        let span = dimension as f64 * (2.0 * margin + extent) * 2.0;
        DMatrix::from_fn(dimension + 1, dimension, |vertex, axis| {
            let origin = lower[axis] - margin;
            if vertex == axis + 1 {
                origin + span
            } else {
                origin
            }
        })
    }
}

/// Largest side of the axis-aligned bounding box of `points`, at least `f64::EPSILON`.
fn bounding_extent(points: &DMatrix<f64>) -> f64 {
    points
        .column_iter()
        .map(|c| {
            let lo = c.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = c.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            hi - lo
        })
        .fold(0.0, f64::max)
        .max(f64::EPSILON)
}

/// Circumsphere of the simplex spanned by `vertices`, or `None` when flat.
fn circumsphere(coords: &DMatrix<f64>, vertices: &[usize]) -> Option<(DVector<f64>, f64)> {
    let dimension = coords.ncols();
    let base = coords.row(vertices[0]).transpose();

    let mut system = DMatrix::zeros(dimension, dimension);
    let mut rhs = DVector::zeros(dimension);
    let mut scale = 1.0;
    for (row, &v) in vertices[1..].iter().enumerate() {
        let edge = coords.row(v).transpose() - &base;
        let length_sq = edge.norm_squared();
        system.row_mut(row).copy_from(&(edge.transpose() * 2.0));
        rhs[row] = length_sq;
        scale *= 2.0 * length_sq.sqrt();
    }

    let lu = system.lu();
    if lu.determinant().abs() <= 1e-12 * scale {
        return None;
    }
    let offset = lu.solve(&rhs)?;
    let radius_sq = offset.norm_squared();
    if !radius_sq.is_finite() {
        return None;
    }
    Some((base + offset, radius_sq))
}

/// Smallest barycentric coordinate of `point` in the simplex, `None` when flat.
fn barycentric_depth(coords: &DMatrix<f64>, vertices: &[usize], point: usize) -> Option<f64> {
    let dimension = coords.ncols();
    let base = vertices[0];
    let edges = DMatrix::from_fn(dimension, dimension, |axis, k| {
        coords[(vertices[k + 1], axis)] - coords[(base, axis)]
    });
    let offset = DVector::from_fn(dimension, |axis, _| {
        coords[(point, axis)] - coords[(base, axis)]
    });
    let weights = edges.lu().solve(&offset)?;
    let first = 1.0 - weights.sum();
    Some(weights.iter().copied().fold(first, f64::min))
}

/// Determinant of the edge vectors `v_i - v_0`.
fn signed_volume(coords: &DMatrix<f64>, vertices: &[usize]) -> f64 {
    let dimension = coords.ncols();
    DMatrix::from_fn(dimension, dimension, |row, col| {
        coords[(vertices[row + 1], col)] - coords[(vertices[0], col)]
    })
    .determinant()
}

/// Sign of [`signed_volume`], `None` when flat relative to the edge lengths.
fn orientation(coords: &DMatrix<f64>, vertices: &[usize]) -> Option<f64> {
    let scale: f64 = vertices[1..]
        .iter()
        .map(|&v| (coords.row(v) - coords.row(vertices[0])).norm())
        .product();
    let det = signed_volume(coords, vertices);
    (det.abs() > 1e-12 * scale).then_some(det.signum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{boundary_edges, unique_edges};
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    fn rows(simplices: &DMatrix<usize>) -> Vec<Vec<usize>> {
        simplices
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    fn circle(n: usize) -> DMatrix<f64> {
        DMatrix::from_fn(n, 2, |i, axis| {
            let angle = TAU * i as f64 / n as f64;
            if axis == 0 {
                angle.cos()
            } else {
                angle.sin()
            }
        })
    }

    #[test]
    fn test_square_gives_two_triangles() {
        let points = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
        let triangles = BowyerWatson::default().triangulate(&points).unwrap();

        assert_eq!(triangles.shape(), (2, 3));
        assert_eq!(unique_edges(&triangles).len(), 5);
        for simplex in rows(&triangles) {
            assert!(signed_volume(&points, &simplex) > 0.0);
        }
    }

    #[test]
    fn test_grid_is_fully_covered() {
        // 5 x 5 grid: cocircular quadruples everywhere.
        let n = 5;
        let points = DMatrix::from_fn(n * n, 2, |i, c| {
            if c == 0 {
                (i % n) as f64 * 0.25
            } else {
                (i / n) as f64 * 0.25
            }
        });
        let triangles = BowyerWatson::default().triangulate(&points).unwrap();

        assert_eq!(triangles.nrows(), 2 * (n - 1) * (n - 1));
        let area: f64 = rows(&triangles)
            .iter()
            .map(|simplex| signed_volume(&points, simplex) / 2.0)
            .sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_points_on_one_circle() {
        for n in [8, 16, 24, 64] {
            let points = circle(n);
            let triangles = BowyerWatson::default().triangulate(&points).unwrap();

            // A convex polygon with n corners splits into n - 2 triangles.
            assert_eq!(triangles.nrows(), n - 2, "{n} points");
            assert_eq!(unique_edges(&triangles).len(), 2 * n - 3);

            let mut area = 0.0;
            for simplex in rows(&triangles) {
                let twice = signed_volume(&points, &simplex);
                assert!(twice > 0.0);
                area += twice / 2.0;
            }
            let polygon = 0.5 * n as f64 * (TAU / n as f64).sin();
            assert_relative_eq!(area, polygon, epsilon = 1e-9);

            let boundary = boundary_edges(&points, &triangles, None).unwrap();
            assert_eq!(boundary.len(), n);
        }
    }

    #[test]
    fn test_cube_corners() {
        // Eight cospherical points.
        let points = DMatrix::from_fn(8, 3, |i, axis| ((i >> axis) & 1) as f64);
        let tets = BowyerWatson::default().triangulate(&points).unwrap();

        let volume: f64 = rows(&tets)
            .iter()
            .map(|simplex| {
                let v = signed_volume(&points, simplex);
                assert!(v > 0.0);
                v / 6.0
            })
            .sum();
        assert_relative_eq!(volume, 1.0, epsilon = 1e-9);
        let used: BTreeSet<usize> = tets.iter().copied().collect();
        assert_eq!(used.len(), 8);
    }

    #[test]
    fn test_delaunay_property() {
        let points = DMatrix::from_row_slice(
            6,
            2,
            &[0.0, 0.0, 2.0, 0.1, 1.1, 1.7, -0.3, 1.4, 0.9, 0.6, 2.2, 1.2],
        );
        let triangles = BowyerWatson::default().triangulate(&points).unwrap();
        for simplex in rows(&triangles) {
            let (center, radius_sq) = circumsphere(&points, &simplex).unwrap();
            for other in 0..points.nrows() {
                if simplex.contains(&other) {
                    continue;
                }
                let distance_sq = (points.row(other).transpose() - &center).norm_squared();
                assert!(distance_sq >= radius_sq - 1e-9);
            }
        }
    }

    #[test]
    fn test_tetrahedra() {
        let points = DMatrix::from_row_slice(
            5,
            3,
            &[
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0,
            ],
        );
        let tets = BowyerWatson::default().triangulate(&points).unwrap();
        assert_eq!(tets.ncols(), 4);
        assert!(tets.nrows() >= 2);

        let volume: f64 = rows(&tets)
            .iter()
            .map(|simplex| {
                let v = signed_volume(&points, simplex);
                assert!(v > 0.0);
                v / 6.0
            })
            .sum();
        // Convex hull of the five points.
        assert_relative_eq!(volume, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_points_are_ignored() {
        let points = DMatrix::from_row_slice(
            5,
            2,
            &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0],
        );
        let triangles = BowyerWatson::default().triangulate(&points).unwrap();
        assert_eq!(triangles.nrows(), 2);
        assert!(triangles.iter().all(|&v| v != 4));
    }

    #[test]
    fn test_collinear_points() {
        let points = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        assert!(matches!(
            BowyerWatson::default().triangulate(&points),
            Err(MeshError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn test_super_scale() {
        let points = DMatrix::from_row_slice(
            6,
            2,
            &[0.0, 0.0, 2.0, 0.1, 1.1, 1.7, -0.3, 1.4, 0.9, 0.6, 2.2, 1.2],
        );
        let default = BowyerWatson::default().triangulate(&points).unwrap();
        let wide = BowyerWatson::default()
            .with_super_scale(1e4)
            .triangulate(&points)
            .unwrap();
        assert_eq!(default, wide);

        assert!(matches!(
            BowyerWatson::default()
                .with_super_scale(1.0)
                .triangulate(&points),
            Err(MeshError::InvalidParameter {
                name: "super_scale",
                ..
            })
        ));
    }

    #[test]
    fn test_too_few_points() {
        let points = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 0.0]);
        assert_eq!(
            BowyerWatson::default().triangulate(&points),
            Err(MeshError::DegenerateSampling {
                points: 2,
                required: 3
            })
        );
    }

    #[test]
    fn test_non_finite_input() {
        let points = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, f64::NAN, 0.0, 1.0]);
        assert!(matches!(
            BowyerWatson::default().triangulate(&points),
            Err(MeshError::InvalidParameter { name: "points", .. })
        ));
    }

    #[test]
    fn test_closure_triangulator() {
        let fixed =
            |_: &DMatrix<f64>| Ok::<_, MeshError>(DMatrix::from_row_slice(1, 3, &[0usize, 1, 2]));
        let points = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(fixed.triangulate(&points).unwrap().nrows(), 1);
    }
}
