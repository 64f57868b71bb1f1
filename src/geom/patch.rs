//! Bicubic patch tessellation.
//!
//! A patch is a 4x4 grid of control points. It is evaluated as a tensor
//! product: each row is evaluated at `u`, and the four results are then
//! evaluated at `v`. The output is a regular quad grid with
//! row-major vertex indexing.
//!
//! Two bases are supported:
//! - [`tessellate_bezier_patch`]: cubic Bernstein blend.
//! - [`tessellate_spline_patch`]: the five-regime clamped B-spline, which
//!   interpolates the corner control points.

use super::core::{Point3, Transform, Vec3};
use super::curve::cubic_bernstein;
use super::mesh::PolyMesh;
use super::spline::{EndCondition, clamped_parameters, evaluate_cubic_spline_segment};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    #[error("tessellation resolution must be at least 1")]
    ZeroTessellation,
    #[error("a patch needs exactly 16 control points, got {count}")]
    InvalidControlPointCount { count: usize },
    #[error("patch {patch} references vertex {index}, but the cage has {vertex_count} vertices")]
    IndexOutOfRange {
        patch: usize,
        index: usize,
        vertex_count: usize,
    },
    #[error("patch control points must be finite")]
    NonFinitePoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchKind {
    #[default]
    Bezier,
    Spline,
}

/// 4x4 control grid, `points[i][j]` with `i` the row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierPatch {
    pub points: [[Point3; 4]; 4],
}

impl BezierPatch {
    #[must_use]
    pub const fn new(points: [[Point3; 4]; 4]) -> Self {
        Self { points }
    }

    /// Row-major 16-point slice.
    pub fn from_flat(points: &[Point3]) -> Result<Self, PatchError> {
        if points.len() != 16 {
            return Err(PatchError::InvalidControlPointCount {
                count: points.len(),
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(PatchError::NonFinitePoint);
        }
        let mut grid = [[Point3::ORIGIN; 4]; 4];
        for (k, p) in points.iter().enumerate() {
            grid[k / 4][k % 4] = *p;
        }
        Ok(Self::new(grid))
    }

    #[must_use]
    pub fn corners(&self) -> [Point3; 4] {
        [
            self.points[0][0],
            self.points[0][3],
            self.points[3][3],
            self.points[3][0],
        ]
    }

    #[must_use]
    pub fn transformed(&self, transform: Transform) -> Self {
        Self::new(self.points.map(|row| row.map(|p| transform.apply_point(p))))
    }

    /// Point on the Bezier surface at `(u, v)`.
    #[must_use]
    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        let bu = cubic_bernstein(u);
        let column = self.points.map(|row| Point3::weighted_sum4(row, bu));
        Point3::weighted_sum4(column, cubic_bernstein(v))
    }

    /// The 3x3 quads of the control net, indexed into `points` row-major.
    #[must_use]
    pub fn control_net(&self) -> PolyMesh {
        let vertices = self.points.iter().flatten().copied().collect();
        PolyMesh::new(vertices, control_net_faces(0))
    }
}

fn control_net_faces(offset: usize) -> Vec<Vec<usize>> {
    let mut faces = Vec::with_capacity(9);
    for m in 0..3 {
        for n in 0..3 {
            let k = offset + m * 4 + n;
            faces.push(vec![k, k + 1, k + 5, k + 4]);
        }
    }
    faces
}

/// Quad faces of an `(n+1) x (n+1)` grid: `[k, k+1, k+n+2, k+n+1]`.
fn grid_faces(n: usize) -> Vec<Vec<usize>> {
    let mut faces = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let k = i * (n + 1) + j;
            faces.push(vec![k, k + 1, k + n + 2, k + n + 1]);
        }
    }
    faces
}

/// `(n+1)^2` vertices and `n^2` quads; corners land on the corner controls.
pub fn tessellate_bezier_patch(patch: &BezierPatch, n: usize) -> Result<PolyMesh, PatchError> {
    if n == 0 {
        return Err(PatchError::ZeroTessellation);
    }
    #[allow(clippy::cast_precision_loss)]
    let inv = 1.0 / n as f64;
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for i in 0..=n {
        #[allow(clippy::cast_precision_loss)]
        let bu = cubic_bernstein(i as f64 * inv);
        let column = patch.points.map(|row| Point3::weighted_sum4(row, bu));
        for j in 0..=n {
            #[allow(clippy::cast_precision_loss)]
            let bv = cubic_bernstein(j as f64 * inv);
            vertices.push(Point3::weighted_sum4(column, bv));
        }
    }
    Ok(PolyMesh::new(vertices, grid_faces(n)))
}

/// `(5n+1)^2` vertices and `(5n)^2` quads from the clamped B-spline.
pub fn tessellate_spline_patch(patch: &BezierPatch, n: usize) -> Result<PolyMesh, PatchError> {
    if n == 0 {
        return Err(PatchError::ZeroTessellation);
    }
    let params = clamped_parameters(n);
    let eval = |p: [Point3; 4], (regime, t): (EndCondition, f64)| {
        evaluate_cubic_spline_segment(p[0], p[1], p[2], p[3], t, regime)
    };

    let mut vertices = Vec::with_capacity(params.len() * params.len());
    for &pu in &params {
        let column = patch.points.map(|row| eval(row, pu));
        vertices.extend(params.iter().map(|&pv| eval(column, pv)));
    }
    Ok(PolyMesh::new(vertices, grid_faces(5 * n)))
}

fn tessellate_patch(patch: &BezierPatch, n: usize, kind: PatchKind) -> Result<PolyMesh, PatchError> {
    match kind {
        PatchKind::Bezier => tessellate_bezier_patch(patch, n),
        PatchKind::Spline => tessellate_spline_patch(patch, n),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cages
// ─────────────────────────────────────────────────────────────────────────────

/// Shared vertex list plus 16-index patches (row-major within each patch).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchCage {
    pub vertices: Vec<Point3>,
    pub patches: Vec<[usize; 16]>,
}

impl PatchCage {
    #[must_use]
    pub fn new(vertices: Vec<Point3>, patches: Vec<[usize; 16]>) -> Self {
        Self { vertices, patches }
    }

    /// A cage holding a single patch.
    #[must_use]
    pub fn from_patch(patch: &BezierPatch) -> Self {
        let vertices = patch.points.iter().flatten().copied().collect();
        Self::new(vertices, vec![std::array::from_fn(|k| k)])
    }

    pub fn patch(&self, index: usize) -> Result<BezierPatch, PatchError> {
        let vertex_count = self.vertices.len();
        let indices = self.patches.get(index).ok_or(PatchError::IndexOutOfRange {
            patch: index,
            index,
            vertex_count,
        })?;
        let mut points = Vec::with_capacity(16);
        for &i in indices {
            let p = self.vertices.get(i).ok_or(PatchError::IndexOutOfRange {
                patch: index,
                index: i,
                vertex_count,
            })?;
            points.push(*p);
        }
        BezierPatch::from_flat(&points)
    }

    pub fn resolve(&self) -> Result<Vec<BezierPatch>, PatchError> {
        (0..self.patches.len()).map(|i| self.patch(i)).collect()
    }
}

/// Tessellate every patch and concatenate with index offsets.
pub fn tessellate_cage(cage: &PatchCage, n: usize, kind: PatchKind) -> Result<PolyMesh, PatchError> {
    if n == 0 {
        return Err(PatchError::ZeroTessellation);
    }
    let patches = cage.resolve()?;

    #[cfg(feature = "parallel")]
    let pieces: Result<Vec<PolyMesh>, PatchError> = {
        use rayon::prelude::*;
        patches
            .par_iter()
            .map(|patch| tessellate_patch(patch, n, kind))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let pieces: Result<Vec<PolyMesh>, PatchError> = patches
        .iter()
        .map(|patch| tessellate_patch(patch, n, kind))
        .collect();

    let mut mesh = PolyMesh::default();
    for piece in pieces? {
        mesh.append(&piece);
    }
    log::debug!(
        "tessellated {} patches ({kind:?}, n={n}): {} vertices, {} faces",
        patches.len(),
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(mesh)
}

/// Control nets of every patch; vertices are duplicated per patch.
pub fn wire_cage(cage: &PatchCage) -> Result<PolyMesh, PatchError> {
    let mut mesh = PolyMesh::default();
    for patch in cage.resolve()? {
        mesh.append(&patch.control_net());
    }
    Ok(mesh)
}

/// Saddle-shaped test patch tilted towards the viewer.
#[must_use]
pub fn debug_patch() -> BezierPatch {
    const COORDS: [f64; 4] = [-1.5, -0.5, 0.5, 1.5];
    const HEIGHT: [f64; 4] = [0.0, 1.0, 1.0, 0.0];

    let tilt = Transform::rotate_x(25f64.to_radians()) * Transform::rotate_y(45f64.to_radians());
    let mut points = [[Point3::ORIGIN; 4]; 4];
    for (i, row) in points.iter_mut().enumerate() {
        for (j, p) in row.iter_mut().enumerate() {
            let local = Point3::new(COORDS[i], HEIGHT[i] * HEIGHT[j], COORDS[j]);
            *p = tilt.apply_point(local);
        }
    }
    BezierPatch::new(points)
}

/// Unit square patch in the XY plane lifted by `bump` at the four inner controls.
#[must_use]
pub fn flat_patch(bump: f64) -> BezierPatch {
    let mut points = [[Point3::ORIGIN; 4]; 4];
    for (i, row) in points.iter_mut().enumerate() {
        for (j, p) in row.iter_mut().enumerate() {
            let inner = (1..=2).contains(&i) && (1..=2).contains(&j);
            #[allow(clippy::cast_precision_loss)]
            let base = Point3::new(j as f64 / 3.0, i as f64 / 3.0, 0.0);
            *p = base.add_vec(Vec3::Z.mul_scalar(if inner { bump } else { 0.0 }));
        }
    }
    BezierPatch::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    #[test]
    fn bezier_patch_grid_shape() {
        let mesh = tessellate_bezier_patch(&flat_patch(0.5), 3).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.face_count(), 9);
        assert_eq!(mesh.faces[0], vec![0, 1, 5, 4]);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let patch = flat_patch(0.0);
        assert_eq!(
            tessellate_bezier_patch(&patch, 0),
            Err(PatchError::ZeroTessellation)
        );
        assert_eq!(
            tessellate_spline_patch(&patch, 0),
            Err(PatchError::ZeroTessellation)
        );
    }

    #[test]
    fn from_flat_requires_sixteen_points() {
        assert_eq!(
            BezierPatch::from_flat(&[Point3::ORIGIN; 9]),
            Err(PatchError::InvalidControlPointCount { count: 9 })
        );
    }

    #[test]
    fn grid_vertex_matches_direct_evaluation() {
        let patch = debug_patch();
        let mesh = tessellate_bezier_patch(&patch, 4).unwrap();
        let tol = Tolerance::DEFAULT;
        // i = 1 (u = 0.25), j = 2 (v = 0.5)
        assert!(tol.approx_eq_point3(mesh.vertices[5 + 2], patch.point_at(0.25, 0.5)));
    }

    #[test]
    fn cage_with_bad_index_is_rejected() {
        let mut cage = PatchCage::from_patch(&flat_patch(0.0));
        cage.patches[0][15] = 99;
        assert!(matches!(
            tessellate_cage(&cage, 2, PatchKind::Bezier),
            Err(PatchError::IndexOutOfRange { index: 99, .. })
        ));
    }
}
