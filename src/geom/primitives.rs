//! Base meshes and rigs used by the demos and tests.

use std::f64::consts::{PI, TAU};

use super::core::{Point3, Vec3};
use super::mesh::{GeomMesh, PolyMesh};
use super::skeleton::{JointId, Skeleton};

/// Unit sphere with `phi_bands` around and `phi_bands / 2` pole-to-pole bands.
///
/// Returns the triangle mesh (normals equal positions) and a line-index list
/// for wireframe drawing.
#[must_use]
pub fn uv_sphere(phi_bands: usize) -> (GeomMesh, Vec<u32>) {
    let phi_bands = phi_bands.max(3);
    let theta_bands = (phi_bands / 2).max(2);
    let mut positions = Vec::with_capacity((theta_bands + 1) * phi_bands);
    let mut triangles = Vec::new();
    let mut lines = Vec::new();

    let index = |i: usize, j: usize| u32::try_from(i * phi_bands + j).unwrap_or(u32::MAX);
    for i in 0..=theta_bands {
        for j in 0..phi_bands {
            #[allow(clippy::cast_precision_loss)]
            let theta = (i as f64 / theta_bands as f64 - 0.5) * PI;
            #[allow(clippy::cast_precision_loss)]
            let phi = TAU * j as f64 / phi_bands as f64;
            positions.push([phi.cos() * theta.cos(), theta.sin(), phi.sin() * theta.cos()]);

            if i < theta_bands {
                let (i1, j1) = (i + 1, (j + 1) % phi_bands);
                lines.extend([index(i, j), index(i, j1), index(i1, j), index(i, j)]);
                triangles.extend([index(i, j), index(i, j1), index(i1, j1)]);
                triangles.extend([index(i, j), index(i1, j1), index(i1, j)]);
            }
        }
    }
    let normals = positions.clone();
    (GeomMesh::new(positions, triangles).with_normals(normals), lines)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderOptions {
    pub radius: f64,
    pub start_x: f64,
    pub end_x: f64,
    pub x_segments: usize,
    pub theta_bands: usize,
}

impl Default for CylinderOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            start_x: -2.0,
            end_x: 2.0,
            x_segments: 16,
            theta_bands: 16,
        }
    }
}

/// Open tube along X, rings of `theta_bands` vertices at `x_segments + 1` stations.
#[must_use]
pub fn cylinder_x(options: CylinderOptions) -> GeomMesh {
    let segments = options.x_segments.max(1);
    let bands = options.theta_bands.max(3);
    #[allow(clippy::cast_precision_loss)]
    let step = (options.end_x - options.start_x) / segments as f64;

    let index = |i: usize, j: usize| u32::try_from(i * bands + j).unwrap_or(u32::MAX);
    let mut positions = Vec::with_capacity((segments + 1) * bands);
    let mut indices = Vec::with_capacity(6 * segments * bands);
    for i in 0..=segments {
        #[allow(clippy::cast_precision_loss)]
        let x = options.start_x + step * i as f64;
        for j in 0..bands {
            #[allow(clippy::cast_precision_loss)]
            let theta = TAU * j as f64 / bands as f64;
            positions.push([x, options.radius * theta.sin(), options.radius * theta.cos()]);
            if i < segments {
                let (i1, j1) = (i + 1, (j + 1) % bands);
                indices.extend([index(i, j), index(i, j1), index(i1, j1)]);
                indices.extend([index(i, j), index(i1, j1), index(i1, j)]);
            }
        }
    }
    GeomMesh::new(positions, indices)
}

/// Two joints spanning `[start_x, end_x]` of the default cylinder, bending about Z.
///
/// Returns the skeleton with the root and the child joint ids.
#[must_use]
pub fn two_bone_rig() -> (Skeleton, JointId, JointId) {
    let mut skeleton = Skeleton::new();
    let half = Vec3::new(2.0, 0.0, 0.0);
    // both additions are valid: the root has no parent, the axis is non-zero
    let root = skeleton
        .add_joint("root", None, Vec3::new(-2.0, 0.0, 0.0), half, Vec3::Z)
        .unwrap_or(JointId(0));
    let child = skeleton
        .add_joint("elbow", Some(root), half, half, Vec3::Z)
        .unwrap_or(JointId(1));
    (skeleton, root, child)
}

/// Axis-aligned box as 6 outward-facing quads.
#[must_use]
pub fn box_from_bounds(min: [f64; 3], max: [f64; 3]) -> PolyMesh {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    PolyMesh::from_arrays(
        &[
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y1, z0],
            [x0, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x1, y1, z1],
            [x0, y1, z1],
        ],
        vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ],
    )
}

/// The `[-1, 1]^3` cube.
#[must_use]
pub fn cube() -> PolyMesh {
    box_from_bounds([-1.0; 3], [1.0; 3])
}

#[must_use]
pub fn octahedron() -> PolyMesh {
    PolyMesh::from_arrays(
        &[
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ],
        vec![
            vec![0, 2, 4],
            vec![2, 1, 4],
            vec![1, 3, 4],
            vec![3, 0, 4],
            vec![2, 0, 5],
            vec![1, 2, 5],
            vec![3, 1, 5],
            vec![0, 3, 5],
        ],
    )
}

#[must_use]
pub fn icosahedron() -> PolyMesh {
    let t = (1.0 + 5f64.sqrt()) / 2.0;
    PolyMesh::from_arrays(
        &[
            [-1.0, t, 0.0],
            [1.0, t, 0.0],
            [-1.0, -t, 0.0],
            [1.0, -t, 0.0],
            [0.0, -1.0, t],
            [0.0, 1.0, t],
            [0.0, -1.0, -t],
            [0.0, 1.0, -t],
            [t, 0.0, -1.0],
            [t, 0.0, 1.0],
            [-t, 0.0, -1.0],
            [-t, 0.0, 1.0],
        ],
        vec![
            vec![0, 11, 5],
            vec![0, 5, 1],
            vec![0, 1, 7],
            vec![0, 7, 10],
            vec![0, 10, 11],
            vec![1, 5, 9],
            vec![5, 11, 4],
            vec![11, 10, 2],
            vec![10, 7, 6],
            vec![7, 1, 8],
            vec![3, 9, 4],
            vec![3, 4, 2],
            vec![3, 2, 6],
            vec![3, 6, 8],
            vec![3, 8, 9],
            vec![4, 9, 5],
            vec![2, 4, 11],
            vec![6, 2, 10],
            vec![8, 6, 7],
            vec![9, 8, 1],
        ],
    )
}

/// Square pyramid: four triangles and a quad base.
#[must_use]
pub fn pyramid() -> PolyMesh {
    PolyMesh::from_arrays(
        &[
            [0.0, 1.0, 0.0],
            [-1.0, -1.0, 0.0],
            [0.0, -1.0, -1.0],
            [1.0, -1.0, 0.0],
            [0.0, -1.0, 1.0],
        ],
        vec![
            vec![0, 1, 2],
            vec![0, 2, 3],
            vec![0, 3, 4],
            vec![0, 4, 1],
            vec![1, 4, 3, 2],
        ],
    )
}

/// Quad torus in the XZ plane with major radius 1.
#[must_use]
pub fn torus(major_segments: usize, minor_segments: usize, minor_radius: f64) -> PolyMesh {
    let n = major_segments.max(3);
    let m = minor_segments.max(3);
    let mut vertices = Vec::with_capacity(n * m);
    for i in 0..n {
        #[allow(clippy::cast_precision_loss)]
        let u = TAU * i as f64 / n as f64;
        for j in 0..m {
            #[allow(clippy::cast_precision_loss)]
            let v = TAU * j as f64 / m as f64;
            let ring = 1.0 + minor_radius * v.cos();
            vertices.push(Point3::new(ring * u.cos(), minor_radius * v.sin(), ring * u.sin()));
        }
    }
    let mut faces = Vec::with_capacity(n * m);
    for i in 0..n {
        let i1 = (i + 1) % n;
        for j in 0..m {
            let j1 = (j + 1) % m;
            faces.push(vec![i * m + j, i * m + j1, i1 * m + j1, i1 * m + j]);
        }
    }
    PolyMesh::new(vertices, faces)
}
