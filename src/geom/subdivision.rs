//! Catmull-Clark subdivision for polygon meshes.
//!
//! One step works in three passes:
//! 1. Linear subdivision. Every face of arity `k` becomes `k` quads built from
//!    the face centroid, the edge midpoints and the original corner.
//! 2. Averaging. Every vertex moves to the mean centroid of the new quads
//!    that use it.
//! 3. Correction. Each vertex is pulled from its linear position towards
//!    that average with weight `4 / n`, where `n` is the number of quads
//!    using it.
//!
//! This yields the classic Catmull-Clark rules on closed meshes. There are no
//! boundary rules, so open meshes shrink at their borders.
//!
//! # Example
//! ```ignore
//! use cg_engine::geom::{catmull_clark, primitives};
//!
//! let (refined, diag) = catmull_clark(&primitives::cube())?;
//! assert_eq!(refined.face_count(), 24);
//! ```

use std::collections::HashMap;

use super::core::{Point3, Vec3};
use super::diagnostics::MeshDiagnostics;
use super::mesh::{PolyMesh, normalized_edge_pair};

// ============================================================================
// Error types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubdError {
    /// A face with fewer than three corners.
    DegenerateFace { face: usize, arity: usize },
    /// A face corner that does not reference an existing vertex.
    IndexOutOfRange { face: usize, index: usize },
}

impl std::fmt::Display for SubdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateFace { face, arity } => {
                write!(f, "Invalid topology: face {face} has only {arity} corners")
            }
            Self::IndexOutOfRange { face, index } => {
                write!(f, "Invalid topology: face {face} references missing vertex {index}")
            }
        }
    }
}

impl std::error::Error for SubdError {}

// ============================================================================
// Diagnostics
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubdDiagnostics {
    pub input: MeshDiagnostics,
    pub output: MeshDiagnostics,
    pub levels: usize,
    pub face_points: usize,
    pub edge_points: usize,
}

// ============================================================================
// Catmull-Clark
// ============================================================================

fn check_topology(mesh: &PolyMesh) -> Result<(), SubdError> {
    let vertex_count = mesh.vertex_count();
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(SubdError::DegenerateFace {
                face: face_index,
                arity: face.len(),
            });
        }
        if let Some(&index) = face.iter().find(|&&i| i >= vertex_count) {
            return Err(SubdError::IndexOutOfRange {
                face: face_index,
                index,
            });
        }
    }
    Ok(())
}

/// One Catmull-Clark step.
///
/// Output vertex order is: the original vertices, then, for each face in
/// order, its face point followed by the edge points that face creates first.
/// An empty mesh (no vertices or no faces) yields an empty mesh.
pub fn catmull_clark(mesh: &PolyMesh) -> Result<(PolyMesh, SubdDiagnostics), SubdError> {
    let input = MeshDiagnostics::from_mesh(mesh);
    if mesh.is_empty() {
        return Ok((
            PolyMesh::default(),
            SubdDiagnostics {
                input,
                levels: 1,
                ..SubdDiagnostics::default()
            },
        ));
    }
    check_topology(mesh)?;

    // Linear subdivision.
    let mut vertices = mesh.vertices.clone();
    let mut faces = Vec::with_capacity(mesh.corner_count());
    let mut edge_points: HashMap<(usize, usize), usize> = HashMap::new();

    for face in &mesh.faces {
        let corners: Vec<Point3> = face.iter().map(|&i| mesh.vertices[i]).collect();
        let face_point = vertices.len();
        vertices.push(Point3::centroid(&corners).unwrap_or(Point3::ORIGIN));

        let arity = face.len();
        for k in 0..arity {
            let v0 = face[(k + arity - 1) % arity];
            let v1 = face[k];
            let v2 = face[(k + 1) % arity];
            let e01 = edge_point(&mut edge_points, &mut vertices, v0, v1);
            let e12 = edge_point(&mut edge_points, &mut vertices, v1, v2);
            faces.push(vec![face_point, e01, v1, e12]);
        }
    }

    // Averaging.
    let mut sums = vec![Vec3::ZERO; vertices.len()];
    let mut counts = vec![0usize; vertices.len()];
    for quad in &faces {
        let corners: Vec<Point3> = quad.iter().map(|&i| vertices[i]).collect();
        let centroid = Point3::centroid(&corners).unwrap_or(Point3::ORIGIN).to_vec3();
        for &i in quad {
            sums[i] = sums[i].add(centroid);
            counts[i] += 1;
        }
    }

    // Correction.
    for ((p, sum), &n) in vertices.iter_mut().zip(&sums).zip(&counts) {
        if n == 0 {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = n as f64;
        let avg = Point3::from(sum.mul_scalar(1.0 / n));
        *p = p.lerp(avg, 4.0 / n);
    }

    let refined = PolyMesh::new(vertices, faces);
    let diagnostics = SubdDiagnostics {
        input,
        output: MeshDiagnostics::from_mesh(&refined),
        levels: 1,
        face_points: mesh.face_count(),
        edge_points: edge_points.len(),
    };
    log::debug!(
        "catmull-clark: {} -> {}",
        diagnostics.input,
        diagnostics.output
    );
    Ok((refined, diagnostics))
}

fn edge_point(
    edge_points: &mut HashMap<(usize, usize), usize>,
    vertices: &mut Vec<Point3>,
    a: usize,
    b: usize,
) -> usize {
    *edge_points
        .entry(normalized_edge_pair(a, b))
        .or_insert_with(|| {
            let midpoint = vertices[a].lerp(vertices[b], 0.5);
            vertices.push(midpoint);
            vertices.len() - 1
        })
}

/// Apply [`catmull_clark`] `levels` times. Zero levels returns a copy.
pub fn subdivide(mesh: &PolyMesh, levels: usize) -> Result<(PolyMesh, SubdDiagnostics), SubdError> {
    let input = MeshDiagnostics::from_mesh(mesh);
    let mut current = mesh.clone();
    let mut face_points = 0;
    let mut edge_points = 0;
    for _ in 0..levels {
        let (next, diag) = catmull_clark(&current)?;
        face_points += diag.face_points;
        edge_points += diag.edge_points;
        current = next;
    }
    let diagnostics = SubdDiagnostics {
        output: MeshDiagnostics::from_mesh(&current),
        input,
        levels,
        face_points,
        edge_points,
    };
    Ok((current, diagnostics))
}
