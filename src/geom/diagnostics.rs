//! Topology diagnostics for polygon meshes.
//!
//! Collected by the subdivision engine and the CLI snapshots. They answer
//! questions such as "is this cage closed?" and "did one step produce the
//! expected number of quads?".

use std::collections::HashMap;
use std::fmt;

use super::mesh::{PolyMesh, normalized_edge_pair};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MeshDiagnostics {
    pub vertex_count: usize,
    pub face_count: usize,
    pub edge_count: usize,
    /// Edges used by exactly one face.
    pub boundary_edge_count: usize,
    /// Edges used by more than two faces.
    pub non_manifold_edge_count: usize,
    /// Faces that are not quads.
    pub non_quad_face_count: usize,
}

impl MeshDiagnostics {
    #[must_use]
    pub fn from_mesh(mesh: &PolyMesh) -> Self {
        let mut edge_use: HashMap<(usize, usize), usize> = HashMap::new();
        for face in &mesh.faces {
            for (k, &a) in face.iter().enumerate() {
                let b = face[(k + 1) % face.len()];
                *edge_use.entry(normalized_edge_pair(a, b)).or_default() += 1;
            }
        }

        Self {
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            edge_count: edge_use.len(),
            boundary_edge_count: edge_use.values().filter(|&&n| n == 1).count(),
            non_manifold_edge_count: edge_use.values().filter(|&&n| n > 2).count(),
            non_quad_face_count: mesh.faces.iter().filter(|f| f.len() != 4).count(),
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.boundary_edge_count == 0 && self.non_manifold_edge_count == 0
    }

    /// `V - E + F`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn euler_characteristic(&self) -> i64 {
        self.vertex_count as i64 - self.edge_count as i64 + self.face_count as i64
    }
}

impl fmt::Display for MeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "V={} E={} F={} boundary={} non_manifold={} non_quad={}",
            self.vertex_count,
            self.edge_count,
            self.face_count,
            self.boundary_edge_count,
            self.non_manifold_edge_count,
            self.non_quad_face_count
        )
    }
}
