use super::Point3;

/// Polygon mesh with arbitrary face arity, as produced by the patch
/// tessellators and consumed by Catmull-Clark.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolyMesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("face {face} has {arity} vertices; at least 3 are required")]
    DegenerateFace { face: usize, arity: usize },
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },
    #[error("mesh has non-finite vertex coordinates")]
    NonFiniteVertex,
    #[error("mesh has more than u32::MAX vertices")]
    TooManyVertices,
}

impl PolyMesh {
    #[must_use]
    pub fn new(vertices: Vec<Point3>, faces: Vec<Vec<usize>>) -> Self {
        Self { vertices, faces }
    }

    /// Build from flat `xyz` triples and face index lists.
    #[must_use]
    pub fn from_arrays(vertices: &[[f64; 3]], faces: Vec<Vec<usize>>) -> Self {
        Self::new(vertices.iter().copied().map(Point3::from).collect(), faces)
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Sum of face arities; the face count after one Catmull-Clark step.
    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.faces.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_all_quads(&self) -> bool {
        self.faces.iter().all(|f| f.len() == 4)
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        if self.vertices.iter().any(|p| !p.is_finite()) {
            return Err(MeshError::NonFiniteVertex);
        }
        let vertex_count = self.vertices.len();
        for (face_index, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(MeshError::DegenerateFace {
                    face: face_index,
                    arity: face.len(),
                });
            }
            if let Some(&index) = face.iter().find(|&&i| i >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    face: face_index,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Append another mesh, offsetting its face indices.
    pub fn append(&mut self, other: &Self) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|face| face.iter().map(|&i| i + offset).collect()),
        );
    }

    /// Fan-triangulate every face around its first vertex.
    pub fn to_triangle_mesh(&self) -> Result<GeomMesh, MeshError> {
        self.validate()?;
        if u32::try_from(self.vertices.len()).is_err() {
            return Err(MeshError::TooManyVertices);
        }

        let mut indices = Vec::with_capacity(3 * (self.corner_count().saturating_sub(2 * self.faces.len())));
        for face in &self.faces {
            for k in 1..face.len() - 1 {
                for i in [face[0], face[k], face[k + 1]] {
                    indices.push(u32::try_from(i).map_err(|_| MeshError::TooManyVertices)?);
                }
            }
        }
        let positions = self.vertices.iter().map(|p| p.to_array()).collect();
        Ok(GeomMesh::new(positions, indices))
    }

    /// Unique undirected edges in first-seen order.
    #[must_use]
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut seen = std::collections::HashSet::new();
        let mut edges = Vec::new();
        for face in &self.faces {
            for (k, &a) in face.iter().enumerate() {
                let b = face[(k + 1) % face.len()];
                let key = normalized_edge_pair(a, b);
                if seen.insert(key) {
                    edges.push(key);
                }
            }
        }
        edges
    }
}

/// Undirected edge key with the smaller index first.
#[must_use]
pub const fn normalized_edge_pair(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Triangle-list render buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<[f64; 3]>>,
}

impl GeomMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: None,
        }
    }

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<[f64; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.positions.iter().flatten().any(|c| !c.is_finite()) {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        let n = self.positions.len();
        if self.indices.iter().any(|&i| i as usize >= n) {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if self.normals.as_ref().is_some_and(|normals| normals.len() != n) {
            return Err("mesh normal buffer does not match vertex count".to_string());
        }
        Ok(())
    }

    /// Positions as `[x0, y0, z0, x1, ...]`.
    #[must_use]
    pub fn positions_flat(&self) -> Vec<f64> {
        self.positions.iter().flatten().copied().collect()
    }

    /// Index pairs for every triangle edge, for wireframe drawing.
    #[must_use]
    pub fn wireframe_indices(&self) -> Vec<u32> {
        self.indices
            .chunks_exact(3)
            .flat_map(|t| [t[0], t[1], t[1], t[2], t[2], t[0]])
            .collect()
    }
}
