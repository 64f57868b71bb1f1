use crate::geom::primitives::{cube, uv_sphere};
use crate::geom::{
    MeshDiagnostics, MeshError, Point3, PolyMesh, debug_patch, tessellate_bezier_patch,
};

#[test]
fn tessellated_patch_triangulates_cleanly() {
    let quads = tessellate_bezier_patch(&debug_patch(), 8).unwrap();
    let tris = quads.to_triangle_mesh().unwrap();
    assert!(tris.validate().is_ok());
    assert_eq!(tris.triangle_count(), 2 * 64);
    assert_eq!(tris.positions_flat().len(), 3 * 81);
}

#[test]
fn sphere_mesh_validates() {
    let (mesh, lines) = uv_sphere(12);
    assert!(mesh.validate().is_ok());
    assert_eq!(lines.len() % 2, 0);
    let max = u32::try_from(mesh.vertex_count()).unwrap();
    assert!(lines.iter().all(|&i| i < max));
}

#[test]
fn append_offsets_face_indices() {
    let mut mesh = cube();
    mesh.append(&cube());
    assert_eq!(mesh.vertex_count(), 16);
    assert_eq!(mesh.face_count(), 12);
    assert!(mesh.faces[6..].iter().flatten().all(|&i| i >= 8));

    let diag = MeshDiagnostics::from_mesh(&mesh);
    assert_eq!(diag.euler_characteristic(), 4);
    assert_eq!(diag.to_string(), "V=16 E=24 F=12 boundary=0 non_manifold=0 non_quad=0");
}

#[test]
fn validation_reports_bad_faces() {
    let verts = vec![Point3::ORIGIN; 3];
    assert_eq!(
        PolyMesh::new(verts.clone(), vec![vec![0, 1]]).validate(),
        Err(MeshError::DegenerateFace { face: 0, arity: 2 })
    );
    assert!(matches!(
        PolyMesh::new(verts, vec![vec![0, 1, 5]]).validate(),
        Err(MeshError::IndexOutOfRange { face: 0, index: 5, .. })
    ));
}
