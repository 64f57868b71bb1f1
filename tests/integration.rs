use cg_engine::Engine;
use cg_engine::geom::primitives::{self, CylinderOptions};
use cg_engine::geom::{
    AdaptiveOptions, BezierCurve, MeshDiagnostics, PatchCage, PatchKind, PhongMaterial, Point3,
    PointLight, SkinMesh, SkinMode, SplineKind, Tolerance, Transform, Vec3, Viewport,
    adaptive_subdivide, catmull_clark, debug_patch, evaluate_spline, project_wireframe,
    shade_phong, subdivide, tessellate_cage,
};

#[test]
fn engine_initializes() {
    let engine = Engine::new();
    assert!(engine.is_initialized());
}

#[test]
fn tessellated_patch_subdivides_into_quads() {
    let cage = PatchCage::from_patch(&debug_patch());
    let patch = tessellate_cage(&cage, 4, PatchKind::Bezier).expect("tessellate");
    let (refined, diag) = catmull_clark(&patch).expect("subdivide");

    assert_eq!(refined.face_count(), 4 * patch.face_count());
    assert!(refined.is_all_quads());
    // an open grid stays open
    assert!(diag.output.boundary_edge_count > 0);
    assert_eq!(diag.output.non_manifold_edge_count, 0);
}

#[test]
fn subdivided_icosahedron_projects_in_front_of_camera() {
    let (mesh, _) = subdivide(&primitives::icosahedron(), 1).expect("subdivide");
    let pushed = Transform::translate(Vec3::new(0.0, 0.0, 10.0));
    let positions: Vec<Point3> = mesh.vertices.iter().map(|&p| pushed.apply_point(p)).collect();
    let lines: Vec<usize> = mesh
        .edges()
        .into_iter()
        .flat_map(|(a, b)| [a, b])
        .collect();

    let viewport = Viewport::new(640.0, 480.0).expect("viewport");
    let projected = project_wireframe(&positions, &lines, viewport).expect("project");
    assert_eq!(projected.skipped, 0);
    assert_eq!(projected.segments.len(), mesh.edges().len());
    for [a, b] in projected.segments {
        for p in [a, b] {
            assert!(p[0] > 0.0 && p[0] < 640.0, "x off canvas: {p:?}");
            assert!(p[1] > 0.0 && p[1] < 480.0, "y off canvas: {p:?}");
        }
    }
}

#[test]
fn bent_cylinder_stays_connected() {
    let cylinder = primitives::cylinder_x(CylinderOptions::default());
    let (skeleton, _, elbow) = primitives::two_bone_rig();
    let mut skin = SkinMesh::from_geom_mesh(&cylinder);
    skin.bind_skeleton(skeleton, SkinMode::Linear).expect("bind");
    skin.set_joint_angle(elbow, 90.0).expect("pose");

    let bent = skin.to_geom_mesh();
    assert!(bent.validate().is_ok());
    assert_eq!(bent.indices, cylinder.indices);
    // neighbouring rings never tear apart
    let rings: Vec<&[[f64; 3]]> = bent.positions.chunks(16).collect();
    for pair in rings.windows(2) {
        let a = Point3::from(pair[0][0]);
        let b = Point3::from(pair[1][0]);
        assert!(a.distance_to(b) < 1.0);
    }
}

#[test]
fn skinning_through_engine_matches_library() {
    let mut engine = Engine::new();
    engine.load_cylinder_skin();
    engine.bind_skeleton("linear").expect("bind");
    engine.set_joint_angle(1, 30.0).expect("pose");
    let from_engine = engine.deformed_positions().expect("positions");

    let (skeleton, _, elbow) = primitives::two_bone_rig();
    let mut skin = SkinMesh::from_geom_mesh(&primitives::cylinder_x(CylinderOptions::default()));
    skin.bind_skeleton(skeleton, SkinMode::Linear).expect("bind");
    skin.set_joint_angle(elbow, 30.0).expect("pose");

    assert_eq!(from_engine, skin.deformed_positions_flat());
}

#[test]
fn adaptive_and_spline_polylines_share_endpoints() {
    let points = [
        Point3::xy(0.0, 0.0),
        Point3::xy(1.0, 2.0),
        Point3::xy(3.0, 2.0),
        Point3::xy(4.0, 0.0),
    ];
    let curve = BezierCurve::from_points(&points).expect("cubic");
    let adaptive = adaptive_subdivide(&curve, AdaptiveOptions::with_threshold(0.01)).expect("adaptive");
    let polyline = adaptive.polyline();
    assert_eq!(polyline.first(), Some(&points[0]));
    assert_eq!(polyline.last(), Some(&points[3]));

    // Catmull-Rom over one window interpolates the inner pair only
    let samples = evaluate_spline(&points, 10, SplineKind::catmull_rom()).expect("spline");
    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_point3(samples[0], points[1]));
    assert!(tol.approx_eq_point3(*samples.last().expect("samples"), points[2]));
}

#[test]
fn sphere_is_lit_on_the_light_side_only() {
    let (sphere, _) = primitives::uv_sphere(24);
    let normals = sphere.normals.as_ref().expect("sphere normals");
    let material = PhongMaterial::default();
    let light = PointLight::default();
    let eye = Point3::new(0.0, 0.0, 5.0);

    let mut lit = 0;
    for (p, n) in sphere.positions.iter().zip(normals) {
        let colour = shade_phong(&material, &light, Point3::from(*p), Vec3::from(*n), eye);
        let facing = Vec3::from(*n).dot(light.position.sub_point(Point3::from(*p))) > 0.0;
        if facing {
            assert!(colour.x >= material.ambient.x);
            if colour.x > material.ambient.x {
                lit += 1;
            }
        } else {
            assert!(colour.sub(material.ambient).length() < 1e-9);
        }
    }
    assert!(lit > 0);
}

#[test]
fn cube_diagnostics_display() {
    let diag = MeshDiagnostics::from_mesh(&primitives::cube());
    assert_eq!(diag.to_string(), "V=8 E=12 F=6 boundary=0 non_manifold=0 non_quad=0");
}
