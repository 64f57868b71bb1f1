use crate::geom::{
    AdaptiveOptions, BezierCurve, Curve3, Line3, Point3, Tolerance, adaptive_subdivide,
    de_casteljau_segments, leaves_to_polyline, tessellate_curve_uniform,
};

fn arch() -> BezierCurve {
    BezierCurve::from_points(&[
        Point3::xy(0.0, 0.0),
        Point3::xy(50.0, 150.0),
        Point3::xy(250.0, 150.0),
        Point3::xy(300.0, 0.0),
    ])
    .unwrap()
}

#[test]
fn cubic_split_point_matches_direct_evaluation() {
    let curve = arch();
    let tol = Tolerance::new(1e-9);
    for t in [0.1, 0.25, 0.5, 0.8, 0.95] {
        let (left, right) = curve.split(t).unwrap();
        assert_eq!(left.last(), right.first());
        assert!(
            tol.approx_eq_point3(left.last(), curve.point_at(t)),
            "split point differs at t={t}"
        );
    }
}

#[test]
fn split_halves_trace_the_parent_curve() {
    let curve = arch();
    let (left, right) = curve.split(0.5).unwrap();
    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_point3(left.point_at(0.5), curve.point_at(0.25)));
    assert!(tol.approx_eq_point3(right.point_at(0.5), curve.point_at(0.75)));
}

#[test]
fn recursive_draw_yields_power_of_two_leaves() {
    let curve = arch();
    for depth in 0..6 {
        let leaves = de_casteljau_segments(&curve, depth);
        assert_eq!(leaves.len(), 1 << depth);

        let polyline = leaves_to_polyline(&leaves);
        assert_eq!(polyline.first().copied(), Some(curve.first()));
        assert_eq!(polyline.last().copied(), Some(curve.last()));
        // 3 new points per cubic leaf after the first shared start point
        assert_eq!(polyline.len(), 1 + 3 * leaves.len());
    }
}

#[test]
fn recursive_depth_is_clamped() {
    let curve = BezierCurve::from_points(&[
        Point3::xy(0.0, 0.0),
        Point3::xy(1.0, 1.0),
        Point3::xy(2.0, 0.0),
    ])
    .unwrap();
    let leaves = de_casteljau_segments(&curve, 40);
    assert_eq!(leaves.len(), 1 << crate::geom::MAX_RECURSIVE_DEPTH);
}

#[test]
fn adaptive_leaves_are_flat_and_contiguous() {
    let curve = arch();
    let options = AdaptiveOptions::with_threshold(0.5);
    let result = adaptive_subdivide(&curve, options).unwrap();

    assert!(result.segments.len() > 1);
    assert_eq!(result.capped_leaves, 0);
    assert_eq!(result.markers.len(), 2 * result.segments.len());
    for leaf in &result.segments {
        assert!(leaf.flatness() <= 0.5);
    }
    for pair in result.segments.windows(2) {
        assert_eq!(pair[0].last(), pair[1].first());
    }
    let polyline = result.polyline();
    assert_eq!(polyline.first().copied(), Some(curve.first()));
    assert_eq!(polyline.last().copied(), Some(curve.last()));
}

#[test]
fn tighter_threshold_gives_more_segments() {
    let curve = arch();
    let coarse = adaptive_subdivide(&curve, AdaptiveOptions::with_threshold(5.0)).unwrap();
    let fine = adaptive_subdivide(&curve, AdaptiveOptions::with_threshold(0.05)).unwrap();
    assert!(fine.segments.len() > coarse.segments.len());
}

#[test]
fn uniform_tessellation_keeps_endpoints() {
    let line = Line3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0));
    let pts = tessellate_curve_uniform(&line, 10);
    assert_eq!(pts.len(), 11);
    assert_eq!(pts.first().copied(), Some(line.start));
    assert_eq!(pts.last().copied(), Some(line.end));

    let curve_pts = tessellate_curve_uniform(&arch(), 8);
    assert_eq!(curve_pts.last().copied(), Some(arch().last()));
}

#[test]
fn bezier_tangent_at_ends_follows_control_legs() {
    let curve = arch();
    let start = curve.tangent_at(0.0).unwrap();
    let expected = (Point3::xy(50.0, 150.0) - Point3::xy(0.0, 0.0))
        .normalized()
        .unwrap();
    assert!(Tolerance::new(1e-12).approx_eq_vec3(start, expected));
}
