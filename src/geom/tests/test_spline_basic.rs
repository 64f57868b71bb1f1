use crate::geom::{
    CurveError, EndCondition, Point3, SplineKind, Tolerance, catmull_rom_tangents,
    evaluate_catmull_rom, evaluate_clamped_spline, evaluate_cubic_spline_segment, evaluate_spline,
};

fn polygon() -> Vec<Point3> {
    vec![
        Point3::xy(100.0, 400.0),
        Point3::xy(200.0, 100.0),
        Point3::xy(400.0, 150.0),
        Point3::xy(500.0, 420.0),
        Point3::xy(650.0, 300.0),
        Point3::xy(700.0, 80.0),
    ]
}

#[test]
fn regimes_are_c0_continuous() {
    let p = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 2.0, 0.5),
        Point3::new(3.0, 2.5, -1.0),
        Point3::new(4.0, 0.0, 2.0),
    ];
    let tol = Tolerance::new(1e-12);
    for pair in EndCondition::ALL.windows(2) {
        let end = evaluate_cubic_spline_segment(p[0], p[1], p[2], p[3], 1.0, pair[0]);
        let start = evaluate_cubic_spline_segment(p[0], p[1], p[2], p[3], 0.0, pair[1]);
        assert!(
            tol.approx_eq_point3(end, start),
            "{:?} -> {:?} is discontinuous",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn clamped_spline_interpolates_window_ends() {
    let p = [
        Point3::xy(0.0, 0.0),
        Point3::xy(1.0, 3.0),
        Point3::xy(3.0, 3.0),
        Point3::xy(4.0, 0.0),
    ];
    let samples = evaluate_clamped_spline(p, 4).unwrap();
    assert_eq!(samples.len(), 21);
    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_point3(samples[0], p[0]));
    assert!(tol.approx_eq_point3(samples[20], p[3]));
}

#[test]
fn bspline_sample_count() {
    let samples = evaluate_spline(&polygon(), 10, SplineKind::BSpline).unwrap();
    // 3 windows, 10 samples each, plus the closing sample
    assert_eq!(samples.len(), 31);
}

#[test]
fn catmull_rom_passes_through_inner_nodes() {
    let points = polygon();
    let samples = evaluate_spline(&points, 8, SplineKind::catmull_rom()).unwrap();
    let tol = Tolerance::new(1e-9);
    for (window, node) in points[1..points.len() - 2].iter().enumerate() {
        assert!(tol.approx_eq_point3(samples[window * 8], *node));
    }
    assert!(tol.approx_eq_point3(*samples.last().unwrap(), points[points.len() - 2]));
}

#[test]
fn zero_tension_gives_straight_segments() {
    let p = polygon();
    let mid = evaluate_catmull_rom(p[0], p[1], p[2], p[3], 0.5, 0.0);
    assert!(Tolerance::new(1e-12).approx_eq_point3(mid, p[1].lerp(p[2], 0.5)));
}

#[test]
fn too_few_points_is_an_error() {
    let err = evaluate_spline(&polygon()[..3], 10, SplineKind::BSpline).unwrap_err();
    assert_eq!(err, CurveError::NotEnoughPoints { min: 4, count: 3 });
    assert_eq!(
        evaluate_spline(&polygon(), 0, SplineKind::BSpline).unwrap_err(),
        CurveError::InvalidSegmentCount
    );
    assert!(matches!(
        evaluate_spline(
            &polygon(),
            4,
            SplineKind::CatmullRom {
                tension: f64::INFINITY
            }
        ),
        Err(CurveError::InvalidTension(_))
    ));
}

#[test]
fn tangents_are_unit_scaled() {
    let tangents = catmull_rom_tangents(&polygon(), 50.0);
    assert_eq!(tangents.len(), polygon().len() - 2);
    for line in tangents {
        assert!((line.direction().length() - 50.0).abs() < 1e-9);
    }
}
