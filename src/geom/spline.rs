//! Uniform cubic B-spline and Catmull-Rom evaluation.
//!
//! B-spline windows near the ends of an open control polygon are clamped by
//! repeating the nearest control point, which gives five evaluation regimes
//! (see [`EndCondition`]). The clamped curve interpolates the first and last
//! control point.

use super::core::{Point3, Tolerance};
use super::curve::{CurveError, Line3};

/// Which part of a 4-point window a cubic B-spline segment evaluates.
///
/// Regimes 1 and 2 substitute missing left neighbours with `p0`, regimes 4
/// and 5 substitute missing right neighbours with `p3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndCondition {
    First,
    Second,
    Interior,
    Penultimate,
    Last,
}

impl EndCondition {
    pub const ALL: [Self; 5] = [
        Self::First,
        Self::Second,
        Self::Interior,
        Self::Penultimate,
        Self::Last,
    ];

    pub fn from_index(index: u8) -> Result<Self, CurveError> {
        match index {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            3 => Ok(Self::Interior),
            4 => Ok(Self::Penultimate),
            5 => Ok(Self::Last),
            other => Err(CurveError::InvalidEndCondition(other)),
        }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Interior => 3,
            Self::Penultimate => 4,
            Self::Last => 5,
        }
    }

    /// Control points fed to `B0..B3` for this regime.
    #[must_use]
    pub const fn window(self, p: [Point3; 4]) -> [Point3; 4] {
        let [p0, p1, p2, p3] = p;
        match self {
            Self::First => [p0, p0, p0, p1],
            Self::Second => [p0, p0, p1, p2],
            Self::Interior => [p0, p1, p2, p3],
            Self::Penultimate => [p1, p2, p3, p3],
            Self::Last => [p2, p3, p3, p3],
        }
    }
}

/// Uniform cubic B-spline basis at `t ∈ [0, 1]`.
#[must_use]
pub fn bspline_basis(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    let u = 1.0 - t;
    [
        u * u * u / 6.0,
        (3.0 * t3 - 6.0 * t2 + 4.0) / 6.0,
        (-3.0 * t3 + 3.0 * t2 + 3.0 * t + 1.0) / 6.0,
        t3 / 6.0,
    ]
}

#[must_use]
pub fn evaluate_cubic_spline_segment(
    p0: Point3,
    p1: Point3,
    p2: Point3,
    p3: Point3,
    t: f64,
    end_condition: EndCondition,
) -> Point3 {
    Point3::weighted_sum4(end_condition.window([p0, p1, p2, p3]), bspline_basis(t))
}

/// Cubic Hermite segment from `p1` to `p2` with tangents scaled by `tension`.
#[must_use]
pub fn evaluate_catmull_rom(
    p0: Point3,
    p1: Point3,
    p2: Point3,
    p3: Point3,
    t: f64,
    tension: f64,
) -> Point3 {
    let m1 = p2.sub_point(p0).mul_scalar(tension);
    let m2 = p3.sub_point(p1).mul_scalar(tension);
    let a = p1
        .to_vec3()
        .mul_scalar(2.0)
        .sub(p2.to_vec3().mul_scalar(2.0))
        .add(m1)
        .add(m2);
    let b = p1
        .to_vec3()
        .mul_scalar(-3.0)
        .add(p2.to_vec3().mul_scalar(3.0))
        .sub(m1.mul_scalar(2.0))
        .sub(m2);
    let t2 = t * t;
    p1.add_vec(a.mul_scalar(t2 * t).add(b.mul_scalar(t2)).add(m1.mul_scalar(t)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplineKind {
    /// Uniform cubic B-spline over interior windows (approximating).
    BSpline,
    /// Catmull-Rom through the inner two points of every window.
    CatmullRom { tension: f64 },
}

impl SplineKind {
    pub const DEFAULT_TENSION: f64 = 0.5;

    #[must_use]
    pub const fn catmull_rom() -> Self {
        Self::CatmullRom {
            tension: Self::DEFAULT_TENSION,
        }
    }
}

impl Default for SplineKind {
    fn default() -> Self {
        Self::BSpline
    }
}

fn validate_spline_input(points: &[Point3], num_segments: usize) -> Result<(), CurveError> {
    if points.len() < 4 {
        return Err(CurveError::NotEnoughPoints {
            min: 4,
            count: points.len(),
        });
    }
    if num_segments == 0 {
        return Err(CurveError::InvalidSegmentCount);
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(CurveError::NonFinitePoint);
    }
    Ok(())
}

/// Sample a spline over every sliding 4-point window.
///
/// Each window contributes `num_segments` samples at `t = j / num_segments`;
/// the final window also contributes its `t = 1` end so the polyline closes.
pub fn evaluate_spline(
    points: &[Point3],
    num_segments: usize,
    kind: SplineKind,
) -> Result<Vec<Point3>, CurveError> {
    validate_spline_input(points, num_segments)?;
    if let SplineKind::CatmullRom { tension } = kind {
        if !tension.is_finite() {
            return Err(CurveError::InvalidTension(tension));
        }
    }

    let eval = |w: &[Point3], t: f64| match kind {
        SplineKind::BSpline => {
            evaluate_cubic_spline_segment(w[0], w[1], w[2], w[3], t, EndCondition::Interior)
        }
        SplineKind::CatmullRom { tension } => {
            evaluate_catmull_rom(w[0], w[1], w[2], w[3], t, tension)
        }
    };

    let windows: Vec<&[Point3]> = points.windows(4).collect();
    let mut samples = Vec::with_capacity(windows.len() * num_segments + 1);
    #[allow(clippy::cast_precision_loss)]
    let step = 1.0 / num_segments as f64;
    for window in &windows {
        for j in 0..num_segments {
            #[allow(clippy::cast_precision_loss)]
            samples.push(eval(window, j as f64 * step));
        }
    }
    if let Some(last) = windows.last() {
        samples.push(eval(last, 1.0));
    }

    log::debug!(
        "spline {:?}: {} windows, {} samples",
        kind,
        windows.len(),
        samples.len()
    );
    Ok(samples)
}

/// Walk regimes 1 through 5 over one 4-point window.
///
/// Returns `5 * segments_per_span + 1` samples from `p0` to `p3`. This is the
/// curve the spline patch applies along each row and column.
pub fn evaluate_clamped_spline(
    points: [Point3; 4],
    segments_per_span: usize,
) -> Result<Vec<Point3>, CurveError> {
    validate_spline_input(&points, segments_per_span)?;
    let params = clamped_parameters(segments_per_span);
    Ok(params
        .into_iter()
        .map(|(regime, t)| {
            evaluate_cubic_spline_segment(points[0], points[1], points[2], points[3], t, regime)
        })
        .collect())
}

/// `(regime, t)` pairs for a clamped 4-point window: five runs of `j / n`
/// for `j in 0..n`, then the closing `(Last, 1.0)`.
#[must_use]
pub fn clamped_parameters(segments_per_span: usize) -> Vec<(EndCondition, f64)> {
    let n = segments_per_span.max(1);
    #[allow(clippy::cast_precision_loss)]
    let step = 1.0 / n as f64;
    let mut params = Vec::with_capacity(5 * n + 1);
    for regime in EndCondition::ALL {
        for j in 0..n {
            #[allow(clippy::cast_precision_loss)]
            params.push((regime, j as f64 * step));
        }
    }
    params.push((EndCondition::Last, 1.0));
    params
}

/// Display tangents at interior nodes: `normalize(next - prev) * length`
/// anchored at the node. Nodes whose neighbours coincide are skipped.
#[must_use]
pub fn catmull_rom_tangents(points: &[Point3], length: f64) -> Vec<Line3> {
    if points.len() < 3 {
        return Vec::new();
    }
    points
        .windows(3)
        .filter_map(|w| {
            let dir = w[2].sub_point(w[0]);
            if Tolerance::ZERO_LENGTH.is_zero_vec3(dir) {
                return None;
            }
            let dir = dir.normalized()?;
            Some(Line3::new(w[1], w[1].add_vec(dir.mul_scalar(length))))
        })
        .collect()
}
