//! Bezier curves and De Casteljau subdivision.
//!
//! Curves of degree 2 and 3 are split with De Casteljau's construction and
//! drawn either to a fixed recursion depth or adaptively until every leaf's
//! control polygon is flat enough to stand in for the curve.
//!
//! # Example
//!
//! ```ignore
//! use cg_engine::geom::{adaptive_subdivide, AdaptiveOptions, BezierCurve, Point3};
//!
//! let curve = BezierCurve::from_points(&[
//!     Point3::xy(0.0, 0.0),
//!     Point3::xy(50.0, 100.0),
//!     Point3::xy(150.0, 100.0),
//!     Point3::xy(200.0, 0.0),
//! ])?;
//! let result = adaptive_subdivide(&curve, AdaptiveOptions::default())?;
//! println!("{} flat segments", result.segments.len());
//! ```

use super::core::{Point3, Tolerance, Vec3};

/// Hard ceiling on fixed-depth recursion (2^16 leaves).
pub const MAX_RECURSIVE_DEPTH: u32 = 16;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    #[error("de Casteljau curves need 3 or 4 control points, got {count}")]
    InvalidPointCount { count: usize },
    #[error("curve parameter must lie in [0, 1], got {t}")]
    InvalidParameter { t: f64 },
    #[error("flatness threshold must be finite and positive, got {threshold}")]
    InvalidThreshold { threshold: f64 },
    #[error("spline evaluation requires at least {min} points, got {count}")]
    NotEnoughPoints { min: usize, count: usize },
    #[error("segment count must be at least 1")]
    InvalidSegmentCount,
    #[error("end condition must be in 1..=5, got {0}")]
    InvalidEndCondition(u8),
    #[error("tension must be finite, got {0}")]
    InvalidTension(f64),
    #[error("control points must be finite")]
    NonFinitePoint,
}

// ─────────────────────────────────────────────────────────────────────────────
// Curve3
// ─────────────────────────────────────────────────────────────────────────────

pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    /// Central-difference derivative; implementors with a closed form override it.
    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let h = 1e-6 * (b - a).abs();
        if !h.is_finite() || h == 0.0 {
            return Vec3::ZERO;
        }
        let t0 = (t - h).max(a);
        let t1 = (t + h).min(b);
        if t1 == t0 {
            return Vec3::ZERO;
        }
        self.point_at(t1)
            .sub_point(self.point_at(t0))
            .mul_scalar(1.0 / (t1 - t0))
    }

    /// Unit tangent at `t`, `None` where the derivative vanishes.
    #[must_use]
    fn tangent_at(&self, t: f64) -> Option<Vec3> {
        self.derivative_at(t).normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line3 {
    pub start: Point3,
    pub end: Point3,
}

impl Line3 {
    #[must_use]
    pub const fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn direction(self) -> Vec3 {
        self.end.sub_point(self.start)
    }
}

impl Curve3 for Line3 {
    fn point_at(&self, t: f64) -> Point3 {
        self.start.lerp(self.end, t)
    }

    fn derivative_at(&self, _t: f64) -> Vec3 {
        self.direction()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bezier segments
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticBezier3 {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
}

impl QuadraticBezier3 {
    #[must_use]
    pub const fn new(p0: Point3, p1: Point3, p2: Point3) -> Self {
        Self { p0, p1, p2 }
    }

    /// De Casteljau split at `t`; both halves share the split point.
    #[must_use]
    pub fn split(self, t: f64) -> (Self, Self) {
        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let mid = p01.lerp(p12, t);
        (Self::new(self.p0, p01, mid), Self::new(mid, p12, self.p2))
    }
}

impl Curve3 for QuadraticBezier3 {
    fn point_at(&self, t: f64) -> Point3 {
        let u = 1.0 - t;
        Point3::weighted_sum4(
            [self.p0, self.p1, self.p2, self.p2],
            [u * u, 2.0 * u * t, t * t, 0.0],
        )
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let a = self.p1.sub_point(self.p0);
        let b = self.p2.sub_point(self.p1);
        a.mul_scalar(2.0 * (1.0 - t)).add(b.mul_scalar(2.0 * t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier3 {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
}

impl CubicBezier3 {
    #[must_use]
    pub const fn new(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p0, p1, p2, p3 }
    }

    #[must_use]
    pub const fn from_array(points: [Point3; 4]) -> Self {
        Self::new(points[0], points[1], points[2], points[3])
    }

    /// De Casteljau split at `t`; both halves share the split point.
    #[must_use]
    pub fn split(self, t: f64) -> (Self, Self) {
        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let p23 = self.p2.lerp(self.p3, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let mid = p012.lerp(p123, t);
        (
            Self::new(self.p0, p01, p012, mid),
            Self::new(mid, p123, p23, self.p3),
        )
    }
}

/// Cubic Bernstein weights `(1-t)^3, 3t(1-t)^2, 3t^2(1-t), t^3`.
#[must_use]
pub fn cubic_bernstein(t: f64) -> [f64; 4] {
    let u = 1.0 - t;
    [u * u * u, 3.0 * t * u * u, 3.0 * t * t * u, t * t * t]
}

impl Curve3 for CubicBezier3 {
    fn point_at(&self, t: f64) -> Point3 {
        Point3::weighted_sum4([self.p0, self.p1, self.p2, self.p3], cubic_bernstein(t))
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let u = 1.0 - t;
        let a = self.p1.sub_point(self.p0);
        let b = self.p2.sub_point(self.p1);
        let c = self.p3.sub_point(self.p2);
        a.mul_scalar(3.0 * u * u)
            .add(b.mul_scalar(6.0 * u * t))
            .add(c.mul_scalar(3.0 * t * t))
    }
}

/// A curve the De Casteljau tools accept: exactly 3 or 4 control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BezierCurve {
    Quadratic(QuadraticBezier3),
    Cubic(CubicBezier3),
}

impl BezierCurve {
    pub fn from_points(points: &[Point3]) -> Result<Self, CurveError> {
        if points.iter().any(|p| !p.is_finite()) {
            return Err(CurveError::NonFinitePoint);
        }
        match *points {
            [p0, p1, p2] => Ok(Self::Quadratic(QuadraticBezier3::new(p0, p1, p2))),
            [p0, p1, p2, p3] => Ok(Self::Cubic(CubicBezier3::new(p0, p1, p2, p3))),
            _ => Err(CurveError::InvalidPointCount {
                count: points.len(),
            }),
        }
    }

    #[must_use]
    pub const fn degree(&self) -> usize {
        match self {
            Self::Quadratic(_) => 2,
            Self::Cubic(_) => 3,
        }
    }

    #[must_use]
    pub fn control_points(&self) -> Vec<Point3> {
        match *self {
            Self::Quadratic(c) => vec![c.p0, c.p1, c.p2],
            Self::Cubic(c) => vec![c.p0, c.p1, c.p2, c.p3],
        }
    }

    #[must_use]
    pub const fn first(&self) -> Point3 {
        match self {
            Self::Quadratic(c) => c.p0,
            Self::Cubic(c) => c.p0,
        }
    }

    #[must_use]
    pub const fn last(&self) -> Point3 {
        match self {
            Self::Quadratic(c) => c.p2,
            Self::Cubic(c) => c.p3,
        }
    }

    /// Consecutive control points joined as line segments.
    #[must_use]
    pub fn control_polygon(&self) -> Vec<Line3> {
        self.control_points()
            .windows(2)
            .map(|w| Line3::new(w[0], w[1]))
            .collect()
    }

    /// Split at `t ∈ [0, 1]` into two curves of the same degree.
    pub fn split(&self, t: f64) -> Result<(Self, Self), CurveError> {
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(CurveError::InvalidParameter { t });
        }
        Ok(self.split_unchecked(t))
    }

    fn split_unchecked(&self, t: f64) -> (Self, Self) {
        match *self {
            Self::Quadratic(c) => {
                let (a, b) = c.split(t);
                (Self::Quadratic(a), Self::Quadratic(b))
            }
            Self::Cubic(c) => {
                let (a, b) = c.split(t);
                (Self::Cubic(a), Self::Cubic(b))
            }
        }
    }

    /// Largest distance of an interior control point from the chord through
    /// the end points. A degenerate chord counts as flat.
    #[must_use]
    pub fn flatness(&self) -> f64 {
        let a = self.first();
        let chord = self.last().sub_point(a);
        let chord_len = chord.length();
        if chord_len <= Tolerance::ZERO_LENGTH.eps {
            return 0.0;
        }
        let control = self.control_points();
        control[1..control.len() - 1]
            .iter()
            .map(|p| p.sub_point(a).cross(chord).length() / chord_len)
            .fold(0.0, f64::max)
    }
}

impl Curve3 for BezierCurve {
    fn point_at(&self, t: f64) -> Point3 {
        match self {
            Self::Quadratic(c) => c.point_at(t),
            Self::Cubic(c) => c.point_at(t),
        }
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        match self {
            Self::Quadratic(c) => c.derivative_at(t),
            Self::Cubic(c) => c.derivative_at(t),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixed-depth drawing
// ─────────────────────────────────────────────────────────────────────────────

/// Split at 0.5 `depth` times; returns the `2^depth` leaves in curve order.
///
/// Depths above [`MAX_RECURSIVE_DEPTH`] are clamped.
#[must_use]
pub fn de_casteljau_segments(curve: &BezierCurve, depth: u32) -> Vec<BezierCurve> {
    let depth = if depth > MAX_RECURSIVE_DEPTH {
        log::warn!("recursion depth {depth} clamped to {MAX_RECURSIVE_DEPTH}");
        MAX_RECURSIVE_DEPTH
    } else {
        depth
    };

    let mut leaves = Vec::with_capacity(1usize << depth);
    split_to_depth(*curve, depth, &mut leaves);
    log::debug!("de Casteljau depth {depth}: {} leaves", leaves.len());
    leaves
}

fn split_to_depth(curve: BezierCurve, depth: u32, out: &mut Vec<BezierCurve>) {
    if depth == 0 {
        out.push(curve);
        return;
    }
    let (left, right) = curve.split_unchecked(0.5);
    split_to_depth(left, depth - 1, out);
    split_to_depth(right, depth - 1, out);
}

/// Join the control polygons of consecutive leaves into one polyline,
/// dropping the shared point between neighbours.
#[must_use]
pub fn leaves_to_polyline(leaves: &[BezierCurve]) -> Vec<Point3> {
    let mut points = Vec::new();
    for leaf in leaves {
        let control = leaf.control_points();
        let skip = usize::from(!points.is_empty());
        points.extend(control.into_iter().skip(skip));
    }
    points
}

// ─────────────────────────────────────────────────────────────────────────────
// Adaptive drawing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveOptions {
    /// Maximum allowed control-point distance from the chord, in curve units.
    pub flatness_threshold: f64,
    /// Safety cap on recursion; leaves reached here are emitted regardless.
    pub max_depth: u32,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            flatness_threshold: 0.5,
            max_depth: 24,
        }
    }
}

impl AdaptiveOptions {
    #[must_use]
    pub fn with_threshold(flatness_threshold: f64) -> Self {
        Self {
            flatness_threshold,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptiveSubdivision {
    /// Flat leaves in curve order.
    pub segments: Vec<BezierCurve>,
    /// First and last control point of every leaf.
    pub markers: Vec<Point3>,
    /// Leaves emitted because `max_depth` was hit before they became flat.
    pub capped_leaves: usize,
    pub max_depth_reached: u32,
}

impl AdaptiveSubdivision {
    #[must_use]
    pub fn polyline(&self) -> Vec<Point3> {
        leaves_to_polyline(&self.segments)
    }
}

pub fn adaptive_subdivide(
    curve: &BezierCurve,
    options: AdaptiveOptions,
) -> Result<AdaptiveSubdivision, CurveError> {
    let threshold = options.flatness_threshold;
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(CurveError::InvalidThreshold { threshold });
    }

    let mut result = AdaptiveSubdivision::default();
    subdivide_until_flat(*curve, 0, options, &mut result);

    if result.capped_leaves > 0 {
        log::warn!(
            "adaptive subdivision hit depth cap {} on {} leaves",
            options.max_depth,
            result.capped_leaves
        );
    }
    log::debug!(
        "adaptive subdivision: {} segments, depth {}",
        result.segments.len(),
        result.max_depth_reached
    );
    Ok(result)
}

fn subdivide_until_flat(
    curve: BezierCurve,
    depth: u32,
    options: AdaptiveOptions,
    out: &mut AdaptiveSubdivision,
) {
    let flat = curve.flatness() <= options.flatness_threshold;
    if !flat && depth < options.max_depth {
        let (left, right) = curve.split_unchecked(0.5);
        subdivide_until_flat(left, depth + 1, options, out);
        subdivide_until_flat(right, depth + 1, options, out);
        return;
    }

    if !flat {
        out.capped_leaves += 1;
    }
    out.max_depth_reached = out.max_depth_reached.max(depth);
    out.markers.push(curve.first());
    out.markers.push(curve.last());
    out.segments.push(curve);
}

/// Sample `steps + 1` evenly spaced parameters including both ends.
#[must_use]
pub fn tessellate_curve_uniform(curve: &impl Curve3, steps: usize) -> Vec<Point3> {
    let steps = steps.max(1);
    let (a, b) = curve.domain();
    #[allow(clippy::cast_precision_loss)]
    let span = (b - a) / steps as f64;
    (0..=steps)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = if i == steps { b } else { a + span * i as f64 };
            curve.point_at(t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s_curve() -> BezierCurve {
        BezierCurve::from_points(&[
            Point3::xy(0.0, 0.0),
            Point3::xy(1.0, 2.0),
            Point3::xy(3.0, -2.0),
            Point3::xy(4.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_wrong_point_counts() {
        let two = [Point3::ORIGIN, Point3::xy(1.0, 0.0)];
        assert_eq!(
            BezierCurve::from_points(&two),
            Err(CurveError::InvalidPointCount { count: 2 })
        );
        let five = [Point3::ORIGIN; 5];
        assert!(BezierCurve::from_points(&five).is_err());
    }

    #[test]
    fn quadratic_split_shares_midpoint() {
        let curve = BezierCurve::from_points(&[
            Point3::xy(0.0, 0.0),
            Point3::xy(1.0, 2.0),
            Point3::xy(2.0, 0.0),
        ])
        .unwrap();
        let (left, right) = curve.split(0.5).unwrap();
        assert_eq!(left.degree(), 2);
        assert_eq!(left.last(), right.first());
        assert_eq!(left.last(), Point3::xy(1.0, 1.0));
    }

    #[test]
    fn split_rejects_out_of_range_parameter() {
        assert_eq!(
            s_curve().split(1.5),
            Err(CurveError::InvalidParameter { t: 1.5 })
        );
        assert!(s_curve().split(f64::NAN).is_err());
    }

    #[test]
    fn depth_zero_is_control_polygon() {
        let leaves = de_casteljau_segments(&s_curve(), 0);
        assert_eq!(leaves, vec![s_curve()]);
        assert_eq!(leaves[0].control_polygon().len(), 3);
    }

    #[test]
    fn straight_curve_is_flat_immediately() {
        let line = BezierCurve::from_points(&[
            Point3::xy(0.0, 0.0),
            Point3::xy(1.0, 0.0),
            Point3::xy(2.0, 0.0),
            Point3::xy(3.0, 0.0),
        ])
        .unwrap();
        let result = adaptive_subdivide(&line, AdaptiveOptions::default()).unwrap();
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.markers, vec![Point3::xy(0.0, 0.0), Point3::xy(3.0, 0.0)]);
    }

    #[test]
    fn closed_loop_chord_counts_as_flat() {
        let loop_curve = BezierCurve::from_points(&[
            Point3::xy(0.0, 0.0),
            Point3::xy(10.0, 10.0),
            Point3::xy(-10.0, 10.0),
            Point3::xy(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(loop_curve.flatness(), 0.0);
    }

    #[test]
    fn threshold_must_be_positive() {
        for threshold in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                adaptive_subdivide(&s_curve(), AdaptiveOptions::with_threshold(threshold)),
                Err(CurveError::InvalidThreshold { .. })
            ));
        }
    }

    #[test]
    fn depth_cap_is_reported() {
        let options = AdaptiveOptions {
            flatness_threshold: 1e-12,
            max_depth: 3,
        };
        let result = adaptive_subdivide(&s_curve(), options).unwrap();
        assert_eq!(result.segments.len(), 8);
        assert_eq!(result.capped_leaves, 8);
        assert_eq!(result.max_depth_reached, 3);
    }
}
