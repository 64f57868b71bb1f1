//! Rigid and linear-blend skinning.
//!
//! Weights are computed once at bind time from the distance of every
//! bind-pose vertex to every bind-pose bone segment. Each pose change then
//! re-evaluates
//!
//! ```text
//! v' = Σ_j w(v, j) · world(j) · binding(j) · v
//! ```
//!
//! where `binding(j)` is the inverse of joint `j`'s world matrix at bind time.
//!
//! # Example
//!
//! ```ignore
//! use cg_engine::geom::{primitives, SkinMesh, SkinMode};
//!
//! let (skeleton, _root, elbow) = primitives::two_bone_rig();
//! let mut skin = SkinMesh::from_geom_mesh(&primitives::cylinder_x(Default::default()));
//! skin.bind_skeleton(skeleton, SkinMode::Linear)?;
//! skin.set_joint_angle(elbow, 45.0)?;
//! let flat = skin.deformed_positions_flat();
//! ```

use super::core::{Point3, Tolerance, Transform};
use super::mesh::GeomMesh;
use super::skeleton::{JointId, Skeleton, SkeletonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkinMode {
    /// Every vertex follows exactly one joint.
    Rigid,
    /// Inverse-distance blend over all joints.
    #[default]
    Linear,
}

impl SkinMode {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rigid" => Some(Self::Rigid),
            "linear" | "lbs" => Some(Self::Linear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkinError {
    #[error("no skeleton is bound to the skin")]
    NoSkeleton,
    #[error("skeleton has no joints")]
    EmptySkeleton,
    #[error("joint {joint} does not exist")]
    UnknownJoint { joint: JointId },
    #[error("weight buffer has {actual} entries, expected {expected}")]
    WeightCountMismatch { expected: usize, actual: usize },
    #[error("vertex {vertex} has no single joint with weight 1 for rigid skinning")]
    AmbiguousRigidWeight { vertex: usize },
    #[error("weights of vertex {vertex} sum to {sum}, expected 1")]
    InvalidWeightRow { vertex: usize, sum: f64 },
    #[error("joint {joint} has a singular world transform")]
    SingularJointTransform { joint: JointId },
    #[error(transparent)]
    Skeleton(SkeletonError),
}

impl From<SkeletonError> for SkinError {
    fn from(err: SkeletonError) -> Self {
        match err {
            SkeletonError::UnknownJoint { joint } => Self::UnknownJoint { joint },
            SkeletonError::SingularTransform { joint } => Self::SingularJointTransform { joint },
            other => Self::Skeleton(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinningOptions {
    /// Distances below this are clamped before the inverse power.
    pub min_distance: f64,
    pub falloff_power: i32,
}

impl Default for SkinningOptions {
    fn default() -> Self {
        Self {
            min_distance: 1e-6,
            falloff_power: 4,
        }
    }
}

impl SkinningOptions {
    #[must_use]
    pub fn with_min_distance(min_distance: f64) -> Self {
        Self {
            min_distance,
            ..Self::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Weights
// ─────────────────────────────────────────────────────────────────────────────

/// Distance from `p` to the segment `a..b`, clamped to the end points.
/// A zero-length segment behaves like the point `a`.
#[must_use]
pub fn distance_to_segment(p: Point3, a: Point3, b: Point3) -> f64 {
    let ab = b.sub_point(a);
    let len2 = ab.length_squared();
    if len2 <= Tolerance::ZERO_LENGTH.eps_squared() {
        return p.distance_to(a);
    }
    let t = (p.sub_point(a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance_to(a.lerp(b, t))
}

/// Nearest bone gets weight 1; ties go to the highest joint index, so a
/// vertex exactly at a joint follows the child bone.
#[must_use]
pub fn compute_rigid_weights(positions: &[Point3], segments: &[(Point3, Point3)]) -> Vec<f64> {
    let joints = segments.len();
    let mut weights = vec![0.0; positions.len() * joints];
    if joints == 0 {
        return weights;
    }
    for (v, &p) in positions.iter().enumerate() {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (j, &(a, b)) in segments.iter().enumerate() {
            let d = distance_to_segment(p, a, b);
            if d <= best_distance {
                best = j;
                best_distance = d;
            }
        }
        weights[v * joints + best] = 1.0;
    }
    weights
}

/// `1 / max(d, min_distance)^power`, normalized per vertex.
#[must_use]
pub fn compute_linear_weights(
    positions: &[Point3],
    segments: &[(Point3, Point3)],
    options: SkinningOptions,
) -> Vec<f64> {
    let joints = segments.len();
    let mut weights = Vec::with_capacity(positions.len() * joints);
    for &p in positions {
        let row_start = weights.len();
        for &(a, b) in segments {
            let d = distance_to_segment(p, a, b).max(options.min_distance);
            weights.push(1.0 / d.powi(options.falloff_power));
        }
        let row = &mut weights[row_start..];
        let sum: f64 = row.iter().sum();
        if sum > 0.0 && sum.is_finite() {
            row.iter_mut().for_each(|w| *w /= sum);
        }
    }
    weights
}

// ─────────────────────────────────────────────────────────────────────────────
// SkinMesh
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SkinMesh {
    bind_positions: Vec<Point3>,
    indices: Vec<u32>,
    positions: Vec<Point3>,
    /// Row-major `vertex x joint`.
    weights: Vec<f64>,
    skeleton: Option<Skeleton>,
    mode: SkinMode,
    options: SkinningOptions,
}

impl SkinMesh {
    #[must_use]
    pub fn new(positions: Vec<Point3>, indices: Vec<u32>) -> Self {
        Self {
            positions: positions.clone(),
            bind_positions: positions,
            indices,
            weights: Vec::new(),
            skeleton: None,
            mode: SkinMode::default(),
            options: SkinningOptions::default(),
        }
    }

    #[must_use]
    pub fn from_geom_mesh(mesh: &GeomMesh) -> Self {
        Self::new(
            mesh.positions.iter().copied().map(Point3::from).collect(),
            mesh.indices.clone(),
        )
    }

    #[must_use]
    pub fn with_options(mut self, options: SkinningOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.bind_positions.len()
    }

    #[must_use]
    pub fn bind_positions(&self) -> &[Point3] {
        &self.bind_positions
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub const fn mode(&self) -> SkinMode {
        self.mode
    }

    #[must_use]
    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Capture the bind pose, compute weights for `mode`, and skin once.
    pub fn bind_skeleton(&mut self, mut skeleton: Skeleton, mode: SkinMode) -> Result<(), SkinError> {
        if skeleton.is_empty() {
            return Err(SkinError::EmptySkeleton);
        }
        skeleton.update_world_matrices();
        skeleton.compute_binding_matrices()?;

        let segments = skeleton.segments();
        let weights = match mode {
            SkinMode::Rigid => compute_rigid_weights(&self.bind_positions, &segments),
            SkinMode::Linear => {
                compute_linear_weights(&self.bind_positions, &segments, self.options)
            }
        };
        let positions = skin_positions(&self.bind_positions, &skeleton, &weights, mode)?;
        log::debug!(
            "bound {} joints to {} vertices ({mode:?})",
            skeleton.len(),
            self.bind_positions.len()
        );
        self.weights = weights;
        self.positions = positions;
        self.skeleton = Some(skeleton);
        self.mode = mode;
        Ok(())
    }

    /// Replace the weight matrix. Rows must sum to 1; in rigid mode every
    /// row must hold exactly one weight of 1.
    ///
    /// Nothing changes when the weights are rejected.
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<(), SkinError> {
        let skeleton = self.skeleton.as_ref().ok_or(SkinError::NoSkeleton)?;
        let joints = skeleton.len();
        let expected = self.bind_positions.len() * joints;
        if weights.len() != expected {
            return Err(SkinError::WeightCountMismatch {
                expected,
                actual: weights.len(),
            });
        }
        for (vertex, row) in weights.chunks_exact(joints).enumerate() {
            let sum: f64 = row.iter().sum();
            if !Tolerance::LOOSE.approx_eq_f64(sum, 1.0) {
                return Err(SkinError::InvalidWeightRow { vertex, sum });
            }
            if self.mode == SkinMode::Rigid && rigid_owner(row).is_none() {
                return Err(SkinError::AmbiguousRigidWeight { vertex });
            }
        }
        let positions = skin_positions(&self.bind_positions, skeleton, &weights, self.mode)?;
        self.weights = weights;
        self.positions = positions;
        Ok(())
    }

    /// Pose one joint. On error the previous pose is kept.
    pub fn set_joint_angle(&mut self, joint: JointId, degrees: f64) -> Result<(), SkinError> {
        let skeleton = self.skeleton.as_ref().ok_or(SkinError::NoSkeleton)?;
        let mut posed = skeleton.clone();
        posed.set_joint_angle(joint, degrees)?;
        let positions = skin_positions(&self.bind_positions, &posed, &self.weights, self.mode)?;
        self.skeleton = Some(posed);
        self.positions = positions;
        Ok(())
    }

    /// Recompute deformed positions from the current pose.
    pub fn update_skin(&mut self) -> Result<(), SkinError> {
        let skeleton = self.skeleton.as_ref().ok_or(SkinError::NoSkeleton)?;
        self.positions = skin_positions(&self.bind_positions, skeleton, &self.weights, self.mode)?;
        Ok(())
    }

    #[must_use]
    pub fn deformed_positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Deformed positions as `[x0, y0, z0, x1, ...]`.
    #[must_use]
    pub fn deformed_positions_flat(&self) -> Vec<f64> {
        self.positions.iter().flat_map(|p| p.to_array()).collect()
    }

    /// One column of the weight matrix, for weight visualisation.
    pub fn joint_weights(&self, joint: JointId) -> Result<Vec<f64>, SkinError> {
        let joints = self.skeleton.as_ref().ok_or(SkinError::NoSkeleton)?.len();
        if joint.0 >= joints {
            return Err(SkinError::UnknownJoint { joint });
        }
        Ok(self
            .weights
            .chunks_exact(joints)
            .map(|row| row[joint.0])
            .collect())
    }

    #[must_use]
    pub fn vertex_weight(&self, vertex: usize, joint: JointId) -> Option<f64> {
        let joints = self.skeleton.as_ref()?.len();
        if vertex >= self.bind_positions.len() || joint.0 >= joints {
            return None;
        }
        self.weights.get(vertex * joints + joint.0).copied()
    }

    #[must_use]
    pub fn to_geom_mesh(&self) -> GeomMesh {
        GeomMesh::new(
            self.positions.iter().map(|p| p.to_array()).collect(),
            self.indices.clone(),
        )
    }
}

fn skin_positions(
    bind_positions: &[Point3],
    skeleton: &Skeleton,
    weights: &[f64],
    mode: SkinMode,
) -> Result<Vec<Point3>, SkinError> {
    let matrices = skeleton.skinning_matrices();
    let joints = matrices.len();

    let deform = |(vertex, &p): (usize, &Point3)| {
        let row = &weights[vertex * joints..(vertex + 1) * joints];
        deform_vertex(p, row, &matrices, mode).ok_or(SkinError::AmbiguousRigidWeight { vertex })
    };

    #[cfg(feature = "parallel")]
    let positions: Result<Vec<Point3>, SkinError> = {
        use rayon::prelude::*;
        bind_positions.par_iter().enumerate().map(deform).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let positions: Result<Vec<Point3>, SkinError> = bind_positions.iter().enumerate().map(deform).collect();

    positions
}

/// The single joint with weight exactly 1, if there is one.
#[allow(clippy::float_cmp)]
fn rigid_owner(row: &[f64]) -> Option<usize> {
    let mut owners = row.iter().enumerate().filter(|&(_, &w)| w == 1.0);
    let (joint, _) = owners.next()?;
    if owners.next().is_some() {
        return None;
    }
    Some(joint)
}

#[allow(clippy::float_cmp)]
fn deform_vertex(p: Point3, row: &[f64], matrices: &[Transform], mode: SkinMode) -> Option<Point3> {
    match mode {
        SkinMode::Rigid => rigid_owner(row).map(|joint| matrices[joint].apply_point(p)),
        SkinMode::Linear => {
            let mut acc = Point3::ORIGIN.to_vec3();
            for (&w, m) in row.iter().zip(matrices) {
                if w != 0.0 {
                    acc = acc.add(m.apply_point(p).to_vec3().mul_scalar(w));
                }
            }
            Some(Point3::from(acc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec3;

    fn single_bone() -> (Skeleton, JointId) {
        let mut skeleton = Skeleton::new();
        let root = skeleton
            .add_joint("root", None, Vec3::ZERO, Vec3::X, Vec3::Z)
            .unwrap();
        (skeleton, root)
    }

    #[test]
    fn distance_is_clamped_to_segment() {
        let a = Point3::ORIGIN;
        let b = Point3::new(2.0, 0.0, 0.0);
        assert!((distance_to_segment(Point3::new(1.0, 3.0, 0.0), a, b) - 3.0).abs() < 1e-12);
        assert!((distance_to_segment(Point3::new(5.0, 0.0, 0.0), a, b) - 3.0).abs() < 1e-12);
        assert!((distance_to_segment(Point3::new(0.0, 4.0, 0.0), a, a) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn vertex_on_bone_gets_full_weight() {
        let segments = [
            (Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)),
            (Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 0.0, 0.0)),
        ];
        let weights = compute_linear_weights(
            &[Point3::new(0.5, 0.0, 0.0)],
            &segments,
            SkinningOptions::default(),
        );
        assert!(weights[0] > 0.999_999);
        assert!((weights[0] + weights[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn operations_require_skeleton() {
        let mut skin = SkinMesh::new(vec![Point3::ORIGIN], Vec::new());
        assert_eq!(skin.update_skin(), Err(SkinError::NoSkeleton));
        assert_eq!(skin.set_joint_angle(JointId(0), 10.0), Err(SkinError::NoSkeleton));
        assert_eq!(skin.joint_weights(JointId(0)), Err(SkinError::NoSkeleton));
    }

    #[test]
    fn rigid_single_joint_matches_rotation() {
        let (skeleton, root) = single_bone();
        let p = Point3::new(0.5, 0.25, 0.0);
        let mut skin = SkinMesh::new(vec![p], Vec::new());
        skin.bind_skeleton(skeleton, SkinMode::Rigid).unwrap();
        skin.set_joint_angle(root, 30.0).unwrap();

        let expected = Transform::rotate_z(30f64.to_radians()).apply_point(p);
        assert!(Tolerance::LOOSE.approx_eq_point3(skin.deformed_positions()[0], expected));
    }

    #[test]
    fn set_weights_validates_shape_and_rows() {
        let (skeleton, _) = single_bone();
        let mut skin = SkinMesh::new(vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)], Vec::new());
        skin.bind_skeleton(skeleton, SkinMode::Linear).unwrap();
        assert_eq!(
            skin.set_weights(vec![1.0]),
            Err(SkinError::WeightCountMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert!(matches!(
            skin.set_weights(vec![1.0, 0.5]),
            Err(SkinError::InvalidWeightRow { vertex: 1, .. })
        ));
        assert!(skin.set_weights(vec![1.0, 1.0]).is_ok());
    }

    #[test]
    fn unknown_joint_angle_is_reported() {
        let (skeleton, _) = single_bone();
        let mut skin = SkinMesh::new(vec![Point3::ORIGIN], Vec::new());
        skin.bind_skeleton(skeleton, SkinMode::Linear).unwrap();
        assert_eq!(
            skin.set_joint_angle(JointId(7), 10.0),
            Err(SkinError::UnknownJoint { joint: JointId(7) })
        );
    }

    #[test]
    fn skin_mode_parsing() {
        assert_eq!(SkinMode::parse("Rigid"), Some(SkinMode::Rigid));
        assert_eq!(SkinMode::parse(" linear "), Some(SkinMode::Linear));
        assert_eq!(SkinMode::parse("dual-quat"), None);
    }
}
