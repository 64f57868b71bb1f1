//! Joint hierarchy for skinning.
//!
//! Joints live in an arena and refer to their parent by [`JointId`]. A parent
//! must exist before its children are added, so arena order is always a valid
//! parent-before-child order for world-matrix updates.
//!
//! Each joint's local frame is `translate(origin) · rotate(axis, angle)`:
//! `origin` is the joint position in the parent frame, and the bone runs from
//! the local origin to `tip`.

use std::fmt;

use super::core::{Point3, Transform, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub usize);

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkeletonError {
    #[error("parent joint {parent} does not exist")]
    UnknownParent { parent: JointId },
    #[error("joint {joint} does not exist")]
    UnknownJoint { joint: JointId },
    #[error("joint `{name}` has a zero-length rotation axis")]
    InvalidAxis { name: String },
    #[error("joint angle must be finite, got {0}")]
    NonFiniteAngle(f64),
    #[error("world transform of joint {joint} is not invertible")]
    SingularTransform { joint: JointId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub parent: Option<JointId>,
    /// Joint position in the parent frame (world frame for roots).
    pub origin: Vec3,
    /// Bone end point in the joint's own frame.
    pub tip: Vec3,
    /// Unit rotation axis in the joint's own frame.
    pub axis: Vec3,
    pub angle_degrees: f64,
    world: Transform,
    binding: Transform,
}

impl Joint {
    #[must_use]
    pub const fn world(&self) -> Transform {
        self.world
    }

    /// Inverse of the world transform captured at bind time.
    #[must_use]
    pub const fn binding(&self) -> Transform {
        self.binding
    }

    #[must_use]
    pub fn local(&self) -> Transform {
        // the axis is normalized in `Skeleton::add_joint`
        let rotation = Transform::rotate_axis_degrees(self.axis, self.angle_degrees)
            .unwrap_or_else(Transform::identity);
        Transform::translate(self.origin) * rotation
    }

    /// Bone start and end in world space.
    #[must_use]
    pub fn segment(&self) -> (Point3, Point3) {
        (
            self.world.apply_point(Point3::ORIGIN),
            self.world.apply_point(Point3::from(self.tip)),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    joints: Vec<Joint>,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_joint(
        &mut self,
        name: impl Into<String>,
        parent: Option<JointId>,
        origin: Vec3,
        tip: Vec3,
        axis: Vec3,
    ) -> Result<JointId, SkeletonError> {
        let name = name.into();
        if let Some(parent) = parent {
            if parent.0 >= self.joints.len() {
                return Err(SkeletonError::UnknownParent { parent });
            }
        }
        let axis = axis
            .normalized()
            .ok_or_else(|| SkeletonError::InvalidAxis { name: name.clone() })?;

        let id = JointId(self.joints.len());
        self.joints.push(Joint {
            name,
            parent,
            origin,
            tip,
            axis,
            angle_degrees: 0.0,
            world: Transform::identity(),
            binding: Transform::identity(),
        });
        self.update_world_matrices();
        Ok(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, id: JointId) -> Result<&Joint, SkeletonError> {
        self.joints
            .get(id.0)
            .ok_or(SkeletonError::UnknownJoint { joint: id })
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<JointId> {
        self.joints.iter().position(|j| j.name == name).map(JointId)
    }

    /// Set a joint angle and refresh every world matrix.
    pub fn set_joint_angle(&mut self, id: JointId, degrees: f64) -> Result<(), SkeletonError> {
        if !degrees.is_finite() {
            return Err(SkeletonError::NonFiniteAngle(degrees));
        }
        let joint = self
            .joints
            .get_mut(id.0)
            .ok_or(SkeletonError::UnknownJoint { joint: id })?;
        joint.angle_degrees = degrees;
        self.update_world_matrices();
        Ok(())
    }

    /// `world = parent_world · local`, walked in arena order.
    pub fn update_world_matrices(&mut self) {
        for i in 0..self.joints.len() {
            let local = self.joints[i].local();
            let world = match self.joints[i].parent {
                Some(parent) => self.joints[parent.0].world * local,
                None => local,
            };
            self.joints[i].world = world;
        }
    }

    /// Capture `inverse(world)` of the current pose as the bind pose.
    pub fn compute_binding_matrices(&mut self) -> Result<(), SkeletonError> {
        for (i, joint) in self.joints.iter_mut().enumerate() {
            joint.binding = joint
                .world
                .inverse()
                .ok_or(SkeletonError::SingularTransform { joint: JointId(i) })?;
        }
        Ok(())
    }

    /// World-space bone segments in arena order.
    #[must_use]
    pub fn segments(&self) -> Vec<(Point3, Point3)> {
        self.joints.iter().map(Joint::segment).collect()
    }

    /// `world · binding` per joint: maps bind-pose points to the current pose.
    #[must_use]
    pub fn skinning_matrices(&self) -> Vec<Transform> {
        self.joints.iter().map(|j| j.world * j.binding).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    fn arm() -> (Skeleton, JointId, JointId) {
        let mut skeleton = Skeleton::new();
        let shoulder = skeleton
            .add_joint("shoulder", None, Vec3::ZERO, Vec3::X, Vec3::Z)
            .unwrap();
        let elbow = skeleton
            .add_joint("elbow", Some(shoulder), Vec3::X, Vec3::X, Vec3::Z)
            .unwrap();
        (skeleton, shoulder, elbow)
    }

    #[test]
    fn child_inherits_parent_rotation() {
        let (mut skeleton, shoulder, elbow) = arm();
        skeleton.set_joint_angle(shoulder, 90.0).unwrap();
        let (start, end) = skeleton.joint(elbow).unwrap().segment();
        let tol = Tolerance::DEFAULT;
        assert!(tol.approx_eq_point3(start, Point3::new(0.0, 1.0, 0.0)));
        assert!(tol.approx_eq_point3(end, Point3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut skeleton = Skeleton::new();
        let err = skeleton
            .add_joint("orphan", Some(JointId(3)), Vec3::ZERO, Vec3::X, Vec3::Z)
            .unwrap_err();
        assert_eq!(err, SkeletonError::UnknownParent { parent: JointId(3) });
    }

    #[test]
    fn zero_axis_is_rejected() {
        let mut skeleton = Skeleton::new();
        assert!(matches!(
            skeleton.add_joint("root", None, Vec3::ZERO, Vec3::X, Vec3::ZERO),
            Err(SkeletonError::InvalidAxis { .. })
        ));
    }

    #[test]
    fn binding_cancels_bind_pose() {
        let (mut skeleton, _, elbow) = arm();
        skeleton.compute_binding_matrices().unwrap();
        let p = Point3::new(1.5, 0.2, -0.3);
        let m = skeleton.skinning_matrices()[elbow.0];
        assert!(Tolerance::DEFAULT.approx_eq_point3(m.apply_point(p), p));
    }

    #[test]
    fn find_by_name() {
        let (skeleton, _, elbow) = arm();
        assert_eq!(skeleton.find("elbow"), Some(elbow));
        assert_eq!(skeleton.find("wrist"), None);
    }
}
