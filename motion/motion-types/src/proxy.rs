//! Rigid-body collision proxies attached to skeleton bones.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};
use crate::skeleton::BoneId;

/// Geometry of a collision proxy, in the proxy's local frame.
///
/// Capsules are aligned with the local Y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProxyShape {
    /// Sphere with given radius.
    Sphere {
        /// Sphere radius.
        radius: f64,
    },
    /// Box with half-extents along each local axis.
    Box {
        /// Half-extents of the box.
        half_extents: Vector3<f64>,
    },
    /// Capsule: a segment along local Y swept by a sphere.
    Capsule {
        /// Radius of the swept sphere.
        radius: f64,
        /// Half-length of the axis segment.
        half_height: f64,
    },
}

impl ProxyShape {
    /// Create a sphere shape.
    #[must_use]
    pub const fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box shape from half-extents.
    #[must_use]
    pub const fn cuboid(half_extents: Vector3<f64>) -> Self {
        Self::Box { half_extents }
    }

    /// Create a capsule shape.
    #[must_use]
    pub const fn capsule(radius: f64, half_height: f64) -> Self {
        Self::Capsule {
            radius,
            half_height,
        }
    }

    /// Whether every dimension is finite and positive (capsule height may be zero).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        match *self {
            Self::Sphere { radius } => positive(radius),
            Self::Box { half_extents } => half_extents.iter().all(|&v| positive(v)),
            Self::Capsule {
                radius,
                half_height,
            } => positive(radius) && half_height.is_finite() && half_height >= 0.0,
        }
    }
}

/// How a proxy moves during physics simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProxyMode {
    /// Rigidly follows its owning bone. Only these proxies track animation.
    #[default]
    FollowBone,
    /// Fully simulated.
    Physics,
    /// Simulated, with position snapped back to the bone.
    PhysicsWithBone,
}

/// A collision proxy (rigid body) defined on a skeleton.
///
/// `position` and `rotation` describe the proxy in model space at rest, the
/// same space bone rest positions live in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBodyProxy {
    /// Proxy name.
    pub name: String,
    /// Owning bone, if any.
    pub bone: Option<BoneId>,
    /// Local geometry.
    pub shape: ProxyShape,
    /// Rest position in model space.
    pub position: Point3<f64>,
    /// Rest orientation in model space.
    pub rotation: UnitQuaternion<f64>,
    /// Simulation mode.
    pub mode: ProxyMode,
}

impl RigidBodyProxy {
    /// Create a bone-following proxy with identity orientation.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        bone: Option<BoneId>,
        shape: ProxyShape,
        position: Point3<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            bone,
            shape,
            position,
            rotation: UnitQuaternion::identity(),
            mode: ProxyMode::FollowBone,
        }
    }

    /// Set the rest orientation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the simulation mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ProxyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether the proxy rigidly follows its bone.
    #[must_use]
    pub fn is_bone_following(&self) -> bool {
        self.mode == ProxyMode::FollowBone
    }

    /// Validate shape and placement.
    pub fn validate(&self) -> Result<()> {
        if !self.shape.is_valid() {
            return Err(MotionError::invalid_proxy(
                &self.name,
                "shape dimensions must be finite and positive",
            ));
        }
        if !self.position.coords.iter().all(|v| v.is_finite()) {
            return Err(MotionError::invalid_proxy(&self.name, "non-finite position"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_validity() {
        assert!(ProxyShape::sphere(1.0).is_valid());
        assert!(!ProxyShape::sphere(0.0).is_valid());
        assert!(!ProxyShape::cuboid(Vector3::new(1.0, -1.0, 1.0)).is_valid());
        assert!(ProxyShape::capsule(1.0, 0.0).is_valid());
        assert!(!ProxyShape::capsule(1.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_proxy_builder() {
        let proxy = RigidBodyProxy::new(
            "chest",
            Some(BoneId(1)),
            ProxyShape::cuboid(Vector3::new(1.0, 2.0, 3.0)),
            Point3::new(0.0, 10.0, 0.0),
        );
        assert!(proxy.is_bone_following());
        assert!(proxy.validate().is_ok());

        let simulated = proxy.with_mode(ProxyMode::Physics);
        assert!(!simulated.is_bone_following());
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let proxy = RigidBodyProxy::new("bad", None, ProxyShape::sphere(-1.0), Point3::origin());
        let err = proxy.validate().unwrap_err();
        assert!(err.to_string().contains("bad"));
    }
}
