//! Avoidance volumes and point-in-volume tests.
//!
//! An [`AvoidanceVolume`] is a collision proxy bound to the chain from its
//! owning bone to the hierarchy root. Its world pose is re-derived from that
//! chain's forward kinematics at every frame; nothing is cached across
//! frames.
//!
//! The point test is strict: a point exactly on the surface is outside.

use motion_kinematics::{KinematicsError, forward_kinematics};
use motion_types::{BoneChain, MotionStore, ProxyShape, RigidBodyProxy, Skeleton};
use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::error::{AvoidError, Result};

/// Lengths below this are treated as zero when picking a push direction.
const DEGENERATE_LENGTH: f64 = 1.0e-12;

/// A point found inside a volume and where to move it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Corrected position on (or `margin` beyond) the volume surface.
    pub target: Point3<f64>,
    /// How far the point was inside the surface.
    pub depth: f64,
}

/// World-space placement of a proxy shape at one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumePose {
    /// Shape centre.
    pub center: Point3<f64>,
    /// Shape orientation.
    pub rotation: UnitQuaternion<f64>,
    /// Local geometry.
    pub shape: ProxyShape,
}

impl VolumePose {
    /// Create a pose.
    #[must_use]
    pub const fn new(
        center: Point3<f64>,
        rotation: UnitQuaternion<f64>,
        shape: ProxyShape,
    ) -> Self {
        Self {
            center,
            rotation,
            shape,
        }
    }

    /// Express a world point in the shape's local frame.
    #[must_use]
    pub fn to_local(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.rotation.inverse_transform_vector(&(point - self.center))
    }

    /// Express a local offset as a world point.
    #[must_use]
    pub fn to_world(&self, local: &Vector3<f64>) -> Point3<f64> {
        self.center + self.rotation.transform_vector(local)
    }

    /// Whether `point` lies strictly inside the shape.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        self.test_point(point, 0.0).is_some()
    }

    /// Test a point against the shape.
    ///
    /// Returns `None` when the point is outside (or on the surface). On
    /// collision the returned target is the point pushed out to the surface
    /// plus `margin`:
    ///
    /// - Box: along the local axis of least penetration, ties x, then y, then z
    /// - Sphere: radially, along local +Y from the exact centre
    /// - Capsule: radially from the nearest axis point, along local +X from the axis
    ///
    /// # Example
    ///
    /// ```
    /// use motion_avoid::VolumePose;
    /// use motion_types::ProxyShape;
    /// use nalgebra::{Point3, UnitQuaternion, Vector3};
    ///
    /// let pose = VolumePose::new(
    ///     Point3::new(0.0, 100.0, 0.0),
    ///     UnitQuaternion::identity(),
    ///     ProxyShape::cuboid(Vector3::new(10.0, 10.0, 10.0)),
    /// );
    /// let hit = pose.test_point(&Point3::new(0.0, 100.0, 5.0), 0.0).unwrap();
    /// assert_eq!(hit.target, Point3::new(0.0, 100.0, 10.0));
    /// assert!(pose.test_point(&Point3::new(0.0, 100.0, 10.0), 0.0).is_none());
    /// ```
    #[must_use]
    pub fn test_point(&self, point: &Point3<f64>, margin: f64) -> Option<Collision> {
        let local = self.to_local(point);
        let (pushed, depth) = match self.shape {
            ProxyShape::Box { half_extents } => push_out_of_box(&local, &half_extents, margin)?,
            ProxyShape::Sphere { radius } => {
                push_radially(&local, &Vector3::zeros(), radius, &Vector3::y(), margin)?
            }
            ProxyShape::Capsule {
                radius,
                half_height,
            } => {
                let axis_point = Vector3::new(0.0, local.y.clamp(-half_height, half_height), 0.0);
                push_radially(&local, &axis_point, radius, &Vector3::x(), margin)?
            }
        };
        Some(Collision {
            target: self.to_world(&pushed),
            depth,
        })
    }
}

fn push_out_of_box(
    local: &Vector3<f64>,
    half_extents: &Vector3<f64>,
    margin: f64,
) -> Option<(Vector3<f64>, f64)> {
    let mut axis = 0;
    let mut depth = f64::INFINITY;
    for i in 0..3 {
        let penetration = half_extents[i] - local[i].abs();
        if penetration <= 0.0 {
            return None;
        }
        if penetration < depth {
            depth = penetration;
            axis = i;
        }
    }

    let mut pushed = *local;
    let face = half_extents[axis] + margin;
    pushed[axis] = if local[axis] < 0.0 { -face } else { face };
    Some((pushed, depth))
}

fn push_radially(
    local: &Vector3<f64>,
    from: &Vector3<f64>,
    radius: f64,
    fallback: &Vector3<f64>,
    margin: f64,
) -> Option<(Vector3<f64>, f64)> {
    let offset = local - from;
    let distance = offset.norm();
    if distance >= radius {
        return None;
    }
    let direction = if distance < DEGENERATE_LENGTH {
        *fallback
    } else {
        offset / distance
    };
    Some((from + direction * (radius + margin), radius - distance))
}

/// A collision proxy tracked against its owning bone's motion.
#[derive(Debug, Clone, PartialEq)]
pub struct AvoidanceVolume {
    /// Volume name (the proxy name).
    pub name: String,
    /// The proxy, at rest.
    pub proxy: RigidBodyProxy,
    /// Root-to-owner chain driving the volume.
    pub tracking: BoneChain,
    owner_rest: Point3<f64>,
}

impl AvoidanceVolume {
    /// Bind a proxy to the chain from its owning bone to the hierarchy root.
    pub fn track(skeleton: &Skeleton, proxy: &RigidBodyProxy) -> Result<Self> {
        let owner = proxy.bone.ok_or_else(|| {
            AvoidError::unsizable(format!("proxy {} has no owning bone", proxy.name))
        })?;
        let owner_rest = skeleton
            .bone(owner)
            .map(|b| b.position)
            .ok_or_else(|| {
                AvoidError::unsizable(format!("proxy {} is owned by unknown {owner}", proxy.name))
            })?;
        let tracking = skeleton.chain_to_root_from(owner)?;
        Ok(Self {
            name: proxy.name.clone(),
            proxy: proxy.clone(),
            tracking,
            owner_rest,
        })
    }

    /// World pose of the volume at `frame`.
    ///
    /// The proxy keeps its rest offset from the owning bone:
    /// centre = M_owner · (proxy rest position − owner rest position),
    /// orientation = R_owner · proxy rest rotation.
    pub fn pose_at(
        &self,
        skeleton: &Skeleton,
        motion: &MotionStore,
        frame: u32,
    ) -> Result<VolumePose> {
        let chain = forward_kinematics(skeleton, &self.tracking, motion, frame)?;
        let owner = chain.effector().ok_or(KinematicsError::EmptyChain)?;
        let offset = self.proxy.position - self.owner_rest;
        Ok(VolumePose::new(
            owner.transform * Point3::from(offset),
            owner.transform.rotation * self.proxy.rotation,
            self.proxy.shape,
        ))
    }
}
