//! Forward kinematics along a bone chain.
//!
//! Each bone's world transform is its parent's world transform composed with
//! a local transform made of the rest offset (bone rest position minus parent
//! rest position, plus the frame's translation) and the frame's rotation:
//!
//! ```text
//! W_child = W_parent · T(offset + p_frame) · R(q_frame)
//! ```
//!
//! The first bone of the chain is placed at its own rest position, so chains
//! should start at a hierarchy root (see
//! [`Skeleton::chain_to_root`](motion_types::Skeleton::chain_to_root)).

use motion_types::{BoneChain, BoneId, MotionError, MotionStore, Skeleton};
use nalgebra::{Isometry3, Point3, Translation3};

use crate::error::{KinematicsError, Result};

/// World transform of one chain bone.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPose {
    /// Bone id.
    pub bone: BoneId,
    /// Bone name.
    pub name: String,
    /// World transform (rotation includes the bone's own local rotation).
    pub transform: Isometry3<f64>,
}

impl LinkPose {
    /// World position of the bone's joint.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        Point3::from(self.transform.translation.vector)
    }
}

/// World transforms for every bone of a chain at one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainPose {
    links: Vec<LinkPose>,
}

impl ChainPose {
    /// Link poses, root first.
    #[must_use]
    pub fn links(&self) -> &[LinkPose] {
        &self.links
    }

    /// Pose of the link at `index` in the chain.
    #[must_use]
    pub fn link(&self, index: usize) -> Option<&LinkPose> {
        self.links.get(index)
    }

    /// Pose of a bone by id.
    #[must_use]
    pub fn find(&self, bone: BoneId) -> Option<&LinkPose> {
        self.links.iter().find(|l| l.bone == bone)
    }

    /// Pose of a bone by name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&LinkPose> {
        self.links.iter().find(|l| l.name == name)
    }

    /// World position of a bone by name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<Point3<f64>> {
        self.find_by_name(name).map(LinkPose::position)
    }

    /// The chain's last link.
    #[must_use]
    pub fn effector(&self) -> Option<&LinkPose> {
        self.links.last()
    }

    /// World position of the chain's last link.
    pub fn effector_position(&self) -> Result<Point3<f64>> {
        self.effector()
            .map(LinkPose::position)
            .ok_or(KinematicsError::EmptyChain)
    }
}

/// Evaluate world transforms for every bone of `chain` at `frame`.
///
/// # Example
///
/// ```
/// use motion_kinematics::forward_kinematics;
/// use motion_types::{BoneFrame, MotionStore, Skeleton};
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
/// use std::f64::consts::FRAC_PI_2;
///
/// let mut skeleton = Skeleton::new("arm");
/// skeleton.add_bone("shoulder", Point3::origin(), None).unwrap();
/// skeleton.add_bone("hand", Point3::new(10.0, 0.0, 0.0), Some("shoulder")).unwrap();
/// let chain = skeleton.chain_to_root("hand").unwrap();
///
/// let mut motion = MotionStore::new();
/// let quarter_turn = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
/// motion.register("shoulder", 0, BoneFrame::from_rotation(quarter_turn));
///
/// let pose = forward_kinematics(&skeleton, &chain, &motion, 0).unwrap();
/// let hand = pose.effector_position().unwrap();
/// assert!((hand - Point3::new(0.0, 10.0, 0.0)).norm() < 1e-9);
/// ```
pub fn forward_kinematics(
    skeleton: &Skeleton,
    chain: &BoneChain,
    motion: &MotionStore,
    frame: u32,
) -> Result<ChainPose> {
    if chain.is_empty() {
        return Err(KinematicsError::EmptyChain);
    }

    let mut links: Vec<LinkPose> = Vec::with_capacity(chain.len());
    let mut parent_rest: Option<Point3<f64>> = None;

    for &id in chain.bones() {
        let bone = skeleton
            .bone(id)
            .ok_or_else(|| MotionError::bone_not_found(id.to_string()))?;
        let local = motion.frame_at(&bone.name, frame);

        let offset = match parent_rest {
            Some(rest) => bone.position - rest,
            None => bone.position.coords,
        };
        let local_iso =
            Isometry3::from_parts(Translation3::from(offset + local.position), local.rotation);
        let transform = match links.last() {
            Some(parent) => parent.transform * local_iso,
            None => local_iso,
        };

        links.push(LinkPose {
            bone: id,
            name: bone.name.clone(),
            transform,
        });
        parent_rest = Some(bone.position);
    }

    Ok(ChainPose { links })
}
