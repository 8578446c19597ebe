//! Cyclic coordinate descent IK.
//!
//! Each sweep visits the IK joints from the effector toward the root. At each
//! joint the rotation that swings the joint→effector direction onto the
//! joint→target direction is applied in world space, then converted into the
//! joint's local frame:
//!
//! ```text
//! q_local' = R_parent⁻¹ · q_swing · R_parent · q_local
//! ```
//!
//! Forward kinematics is re-evaluated after every joint update.

use motion_types::{BoneChain, MotionStore, Skeleton};
use nalgebra::{Point3, UnitQuaternion};
use tracing::debug;

use crate::error::{KinematicsError, Result};
use crate::fk::forward_kinematics;
use crate::ik::{IkChain, IkSolver};

/// Distances below this are treated as zero when building swing rotations.
const DEGENERATE_LENGTH: f64 = 1.0e-9;

/// Cyclic coordinate descent solver.
///
/// # Example
///
/// ```
/// use motion_kinematics::{CcdSolver, IkChain, IkLink, IkSolver, forward_kinematics};
/// use motion_types::{MotionStore, Skeleton};
/// use nalgebra::Point3;
///
/// let mut skeleton = Skeleton::new("arm");
/// let shoulder = skeleton.add_bone("shoulder", Point3::origin(), None).unwrap();
/// let hand = skeleton.add_bone("hand", Point3::new(10.0, 0.0, 0.0), Some("shoulder")).unwrap();
/// let chain = skeleton.chain_to_root("hand").unwrap();
/// let ik = IkChain::new(IkLink::new(hand, "hand")).with_link(IkLink::new(shoulder, "shoulder"));
///
/// let mut motion = MotionStore::new();
/// let target = Point3::new(0.0, 10.0, 0.0);
/// CcdSolver::default()
///     .solve(&skeleton, &chain, &mut motion, 0, &target, &ik, 3)
///     .unwrap();
///
/// let reached = forward_kinematics(&skeleton, &chain, &motion, 0)
///     .unwrap()
///     .effector_position()
///     .unwrap();
/// assert!((reached - target).norm() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcdSolver {
    /// Stop once the effector is closer than this to the target.
    pub convergence: f64,
}

impl Default for CcdSolver {
    fn default() -> Self {
        Self {
            convergence: 1.0e-4,
        }
    }
}

impl CcdSolver {
    /// Create a solver with a custom convergence distance.
    #[must_use]
    pub const fn with_convergence(convergence: f64) -> Self {
        Self { convergence }
    }
}

impl IkSolver for CcdSolver {
    fn solve(
        &self,
        skeleton: &Skeleton,
        chain: &BoneChain,
        motion: &mut MotionStore,
        frame: u32,
        target: &Point3<f64>,
        ik: &IkChain,
        max_iterations: usize,
    ) -> Result<()> {
        if !target.coords.iter().all(|v| v.is_finite()) {
            return Err(KinematicsError::NonFiniteTarget);
        }

        let chain_end = chain
            .effector()
            .and_then(|id| skeleton.bone(id))
            .map_or_else(String::new, |b| b.name.clone());
        let effector = ik.effector();
        if !chain.contains(effector.bone) {
            return Err(KinematicsError::not_in_chain(&effector.name, &chain_end));
        }
        let mut joint_indices = Vec::with_capacity(ik.joints().len());
        for link in ik.joints() {
            let index = chain
                .position_of(link.bone)
                .ok_or_else(|| KinematicsError::not_in_chain(&link.name, &chain_end))?;
            joint_indices.push(index);
        }

        for sweep in 0..max_iterations {
            for (link, &index) in ik.joints().iter().zip(&joint_indices) {
                let pose = forward_kinematics(skeleton, chain, motion, frame)?;
                let effector_pos = pose
                    .find(effector.bone)
                    .map(|l| l.position())
                    .ok_or_else(|| KinematicsError::not_in_chain(&effector.name, &chain_end))?;
                if (effector_pos - target).norm() < self.convergence {
                    debug!(sweep, bone = %link.name, "IK converged");
                    return Ok(());
                }

                let Some(joint) = pose.link(index) else {
                    continue;
                };
                let to_effector = effector_pos - joint.position();
                let to_target = target - joint.position();
                if to_effector.norm() < DEGENERATE_LENGTH || to_target.norm() < DEGENERATE_LENGTH
                {
                    continue;
                }
                // Opposite directions have no unique swing; the next joint handles it.
                let Some(swing) = UnitQuaternion::rotation_between(&to_effector, &to_target)
                else {
                    continue;
                };

                let parent_rotation = index
                    .checked_sub(1)
                    .and_then(|p| pose.link(p))
                    .map_or_else(UnitQuaternion::identity, |p| p.transform.rotation);
                let current = motion.frame_at(&link.name, frame).rotation;
                let updated = parent_rotation.inverse() * swing * parent_rotation * current;
                if !updated.coords.iter().all(|v| v.is_finite()) {
                    return Err(KinematicsError::Diverged {
                        bone: link.name.clone(),
                    });
                }
                motion.set_rotation(&link.name, frame, updated);
            }
        }

        Ok(())
    }
}
