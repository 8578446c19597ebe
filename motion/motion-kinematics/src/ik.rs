//! IK sub-chains and the solver interface.
//!
//! An [`IkChain`] names the bones an IK solve may rotate. Its first link is
//! the effector: the bone whose world position should reach the target. The
//! effector's own rotation is never written by a solver; only the links after
//! it (walking toward the root) are.

use motion_types::{BoneChain, BoneId, MotionStore, Skeleton};
use nalgebra::Point3;

use crate::error::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One bone of an IK sub-chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IkLink {
    /// Bone id.
    pub bone: BoneId,
    /// Bone name (motion store key).
    pub name: String,
    /// Minimum magnitude of the quaternion dot product between this bone's
    /// rotation before and after a correction. `0.0` disables the check.
    pub similarity_limit: f64,
}

impl IkLink {
    /// Create a link with no similarity limit.
    #[must_use]
    pub fn new(bone: BoneId, name: impl Into<String>) -> Self {
        Self {
            bone,
            name: name.into(),
            similarity_limit: 0.0,
        }
    }

    /// Set the rotation-similarity limit.
    #[must_use]
    pub fn with_similarity_limit(mut self, limit: f64) -> Self {
        self.similarity_limit = limit;
        self
    }
}

/// Bones an IK solve may move, effector first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IkChain {
    links: Vec<IkLink>,
}

impl IkChain {
    /// Start a chain at its effector.
    #[must_use]
    pub fn new(effector: IkLink) -> Self {
        Self {
            links: vec![effector],
        }
    }

    /// Append the next joint toward the root.
    #[must_use]
    pub fn with_link(mut self, link: IkLink) -> Self {
        self.links.push(link);
        self
    }

    /// All links, effector first.
    #[must_use]
    pub fn links(&self) -> &[IkLink] {
        &self.links
    }

    /// The effector link.
    #[must_use]
    pub fn effector(&self) -> &IkLink {
        &self.links[0]
    }

    /// Links a solver may rotate (everything after the effector).
    #[must_use]
    pub fn joints(&self) -> &[IkLink] {
        &self.links[1..]
    }

    /// Names of all links, effector first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.name.as_str())
    }
}

/// A bounded iterative IK solver.
///
/// Implementations rotate the [`IkChain::joints`] of `ik` in place on
/// `motion` at `frame`, writing explicit keys, so that the world position of
/// the effector (evaluated along `chain`) moves toward `target`. A solver
/// never writes the effector's rotation and performs at most
/// `max_iterations` sweeps.
pub trait IkSolver {
    /// Run the solve.
    #[allow(clippy::too_many_arguments)]
    fn solve(
        &self,
        skeleton: &Skeleton,
        chain: &BoneChain,
        motion: &mut MotionStore,
        frame: u32,
        target: &Point3<f64>,
        ik: &IkChain,
        max_iterations: usize,
    ) -> Result<()>;
}

impl<S: IkSolver + ?Sized> IkSolver for &S {
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
        (**self).solve(skeleton, chain, motion, frame, target, ik, max_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_layout() {
        let ik = IkChain::new(IkLink::new(BoneId(3), "wrist.L"))
            .with_link(IkLink::new(BoneId(2), "elbow.L").with_similarity_limit(0.75))
            .with_link(IkLink::new(BoneId(1), "upper_arm.L").with_similarity_limit(0.75));

        assert_eq!(ik.effector().name, "wrist.L");
        assert_eq!(ik.joints().len(), 2);
        assert_eq!(
            ik.names().collect::<Vec<_>>(),
            ["wrist.L", "elbow.L", "upper_arm.L"]
        );
        assert!(ik.effector().similarity_limit.abs() < f64::EPSILON);
        assert!((ik.joints()[0].similarity_limit - 0.75).abs() < f64::EPSILON);
    }
}
