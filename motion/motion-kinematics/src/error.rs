//! Error types for kinematics operations.

use motion_types::MotionError;
use thiserror::Error;

/// Errors that can occur during forward or inverse kinematics.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum KinematicsError {
    /// Skeleton or motion lookup failed.
    #[error(transparent)]
    Motion(#[from] MotionError),

    /// The chain has no bones.
    #[error("bone chain is empty")]
    EmptyChain,

    /// A bone referenced by an IK chain is not part of the FK chain.
    #[error("bone {bone} is not part of the chain ending at {chain_end}")]
    BoneNotInChain {
        /// The bone that was looked up.
        bone: String,
        /// Name of the chain's effector.
        chain_end: String,
    },

    /// The IK target contains `NaN` or `Inf`.
    #[error("IK target is not finite")]
    NonFiniteTarget,

    /// A joint update produced a non-finite rotation.
    #[error("IK diverged at bone {bone}")]
    Diverged {
        /// Bone whose rotation became non-finite.
        bone: String,
    },
}

impl KinematicsError {
    /// Create a bone-not-in-chain error.
    #[must_use]
    pub fn not_in_chain(bone: impl Into<String>, chain_end: impl Into<String>) -> Self {
        Self::BoneNotInChain {
            bone: bone.into(),
            chain_end: chain_end.into(),
        }
    }
}

/// Result type for kinematics operations.
pub type Result<T> = std::result::Result<T, KinematicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KinematicsError::not_in_chain("elbow.R", "wrist.L");
        assert!(err.to_string().contains("elbow.R"));
        assert!(err.to_string().contains("wrist.L"));

        let err: KinematicsError = MotionError::bone_not_found("head").into();
        assert_eq!(err.to_string(), "bone not found: head");
    }
}
