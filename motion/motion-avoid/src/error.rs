//! Error types for arm avoidance.

use motion_kinematics::KinematicsError;
use motion_types::MotionError;
use thiserror::Error;

/// Errors that can occur while configuring or running arm avoidance.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AvoidError {
    /// The skeleton/motion combination cannot be processed, e.g. a required
    /// arm bone is missing.
    #[error("cannot size arm: {reason}")]
    Unsizable {
        /// What is missing or inconsistent.
        reason: String,
    },

    /// Forward or inverse kinematics failed.
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),

    /// Skeleton or motion lookup failed.
    #[error(transparent)]
    Motion(#[from] MotionError),

    /// Avoidance parameters are out of range.
    #[error("invalid avoidance parameters: {reason}")]
    InvalidParams {
        /// Description of the offending parameter.
        reason: String,
    },
}

impl AvoidError {
    /// Create an unsizable-data error.
    #[must_use]
    pub fn unsizable(reason: impl Into<String>) -> Self {
        Self::Unsizable {
            reason: reason.into(),
        }
    }

    /// Create an invalid-parameters error.
    #[must_use]
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }

    /// Check if this is the recognised "cannot be processed" condition.
    #[must_use]
    pub fn is_unsizable(&self) -> bool {
        matches!(self, Self::Unsizable { .. })
    }
}

/// Result type for arm avoidance.
pub type Result<T> = std::result::Result<T, AvoidError>;
