//! Error types for skeleton and motion operations.

use thiserror::Error;

/// Errors that can occur while building or querying skeletons and motions.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum MotionError {
    /// A bone was referenced by name but does not exist.
    #[error("bone not found: {name}")]
    BoneNotFound {
        /// Name of the missing bone.
        name: String,
    },

    /// A bone with the same name was already added.
    #[error("duplicate bone name: {0}")]
    DuplicateBone(String),

    /// A bone referenced a parent that has not been added yet.
    #[error("bone {bone} references unknown parent {parent}")]
    InvalidParent {
        /// The bone being added.
        bone: String,
        /// The parent it referenced.
        parent: String,
    },

    /// A rigid-body proxy failed validation.
    #[error("invalid proxy {name}: {reason}")]
    InvalidProxy {
        /// Name of the proxy.
        name: String,
        /// Description of what is wrong.
        reason: String,
    },
}

impl MotionError {
    /// Create a bone-not-found error.
    #[must_use]
    pub fn bone_not_found(name: impl Into<String>) -> Self {
        Self::BoneNotFound { name: name.into() }
    }

    /// Create an invalid proxy error.
    #[must_use]
    pub fn invalid_proxy(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProxy {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a missing-bone error.
    #[must_use]
    pub fn is_bone_not_found(&self) -> bool {
        matches!(self, Self::BoneNotFound { .. })
    }
}

/// Result type for skeleton and motion operations.
pub type Result<T> = std::result::Result<T, MotionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MotionError::bone_not_found("wrist.L");
        assert!(err.to_string().contains("wrist.L"));

        let err = MotionError::InvalidParent {
            bone: "elbow.L".into(),
            parent: "shoulder.L".into(),
        };
        assert!(err.to_string().contains("shoulder.L"));

        let err = MotionError::invalid_proxy("chest", "radius must be positive");
        assert!(err.to_string().contains("radius"));
    }

    #[test]
    fn test_error_predicates() {
        assert!(MotionError::bone_not_found("x").is_bone_not_found());
        assert!(!MotionError::DuplicateBone("x".into()).is_bone_not_found());
    }
}
