//! Parameters for arm avoidance.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{AvoidError, Result};

/// Parameters for arm avoidance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AvoidanceParams {
    /// Substrings matched against proxy names to pick avoidance volumes.
    /// Empty entries are ignored.
    pub avoidance_targets: Vec<String>,

    /// Whether the destination skeleton's head proxy is avoided. Default: false
    pub avoid_head: bool,

    /// Process datasets even when a skeleton cannot size arms. Default: false
    pub skip_arm_check: bool,

    /// Largest accepted per-axis distance between the pushed target and the
    /// effector after IK. Default: 2.0
    pub position_tolerance: f64,

    /// Smallest accepted |dot| between a bone's rotation before and after
    /// IK. Default: 0.75
    pub similarity_limit: f64,

    /// IK sweeps per attempt. Default: 3
    pub ik_iterations: usize,

    /// Frames between progress log lines. Default: 500
    pub progress_interval: u32,

    /// Extra distance beyond the volume surface when pushing an effector
    /// out. Default: 0.0
    pub push_margin: f64,
}

impl Default for AvoidanceParams {
    fn default() -> Self {
        Self {
            avoidance_targets: Vec::new(),
            avoid_head: false,
            skip_arm_check: false,
            position_tolerance: 2.0,
            similarity_limit: 0.75,
            ik_iterations: 3,
            progress_interval: 500,
            push_margin: 0.0,
        }
    }
}

impl AvoidanceParams {
    /// Create params avoiding proxies whose names contain any of `targets`.
    #[must_use]
    pub fn with_targets<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            avoidance_targets: targets.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Tighter acceptance: lands closer, rotates less.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            position_tolerance: 1.0,
            similarity_limit: 0.9,
            ..Default::default()
        }
    }

    /// Looser acceptance with a larger IK budget.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            position_tolerance: 4.0,
            similarity_limit: 0.5,
            ik_iterations: 6,
            ..Default::default()
        }
    }

    /// Add a proxy-name substring.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.avoidance_targets.push(target.into());
        self
    }

    /// Set head avoidance.
    #[must_use]
    pub fn with_avoid_head(mut self, avoid: bool) -> Self {
        self.avoid_head = avoid;
        self
    }

    /// Set whether the arm-sizing check is bypassed.
    #[must_use]
    pub fn with_skip_arm_check(mut self, skip: bool) -> Self {
        self.skip_arm_check = skip;
        self
    }

    /// Set the per-axis position tolerance.
    #[must_use]
    pub fn with_position_tolerance(mut self, tolerance: f64) -> Self {
        self.position_tolerance = tolerance;
        self
    }

    /// Set the rotation-similarity limit.
    #[must_use]
    pub fn with_similarity_limit(mut self, limit: f64) -> Self {
        self.similarity_limit = limit;
        self
    }

    /// Set the IK sweep budget.
    #[must_use]
    pub fn with_ik_iterations(mut self, iterations: usize) -> Self {
        self.ik_iterations = iterations;
        self
    }

    /// Set the progress log interval.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u32) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the push margin.
    #[must_use]
    pub fn with_push_margin(mut self, margin: f64) -> Self {
        self.push_margin = margin;
        self
    }

    /// Proxy-name substrings that can actually match (non-empty).
    pub fn active_targets(&self) -> impl Iterator<Item = &str> {
        self.avoidance_targets
            .iter()
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.position_tolerance.is_finite() || self.position_tolerance < 0.0 {
            return Err(AvoidError::invalid_params(format!(
                "position_tolerance must be finite and non-negative, got {}",
                self.position_tolerance
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_limit) {
            return Err(AvoidError::invalid_params(format!(
                "similarity_limit must be within [0, 1], got {}",
                self.similarity_limit
            )));
        }
        if self.ik_iterations == 0 {
            return Err(AvoidError::invalid_params(
                "ik_iterations must be at least 1",
            ));
        }
        if self.progress_interval == 0 {
            return Err(AvoidError::invalid_params(
                "progress_interval must be at least 1",
            ));
        }
        if !self.push_margin.is_finite() || self.push_margin < 0.0 {
            return Err(AvoidError::invalid_params(format!(
                "push_margin must be finite and non-negative, got {}",
                self.push_margin
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = AvoidanceParams::default();
        assert!(params.avoidance_targets.is_empty());
        assert!(!params.avoid_head);
        assert!((params.position_tolerance - 2.0).abs() < 1e-12);
        assert!((params.similarity_limit - 0.75).abs() < 1e-12);
        assert_eq!(params.ik_iterations, 3);
        assert_eq!(params.progress_interval, 500);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(AvoidanceParams::strict().validate().is_ok());
        assert!(AvoidanceParams::permissive().validate().is_ok());
        assert!(
            AvoidanceParams::strict().similarity_limit
                > AvoidanceParams::permissive().similarity_limit
        );
    }

    #[test]
    fn test_builder() {
        let params = AvoidanceParams::with_targets(["chest", ""])
            .with_target("belly")
            .with_avoid_head(true)
            .with_push_margin(0.5);

        assert_eq!(params.avoidance_targets.len(), 3);
        assert_eq!(params.active_targets().collect::<Vec<_>>(), ["chest", "belly"]);
        assert!(params.avoid_head);
        assert!((params.push_margin - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let bad = [
            AvoidanceParams::default().with_position_tolerance(-1.0),
            AvoidanceParams::default().with_position_tolerance(f64::INFINITY),
            AvoidanceParams::default().with_similarity_limit(1.5),
            AvoidanceParams::default().with_similarity_limit(f64::NAN),
            AvoidanceParams::default().with_ik_iterations(0),
            AvoidanceParams::default().with_progress_interval(0),
            AvoidanceParams::default().with_push_margin(-0.1),
        ];
        for params in &bad {
            let err = params.validate().unwrap_err();
            assert!(matches!(err, AvoidError::InvalidParams { .. }), "{params:?}");
        }
    }
}
