//! Datasets and target selection.

use motion_types::{MotionStore, Skeleton};

use crate::params::AvoidanceParams;

/// A motion retargeted from one skeleton onto another.
///
/// Avoidance reads the destination skeleton and rewrites `motion` in place.
#[derive(Debug, Clone)]
pub struct DataSet {
    /// Skeleton the motion was authored for.
    pub source: Skeleton,
    /// Skeleton the motion is played on.
    pub destination: Skeleton,
    /// Keyframes, addressed by destination bone names.
    pub motion: MotionStore,
}

impl DataSet {
    /// Create a dataset.
    #[must_use]
    pub fn new(source: Skeleton, destination: Skeleton, motion: MotionStore) -> Self {
        Self {
            source,
            destination,
            motion,
        }
    }

    /// Whether avoidance should run on this dataset.
    ///
    /// The motion must carry at least one key, and both skeletons must be
    /// able to size arms unless the check is skipped.
    #[must_use]
    pub fn is_eligible(&self, params: &AvoidanceParams) -> bool {
        !self.motion.is_empty()
            && (params.skip_arm_check
                || (self.source.can_arm_sizing() && self.destination.can_arm_sizing()))
    }
}

/// Indices of the datasets avoidance should run on, in dataset order.
#[must_use]
pub fn select_targets(datasets: &[DataSet], params: &AvoidanceParams) -> Vec<usize> {
    datasets
        .iter()
        .enumerate()
        .filter(|(_, d)| d.is_eligible(params))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_types::BoneFrame;

    fn skeleton(sizable: bool) -> Skeleton {
        let mut s = Skeleton::new("model");
        s.set_arm_sizing(sizable);
        s
    }

    fn keyed() -> MotionStore {
        let mut motion = MotionStore::new();
        motion.register("wrist.L", 0, BoneFrame::identity());
        motion
    }

    #[test]
    fn test_select_targets() {
        let datasets = vec![
            DataSet::new(skeleton(true), skeleton(true), keyed()),
            DataSet::new(skeleton(true), skeleton(true), MotionStore::new()),
            DataSet::new(skeleton(false), skeleton(true), keyed()),
            DataSet::new(skeleton(true), skeleton(false), keyed()),
            DataSet::new(skeleton(true), skeleton(true), keyed()),
        ];

        let params = AvoidanceParams::default();
        assert_eq!(select_targets(&datasets, &params), vec![0, 4]);

        let skip = AvoidanceParams::default().with_skip_arm_check(true);
        assert_eq!(select_targets(&datasets, &skip), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_no_datasets() {
        assert!(select_targets(&[], &AvoidanceParams::default()).is_empty());
    }
}
