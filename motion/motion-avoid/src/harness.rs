//! Task planning and execution.
//!
//! One task is planned per (eligible dataset, side): datasets in order, left
//! arm before right. Tasks run one at a time on the caller's thread. Later
//! frames of a side depend on keys written at earlier frames, and both sides
//! write into the same motion, so nothing here runs in parallel.
//!
//! A task's error never stops the run. It is logged, recorded in the
//! [`AvoidanceSummary`], and the next task starts.

use motion_kinematics::{CcdSolver, IkSolver};
use motion_types::Side;
use tracing::{error, info, warn};

use crate::config::AvoidanceConfig;
use crate::error::Result;
use crate::observer::{AvoidanceObserver, NoopObserver};
use crate::params::AvoidanceParams;
use crate::report::{AvoidanceSummary, TaskOutcome, TaskReport};
use crate::scheduler::for_each_key_frame;
use crate::select::{DataSet, select_targets};
use crate::solver::FrameSolver;

/// One unit of work: one side of one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvoidanceTask {
    /// Dataset index.
    pub dataset: usize,
    /// Arm side.
    pub side: Side,
}

/// Plan the tasks for `datasets`: eligible datasets in order, left then right.
#[must_use]
pub fn plan_tasks(datasets: &[DataSet], params: &AvoidanceParams) -> Vec<AvoidanceTask> {
    select_targets(datasets, params)
        .into_iter()
        .flat_map(|dataset| Side::ALL.map(|side| AvoidanceTask { dataset, side }))
        .collect()
}

/// Arm collision avoidance over a batch of datasets.
///
/// # Example
///
/// ```
/// use motion_avoid::{ArmAvoidance, AvoidanceParams, DataSet};
///
/// let avoidance = ArmAvoidance::new(AvoidanceParams::with_targets(["chest"])).unwrap();
/// let mut datasets: Vec<DataSet> = Vec::new();
///
/// // Nothing eligible is not a failure.
/// assert!(avoidance.execute(&mut datasets));
/// ```
#[derive(Debug, Clone)]
pub struct ArmAvoidance<S = CcdSolver> {
    params: AvoidanceParams,
    solver: S,
}

impl ArmAvoidance<CcdSolver> {
    /// Create with the default CCD solver, validating `params`.
    pub fn new(params: AvoidanceParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            solver: CcdSolver::default(),
        })
    }
}

impl<S: IkSolver> ArmAvoidance<S> {
    /// Replace the IK solver.
    #[must_use]
    pub fn with_solver<T: IkSolver>(self, solver: T) -> ArmAvoidance<T> {
        ArmAvoidance {
            params: self.params,
            solver,
        }
    }

    /// The parameters in use.
    #[must_use]
    pub const fn params(&self) -> &AvoidanceParams {
        &self.params
    }

    /// Run every planned task. Returns whether all of them succeeded.
    pub fn execute(&self, datasets: &mut [DataSet]) -> bool {
        self.run(datasets).succeeded()
    }

    /// Run every planned task and report per-task results.
    pub fn run(&self, datasets: &mut [DataSet]) -> AvoidanceSummary {
        self.run_with_observer(datasets, &mut NoopObserver)
    }

    /// Run every planned task, forwarding solver events to `observer`.
    pub fn run_with_observer<O: AvoidanceObserver + ?Sized>(
        &self,
        datasets: &mut [DataSet],
        observer: &mut O,
    ) -> AvoidanceSummary {
        let tasks = plan_tasks(datasets, &self.params);
        let mut summary = AvoidanceSummary::default();
        if tasks.is_empty() {
            warn!(datasets = datasets.len(), "No eligible datasets, arm avoidance skipped");
            return summary;
        }

        for task in tasks {
            let Some(dataset) = datasets.get_mut(task.dataset) else {
                continue;
            };
            let result = self.execute_task(dataset, task.dataset, task.side, &mut *observer);
            match &result {
                Ok(report) => info!("{report}"),
                Err(err) if err.is_unsizable() => error!(
                    dataset = task.dataset,
                    side = %task.side,
                    error = %err,
                    "Arm avoidance skipped: data cannot be sized"
                ),
                Err(err) => error!(
                    dataset = task.dataset,
                    side = %task.side,
                    error = ?err,
                    "Arm avoidance failed"
                ),
            }
            summary.tasks.push(TaskOutcome {
                dataset: task.dataset,
                side: task.side,
                result,
            });
        }

        info!("{summary}");
        summary
    }

    /// Run avoidance for one side of one dataset.
    pub fn execute_task<O: AvoidanceObserver + ?Sized>(
        &self,
        dataset: &mut DataSet,
        index: usize,
        side: Side,
        observer: &mut O,
    ) -> Result<TaskReport> {
        let DataSet {
            destination,
            motion,
            ..
        } = dataset;

        let config = AvoidanceConfig::build(destination, side, &self.params)?;
        let frames = FrameSolver::new(destination, &config, &self.params, &self.solver);

        info!(dataset = index, %side, "Arm avoidance started");
        let mut report = TaskReport::new(index, side);
        for_each_key_frame(
            motion,
            config.watched_bones(),
            self.params.progress_interval,
            |motion, frame| {
                let frame_report = frames.solve_frame(motion, frame, &mut *observer)?;
                report.absorb(&frame_report);
                Ok(())
            },
        )?;

        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use motion_types::{MotionStore, Skeleton};

    fn dataset(sizable: bool, keyed: bool) -> DataSet {
        let mut skeleton = Skeleton::new("model");
        skeleton.set_arm_sizing(sizable);
        let mut motion = MotionStore::new();
        if keyed {
            motion.register("wrist.L", 0, motion_types::BoneFrame::identity());
        }
        DataSet::new(skeleton.clone(), skeleton, motion)
    }

    #[test]
    fn test_plan_left_then_right() {
        let datasets = vec![
            dataset(true, true),
            dataset(false, true),
            dataset(true, false),
            dataset(true, true),
        ];
        let tasks = plan_tasks(&datasets, &AvoidanceParams::default());
        let order: Vec<_> = tasks.iter().map(|t| (t.dataset, t.side)).collect();
        assert_eq!(
            order,
            [
                (0, Side::Left),
                (0, Side::Right),
                (3, Side::Left),
                (3, Side::Right),
            ]
        );
    }

    #[test]
    fn test_invalid_params_rejected() {
        let err = ArmAvoidance::new(AvoidanceParams::default().with_ik_iterations(0)).unwrap_err();
        assert!(matches!(err, crate::AvoidError::InvalidParams { .. }));
    }

    #[test]
    fn test_unsizable_tasks_do_not_stop_the_run() {
        // Eligible, but the skeleton has no arm bones at all.
        let mut datasets = vec![dataset(true, true), dataset(true, true)];
        let avoidance = ArmAvoidance::new(AvoidanceParams::default()).unwrap();

        let summary = avoidance.run(&mut datasets);
        assert_eq!(summary.tasks.len(), 4);
        assert!(summary.tasks.iter().all(|t| t.result.as_ref().unwrap_err().is_unsizable()));
        assert!(!summary.succeeded());
    }

    #[test]
    fn test_nothing_eligible_succeeds() {
        let mut datasets = vec![dataset(false, true), dataset(true, false)];
        let avoidance = ArmAvoidance::new(AvoidanceParams::default()).unwrap();
        let summary = avoidance.run(&mut datasets);
        assert!(summary.tasks.is_empty());
        assert!(summary.succeeded());
    }
}
