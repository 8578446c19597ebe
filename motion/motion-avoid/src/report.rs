//! Per-frame, per-task and per-run reports.

use motion_types::Side;

use crate::error::AvoidError;

/// What happened to one arm chain against one volume at one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// The effector was outside the volume.
    Clear,
    /// The effector was inside and IK attempt `attempt` (0-based) was accepted.
    Avoided {
        /// Index of the accepted IK variant.
        attempt: usize,
    },
    /// The effector was inside and every IK attempt was rejected.
    Failed {
        /// Number of attempts made.
        attempts: usize,
    },
}

impl ChainOutcome {
    /// Whether the effector was inside the volume.
    #[must_use]
    pub const fn is_collision(&self) -> bool {
        !matches!(self, Self::Clear)
    }

    /// Whether avoidance gave up.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcome for one (volume, arm chain) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    /// Volume name.
    pub volume: String,
    /// Effector bone name.
    pub effector: String,
    /// Outcome.
    pub outcome: ChainOutcome,
}

/// Outcomes for every (volume, arm chain) pair at one frame, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame index.
    pub frame: u32,
    /// Pair outcomes, volume-major.
    pub outcomes: Vec<PairOutcome>,
}

impl FrameReport {
    /// Create an empty report.
    #[must_use]
    pub const fn new(frame: u32) -> Self {
        Self {
            frame,
            outcomes: Vec::new(),
        }
    }

    /// Record a pair outcome.
    pub fn push(&mut self, volume: &str, effector: &str, outcome: ChainOutcome) {
        self.outcomes.push(PairOutcome {
            volume: volume.to_string(),
            effector: effector.to_string(),
            outcome,
        });
    }

    /// Outcome for a pair, if it was processed.
    #[must_use]
    pub fn outcome(&self, volume: &str, effector: &str) -> Option<ChainOutcome> {
        self.outcomes
            .iter()
            .find(|p| p.volume == volume && p.effector == effector)
            .map(|p| p.outcome)
    }

    /// Number of pairs whose effector was inside the volume.
    #[must_use]
    pub fn collisions(&self) -> usize {
        self.outcomes.iter().filter(|p| p.outcome.is_collision()).count()
    }

    /// Number of pairs avoidance gave up on.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|p| p.outcome.is_failure()).count()
    }
}

/// Totals for one (dataset, side) task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    /// Dataset index.
    pub dataset: usize,
    /// Arm side.
    pub side: Side,
    /// Frames visited.
    pub frames_processed: usize,
    /// Colliding (volume, chain) pairs over all frames.
    pub collisions: usize,
    /// Failed (volume, chain) pairs over all frames.
    pub failures: usize,
}

impl TaskReport {
    /// Create an empty report.
    #[must_use]
    pub const fn new(dataset: usize, side: Side) -> Self {
        Self {
            dataset,
            side,
            frames_processed: 0,
            collisions: 0,
            failures: 0,
        }
    }

    /// Fold in one frame.
    pub fn absorb(&mut self, frame: &FrameReport) {
        self.frames_processed += 1;
        self.collisions += frame.collisions();
        self.failures += frame.failures();
    }

    /// Number of collisions that were avoided.
    #[must_use]
    pub const fn avoided(&self) -> usize {
        self.collisions.saturating_sub(self.failures)
    }
}

impl std::fmt::Display for TaskReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dataset {} ({} arm): {} frames, {} collisions, {} avoided, {} failed",
            self.dataset,
            self.side,
            self.frames_processed,
            self.collisions,
            self.avoided(),
            self.failures
        )
    }
}

/// Result of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    /// Dataset index.
    pub dataset: usize,
    /// Arm side.
    pub side: Side,
    /// Report on success, the error that stopped the task otherwise.
    pub result: Result<TaskReport, AvoidError>,
}

/// Results of every task in submission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvoidanceSummary {
    /// Task results.
    pub tasks: Vec<TaskOutcome>,
}

impl AvoidanceSummary {
    /// Whether every task succeeded. True when no task ran.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.tasks.iter().all(|t| t.result.is_ok())
    }

    /// Tasks that failed.
    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.tasks.iter().filter(|t| t.result.is_err())
    }

    /// Total colliding pairs over all successful tasks.
    #[must_use]
    pub fn total_collisions(&self) -> usize {
        self.reports().map(|r| r.collisions).sum()
    }

    /// Total failed pairs over all successful tasks.
    #[must_use]
    pub fn total_failures(&self) -> usize {
        self.reports().map(|r| r.failures).sum()
    }

    fn reports(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter_map(|t| t.result.as_ref().ok())
    }
}

impl std::fmt::Display for AvoidanceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let failed = self.failed_tasks().count();
        write!(
            f,
            "Arm avoidance: {} tasks ({} failed), {} collisions, {} unresolved",
            self.tasks.len(),
            failed,
            self.total_collisions(),
            self.total_failures()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_report_counts() {
        let mut frame = FrameReport::new(10);
        frame.push("chest", "elbow.L", ChainOutcome::Clear);
        frame.push("chest", "wrist.L", ChainOutcome::Avoided { attempt: 0 });
        frame.push("belly", "wrist.L", ChainOutcome::Failed { attempts: 1 });

        assert_eq!(frame.collisions(), 2);
        assert_eq!(frame.failures(), 1);
        assert_eq!(
            frame.outcome("chest", "wrist.L"),
            Some(ChainOutcome::Avoided { attempt: 0 })
        );
        assert_eq!(frame.outcome("head", "wrist.L"), None);
    }

    #[test]
    fn test_task_report_display() {
        let mut frame = FrameReport::new(0);
        frame.push("chest", "wrist.L", ChainOutcome::Failed { attempts: 1 });
        frame.push("chest", "elbow.L", ChainOutcome::Avoided { attempt: 0 });

        let mut report = TaskReport::new(2, Side::Left);
        report.absorb(&frame);
        report.absorb(&FrameReport::new(1));

        assert_eq!(report.frames_processed, 2);
        assert_eq!(report.avoided(), 1);
        let display = format!("{report}");
        assert!(display.contains("Dataset 2 (left arm)"));
        assert!(display.contains("2 collisions"));
    }

    #[test]
    fn test_summary_is_logical_and() {
        let mut summary = AvoidanceSummary::default();
        assert!(summary.succeeded());

        summary.tasks.push(TaskOutcome {
            dataset: 0,
            side: Side::Left,
            result: Ok(TaskReport::new(0, Side::Left)),
        });
        assert!(summary.succeeded());

        summary.tasks.push(TaskOutcome {
            dataset: 0,
            side: Side::Right,
            result: Err(AvoidError::unsizable("right arm has no wrist.R bone")),
        });
        assert!(!summary.succeeded());
        assert_eq!(summary.failed_tasks().count(), 1);
        assert!(format!("{summary}").contains("2 tasks (1 failed)"));
    }
}
