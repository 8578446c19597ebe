//! Per-frame collision avoidance.
//!
//! For each volume (in configuration order) and each arm chain (elbow level
//! first), the effector is tested against the volume. A colliding effector is
//! pushed to the volume surface with IK. An attempt is accepted only if
//!
//! 1. every component of `target − reached` is within `position_tolerance`,
//!    and
//! 2. every bone of the IK chain keeps `|q_before · q_after| >= limit`,
//!
//! where `q_before` is the bone's rotation in the frame's snapshot. A
//! rejected attempt restores the joints from the snapshot and the next
//! variant is tried. An accepted attempt becomes the snapshot that later
//! chains are compared against.
//!
//! The snapshot is retaken for every volume. Once all volumes are processed
//! the current rotation of every writable arm bone is written as a key at the
//! frame, whether or not avoidance succeeded.

use hashbrown::HashMap;
use motion_kinematics::{IkChain, IkLink, IkSolver};
use motion_types::{MotionStore, Skeleton};
use nalgebra::{Point3, UnitQuaternion};
use tracing::{debug, info};

use crate::config::{ArmChain, AvoidanceConfig};
use crate::error::Result;
use crate::observer::AvoidanceObserver;
use crate::params::AvoidanceParams;
use crate::report::{ChainOutcome, FrameReport};

/// Dot product of two rotations' quaternion coordinates.
///
/// Magnitude 1 means identical orientations; `q` and `-q` score `-1`.
///
/// ```
/// use motion_avoid::rotation_similarity;
/// use nalgebra::{UnitQuaternion, Vector3};
///
/// let a = UnitQuaternion::identity();
/// let b = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::FRAC_PI_2);
/// assert!((rotation_similarity(&a, &b) - std::f64::consts::FRAC_PI_4.cos()).abs() < 1e-12);
/// ```
#[must_use]
pub fn rotation_similarity(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> f64 {
    a.coords.dot(&b.coords)
}

/// Rotations of the tracked bones before this volume's corrections.
#[derive(Debug, Default)]
struct Snapshot {
    rotations: HashMap<String, UnitQuaternion<f64>>,
}

impl Snapshot {
    fn capture(bones: &[String], motion: &MotionStore, frame: u32) -> Self {
        let mut snapshot = Self::default();
        for name in bones {
            snapshot
                .rotations
                .entry(name.clone())
                .or_insert_with(|| motion.frame_at(name, frame).rotation);
        }
        snapshot
    }

    fn rotation(&self, name: &str) -> Option<UnitQuaternion<f64>> {
        self.rotations.get(name).copied()
    }

    /// Take the current rotations of `bones` as the new baseline.
    fn promote<'a>(
        &mut self,
        bones: impl IntoIterator<Item = &'a str>,
        motion: &MotionStore,
        frame: u32,
    ) {
        for name in bones {
            self.rotations
                .insert(name.to_string(), motion.frame_at(name, frame).rotation);
        }
    }

    /// Write the baseline back for `links`.
    fn restore(&self, links: &[IkLink], motion: &mut MotionStore, frame: u32) {
        for link in links {
            if let Some(rotation) = self.rotation(&link.name) {
                motion.set_rotation(&link.name, frame, rotation);
            }
        }
    }
}

/// Runs collision avoidance on single frames of one (dataset, side).
#[derive(Debug)]
pub struct FrameSolver<'a, S> {
    skeleton: &'a Skeleton,
    config: &'a AvoidanceConfig,
    params: &'a AvoidanceParams,
    solver: S,
}

impl<'a, S: IkSolver> FrameSolver<'a, S> {
    /// Create a frame solver.
    #[must_use]
    pub fn new(
        skeleton: &'a Skeleton,
        config: &'a AvoidanceConfig,
        params: &'a AvoidanceParams,
        solver: S,
    ) -> Self {
        Self {
            skeleton,
            config,
            params,
            solver,
        }
    }

    /// Process `frame`, correcting `motion` in place.
    ///
    /// Per-chain avoidance failures are reported, not returned as errors.
    /// Errors mean kinematics could not be evaluated at all.
    pub fn solve_frame<O: AvoidanceObserver + ?Sized>(
        &self,
        motion: &mut MotionStore,
        frame: u32,
        observer: &mut O,
    ) -> Result<FrameReport> {
        let mut report = FrameReport::new(frame);

        for volume in self.config.volumes() {
            let pose = volume.pose_at(self.skeleton, motion, frame)?;
            observer.volume_posed(frame, &volume.name, &pose);

            let mut snapshot = Snapshot::capture(self.config.tracked_bones(), motion, frame);

            for arm in self.config.arm_chains() {
                let effector = arm.effector_position(self.skeleton, motion, frame)?;
                let Some(collision) = pose.test_point(&effector, self.params.push_margin) else {
                    snapshot.promote(arm.writable_bones(), motion, frame);
                    report.push(&volume.name, &arm.effector, ChainOutcome::Clear);
                    continue;
                };

                info!(
                    frame,
                    volume = %volume.name,
                    effector = %arm.effector,
                    depth = collision.depth,
                    "Collision detected"
                );
                observer.effector_before(frame, &arm.effector, &effector);

                let outcome = self.avoid(
                    arm,
                    &collision.target,
                    motion,
                    frame,
                    &mut snapshot,
                    &mut *observer,
                )?;
                if outcome.is_failure() {
                    info!(
                        frame,
                        volume = %volume.name,
                        effector = %arm.effector,
                        "Collision avoidance failed"
                    );
                }
                report.push(&volume.name, &arm.effector, outcome);
            }
        }

        self.commit(motion, frame);
        Ok(report)
    }

    fn avoid<O: AvoidanceObserver + ?Sized>(
        &self,
        arm: &ArmChain,
        target: &Point3<f64>,
        motion: &mut MotionStore,
        frame: u32,
        snapshot: &mut Snapshot,
        observer: &mut O,
    ) -> Result<ChainOutcome> {
        for (attempt, variant) in arm.variants.iter().enumerate() {
            self.solver.solve(
                self.skeleton,
                &arm.fk_chain,
                motion,
                frame,
                target,
                &variant.chain,
                variant.max_iterations,
            )?;

            let reached = arm.effector_position(self.skeleton, motion, frame)?;
            observer.effector_after(frame, &arm.effector, &reached);

            let residual = target - reached;
            let within = residual
                .iter()
                .all(|c| c.abs() <= self.params.position_tolerance);
            let similar = within_similarity(&variant.chain, snapshot, motion, frame);

            debug!(
                frame,
                effector = %arm.effector,
                attempt,
                residual = ?residual.as_slice(),
                within,
                similar,
                "IK attempt"
            );

            if within && similar {
                snapshot.promote(variant.chain.names(), motion, frame);
                return Ok(ChainOutcome::Avoided { attempt });
            }
            snapshot.restore(variant.chain.joints(), motion, frame);
        }

        Ok(ChainOutcome::Failed {
            attempts: arm.variants.len(),
        })
    }

    /// Key the current rotation of every writable arm bone at `frame`.
    fn commit(&self, motion: &mut MotionStore, frame: u32) {
        for arm in self.config.arm_chains() {
            for name in arm.writable_bones() {
                let rotation = motion.frame_at(name, frame).rotation;
                motion.set_rotation(name, frame, rotation);
            }
        }
    }
}

/// Every link's rotation is still close to its snapshot.
fn within_similarity(
    chain: &IkChain,
    snapshot: &Snapshot,
    motion: &MotionStore,
    frame: u32,
) -> bool {
    chain.links().iter().all(|link| {
        let after = motion.frame_at(&link.name, frame).rotation;
        let before = snapshot.rotation(&link.name).unwrap_or(after);
        let score = rotation_similarity(&before, &after);
        if score.abs() < link.similarity_limit {
            debug!(
                frame,
                bone = %link.name,
                score,
                limit = link.similarity_limit,
                "Rotation changed too much"
            );
            return false;
        }
        true
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use approx::assert_relative_eq;
    use motion_kinematics::CcdSolver;
    use motion_types::{BoneFrame, ProxyShape, RigidBodyProxy, Side};
    use nalgebra::Vector3;

    /// Root at origin, a 10-unit box at (0, 100, 0) owned by the root, and a
    /// bent left arm whose wrist sits 5 units inside the box.
    fn scene() -> Skeleton {
        let mut s = Skeleton::new("scene");
        s.add_bone("root", Point3::origin(), None).unwrap();
        s.add_bone("upper_arm.L", Point3::new(-30.0, 100.0, 0.0), Some("root"))
            .unwrap();
        s.add_bone("elbow.L", Point3::new(-15.0, 100.0, 7.5), Some("upper_arm.L"))
            .unwrap();
        s.add_bone("wrist.L", Point3::new(0.0, 100.0, 5.0), Some("elbow.L"))
            .unwrap();
        s.add_proxy(RigidBodyProxy::new(
            "chest",
            s.id_of("root"),
            ProxyShape::cuboid(Vector3::new(10.0, 10.0, 10.0)),
            Point3::new(0.0, 100.0, 0.0),
        ))
        .unwrap();
        s
    }

    fn keyed(frame: u32) -> MotionStore {
        let mut motion = MotionStore::new();
        for bone in ["upper_arm.L", "elbow.L", "wrist.L"] {
            motion.register(bone, frame, BoneFrame::identity());
        }
        motion
    }

    #[test]
    fn test_similarity_sign_and_scale() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.4);
        let flipped = UnitQuaternion::new_unchecked(-q.into_inner());
        assert_relative_eq!(rotation_similarity(&q, &q), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rotation_similarity(&q, &flipped), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrist_pushed_out_with_ccd() {
        let s = scene();
        let params = AvoidanceParams::with_targets(["chest"]);
        let config = AvoidanceConfig::build(&s, Side::Left, &params).unwrap();
        let solver = FrameSolver::new(&s, &config, &params, CcdSolver::default());
        let mut motion = keyed(10);

        let report = solver.solve_frame(&mut motion, 10, &mut NoopObserver).unwrap();

        assert_eq!(report.outcome("chest", "elbow.L"), Some(ChainOutcome::Clear));
        assert_eq!(
            report.outcome("chest", "wrist.L"),
            Some(ChainOutcome::Avoided { attempt: 0 })
        );
        let wrist = config.arm_chains()[1]
            .effector_position(&s, &motion, 10)
            .unwrap();
        assert_relative_eq!(wrist, Point3::new(0.0, 100.0, 10.0), epsilon = 1e-6);

        let elbow = motion.key("elbow.L", 10).unwrap().rotation;
        assert!(rotation_similarity(&UnitQuaternion::identity(), &elbow).abs() > 0.98);
        assert_relative_eq!(
            motion.key("upper_arm.L", 10).unwrap().rotation.angle(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_no_volumes_only_commits() {
        let s = scene();
        let params = AvoidanceParams::default();
        let config = AvoidanceConfig::build(&s, Side::Left, &params).unwrap();
        let solver = FrameSolver::new(&s, &config, &params, CcdSolver::default());

        let mut motion = MotionStore::new();
        motion.register("wrist.L", 4, BoneFrame::identity());
        let report = solver.solve_frame(&mut motion, 4, &mut NoopObserver).unwrap();

        assert!(report.outcomes.is_empty());
        assert!(motion.has_key("upper_arm.L", 4));
        assert!(motion.has_key("elbow.L", 4));
    }

    #[test]
    fn test_snapshot_restore_only_touches_joints() {
        let mut motion = keyed(0);
        let bones: Vec<String> = ["wrist.L", "elbow.L"].iter().map(ToString::to_string).collect();
        let snapshot = Snapshot::capture(&bones, &motion, 0);

        let bent = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.0);
        motion.set_rotation("wrist.L", 0, bent);
        motion.set_rotation("elbow.L", 0, bent);

        let chain = IkChain::new(IkLink::new(motion_types::BoneId(3), "wrist.L"))
            .with_link(IkLink::new(motion_types::BoneId(2), "elbow.L"));
        snapshot.restore(chain.joints(), &mut motion, 0);

        assert_relative_eq!(motion.frame_at("elbow.L", 0).rotation.angle(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(motion.frame_at("wrist.L", 0).rotation.angle(), 1.0, epsilon = 1e-12);
    }
}
