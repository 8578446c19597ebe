//! Keyframe-level arm collision avoidance.
//!
//! Keeps a character's elbows and wrists out of collision volumes attached to
//! its body (chest, belly, head, ...) by correcting arm rotations with bounded
//! IK, one keyframe at a time.
//!
//! # Pipeline
//!
//! 1. [`select_targets`] - Pick datasets with keys whose skeletons can size arms
//! 2. [`AvoidanceConfig::build`] - Resolve volumes and arm chains for one side
//! 3. [`for_each_key_frame`] - Visit keyed arm frames in order, re-querying
//!    after each one
//! 4. [`FrameSolver::solve_frame`] - Test, push out, accept or roll back,
//!    then key every writable arm bone
//!
//! [`ArmAvoidance`] runs all of it over a batch of datasets, left arm then
//! right arm for each, one task at a time.
//!
//! # Acceptance
//!
//! An IK correction is kept only when it lands within
//! [`AvoidanceParams::position_tolerance`] of the pushed target on every axis
//! *and* no bone rotated further than [`AvoidanceParams::similarity_limit`]
//! allows (see [`rotation_similarity`]). Otherwise the joints are restored
//! and the pair is reported as [`ChainOutcome::Failed`]. Failures never
//! abort a frame or a task.
//!
//! # Example
//!
//! ```
//! use motion_avoid::{ArmAvoidance, AvoidanceParams, DataSet};
//! use motion_types::{BoneFrame, MotionStore, ProxyShape, RigidBodyProxy, Skeleton};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut skeleton = Skeleton::new("model");
//! skeleton.add_bone("root", Point3::origin(), None).unwrap();
//! for (side, x) in [("L", -1.0), ("R", 1.0)] {
//!     let upper = format!("upper_arm.{side}");
//!     let elbow = format!("elbow.{side}");
//!     skeleton
//!         .add_bone(upper.as_str(), Point3::new(30.0 * x, 100.0, 0.0), Some("root"))
//!         .unwrap();
//!     skeleton
//!         .add_bone(elbow.as_str(), Point3::new(15.0 * x, 100.0, 7.5), Some(upper.as_str()))
//!         .unwrap();
//!     skeleton
//!         .add_bone(format!("wrist.{side}"), Point3::new(0.0, 100.0, 5.0), Some(elbow.as_str()))
//!         .unwrap();
//! }
//! let root = skeleton.id_of("root");
//! skeleton
//!     .add_proxy(RigidBodyProxy::new(
//!         "chest",
//!         root,
//!         ProxyShape::cuboid(Vector3::new(10.0, 10.0, 10.0)),
//!         Point3::new(0.0, 100.0, 0.0),
//!     ))
//!     .unwrap();
//! skeleton.set_arm_sizing(true);
//!
//! let mut motion = MotionStore::new();
//! motion.register("wrist.L", 10, BoneFrame::identity());
//!
//! let mut datasets = vec![DataSet::new(skeleton.clone(), skeleton, motion)];
//! let avoidance = ArmAvoidance::new(AvoidanceParams::with_targets(["chest"])).unwrap();
//! let summary = avoidance.run(&mut datasets);
//!
//! assert!(summary.succeeded());
//! assert_eq!(summary.total_collisions(), 1);
//! assert_eq!(summary.total_failures(), 0);
//! assert!(datasets[0].motion.has_key("elbow.L", 10));
//! ```
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization for [`AvoidanceParams`] and the
//!   underlying motion types

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod config;
mod error;
mod harness;
mod observer;
mod params;
mod report;
mod scheduler;
mod select;
mod solver;
mod volume;

pub use config::{ArmChain, AvoidanceConfig, ChainLevel, IkVariant};
pub use error::{AvoidError, Result};
pub use harness::{ArmAvoidance, AvoidanceTask, plan_tasks};
pub use observer::{AvoidanceObserver, MarkerRecorder, NoopObserver};
pub use params::AvoidanceParams;
pub use report::{AvoidanceSummary, ChainOutcome, FrameReport, PairOutcome, TaskOutcome, TaskReport};
pub use scheduler::for_each_key_frame;
pub use select::{DataSet, select_targets};
pub use solver::{FrameSolver, rotation_similarity};
pub use volume::{AvoidanceVolume, Collision, VolumePose};
