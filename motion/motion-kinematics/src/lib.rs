//! Forward and inverse kinematics over keyframed bone chains.
//!
//! This crate provides the numerical primitives the arm-avoidance pipeline
//! consumes:
//!
//! - [`forward_kinematics`] - World transforms for every bone of a chain at a frame
//! - [`IkChain`] / [`IkLink`] - The bones an IK solve may rotate, effector first
//! - [`IkSolver`] - Bounded iterative solver interface
//! - [`CcdSolver`] - Cyclic coordinate descent implementation
//!
//! Solvers mutate a [`MotionStore`](motion_types::MotionStore) in place,
//! writing explicit keys at the solved frame. Nothing here decides whether a
//! solve was good enough; that is the caller's job.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use motion_kinematics::{CcdSolver, IkChain, IkLink, IkSolver, forward_kinematics};
//! use motion_types::{MotionStore, Skeleton};
//! use nalgebra::Point3;
//!
//! let mut skeleton = Skeleton::new("arm");
//! let upper = skeleton.add_bone("upper_arm.L", Point3::origin(), None).unwrap();
//! let elbow = skeleton
//!     .add_bone("elbow.L", Point3::new(5.0, 0.0, 0.0), Some("upper_arm.L"))
//!     .unwrap();
//! let chain = skeleton.chain_to_root("elbow.L").unwrap();
//!
//! let ik = IkChain::new(IkLink::new(elbow, "elbow.L"))
//!     .with_link(IkLink::new(upper, "upper_arm.L"));
//! let mut motion = MotionStore::new();
//! let target = Point3::new(0.0, 0.0, 5.0);
//! CcdSolver::default()
//!     .solve(&skeleton, &chain, &mut motion, 0, &target, &ik, 3)
//!     .unwrap();
//!
//! let pose = forward_kinematics(&skeleton, &chain, &motion, 0).unwrap();
//! assert!((pose.effector_position().unwrap() - target).norm() < 1e-6);
//! assert!(motion.has_key("upper_arm.L", 0));
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization for IK chains and the underlying motion types

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod ccd;
mod error;
mod fk;
mod ik;

pub use ccd::CcdSolver;
pub use error::{KinematicsError, Result};
pub use fk::{ChainPose, LinkPose, forward_kinematics};
pub use ik::{IkChain, IkLink, IkSolver};
