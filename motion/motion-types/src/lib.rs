//! Skeleton and keyframe motion types for articulated characters.
//!
//! This crate provides the data the arm-avoidance pipeline reads and writes:
//!
//! - [`Skeleton`] - Bone hierarchy with rest positions, role bindings and
//!   collision proxies
//! - [`BoneChain`] - Ordered bones from a root down to an effector
//! - [`BoneRole`] / [`Side`] - Canonical, locale-free bone addressing
//! - [`RigidBodyProxy`] - Sphere, box or capsule collision shape owned by a bone
//! - [`MotionStore`] - Keyframed local bone transforms, interpolated between keys
//!
//! # Design Philosophy
//!
//! These types are **pure data** plus the lookups needed to navigate them.
//! Forward kinematics and inverse kinematics live in `motion-kinematics`;
//! collision avoidance lives in `motion-avoid`.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Coordinate Conventions
//!
//! Bone rest positions and proxy placements are expressed in model space.
//! A [`BoneFrame`] holds a bone's local rotation relative to its parent and a
//! translation added to its rest offset.
//!
//! # Example
//!
//! ```
//! use motion_types::{BoneFrame, MotionStore, Skeleton};
//! use nalgebra::{Point3, UnitQuaternion};
//!
//! let mut skeleton = Skeleton::new("model");
//! skeleton.add_bone("root", Point3::origin(), None).unwrap();
//! skeleton.add_bone("elbow.L", Point3::new(-4.0, 10.0, 0.0), Some("root")).unwrap();
//!
//! let mut motion = MotionStore::new();
//! motion.register("elbow.L", 0, BoneFrame::from_rotation(UnitQuaternion::identity()));
//! assert!(motion.has_key("elbow.L", 0));
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization for roles, proxies, frames and motions

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod error;
mod motion;
mod proxy;
mod role;
mod skeleton;

pub use error::{MotionError, Result};
pub use motion::{BoneFrame, MotionStore};
pub use proxy::{ProxyMode, ProxyShape, RigidBodyProxy};
pub use role::{BoneRole, Side};
pub use skeleton::{Bone, BoneChain, BoneId, Skeleton};

// Re-export math types for convenience
pub use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
