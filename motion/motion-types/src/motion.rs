//! Keyframed bone motion.
//!
//! A [`MotionStore`] maps bone name to an ordered set of keyframes. Frames
//! between keys are interpolated: linear for position, slerp for rotation.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Epsilon below which slerp falls back to the earlier key.
const SLERP_EPSILON: f64 = 1.0e-9;

/// Local transform of one bone at one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneFrame {
    /// Local rotation relative to the parent bone.
    pub rotation: UnitQuaternion<f64>,
    /// Translation added to the bone's rest offset.
    pub position: Vector3<f64>,
    /// Whether this frame is an explicit key (as opposed to interpolated).
    pub key: bool,
}

impl Default for BoneFrame {
    fn default() -> Self {
        Self::identity()
    }
}

impl BoneFrame {
    /// Rest pose frame (no rotation, no translation), not a key.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            position: Vector3::zeros(),
            key: false,
        }
    }

    /// Create a frame that is not yet a key.
    #[must_use]
    pub const fn new(rotation: UnitQuaternion<f64>, position: Vector3<f64>) -> Self {
        Self {
            rotation,
            position,
            key: false,
        }
    }

    /// Create a frame with rotation only.
    #[must_use]
    pub fn from_rotation(rotation: UnitQuaternion<f64>) -> Self {
        Self::new(rotation, Vector3::zeros())
    }
}

/// Time-indexed keyframes for every animated bone.
///
/// # Example
///
/// ```
/// use motion_types::{BoneFrame, MotionStore};
/// use nalgebra::{UnitQuaternion, Vector3};
///
/// let mut motion = MotionStore::new();
/// motion.register("elbow.L", 0, BoneFrame::identity());
/// motion.register(
///     "elbow.L",
///     10,
///     BoneFrame::from_rotation(UnitQuaternion::from_euler_angles(0.0, 0.0, 1.0)),
/// );
///
/// let mid = motion.frame_at("elbow.L", 5);
/// assert!(!mid.key);
/// assert!((mid.rotation.angle() - 0.5).abs() < 1e-9);
/// assert_eq!(motion.key_frame_indices(&["elbow.L"], 1), vec![10]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionStore {
    bones: BTreeMap<String, BTreeMap<u32, BoneFrame>>,
}

impl MotionStore {
    /// Create an empty motion.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an explicit key, overwriting any value at `frame`.
    pub fn register(&mut self, bone: &str, frame: u32, mut value: BoneFrame) {
        value.key = true;
        self.bones
            .entry(bone.to_string())
            .or_default()
            .insert(frame, value);
    }

    /// Write an explicit key carrying `rotation` and the current position at `frame`.
    pub fn set_rotation(&mut self, bone: &str, frame: u32, rotation: UnitQuaternion<f64>) {
        let mut value = self.frame_at(bone, frame);
        value.rotation = rotation;
        self.register(bone, frame, value);
    }

    /// Remove the key at `frame`, returning it.
    pub fn remove_key(&mut self, bone: &str, frame: u32) -> Option<BoneFrame> {
        self.bones.get_mut(bone).and_then(|keys| keys.remove(&frame))
    }

    /// The explicit key at `frame`, if any.
    #[must_use]
    pub fn key(&self, bone: &str, frame: u32) -> Option<&BoneFrame> {
        self.bones.get(bone).and_then(|keys| keys.get(&frame))
    }

    /// Whether `bone` has an explicit key at `frame`.
    #[must_use]
    pub fn has_key(&self, bone: &str, frame: u32) -> bool {
        self.key(bone, frame).is_some()
    }

    /// Evaluate a bone at `frame`.
    ///
    /// Returns the explicit key if there is one, otherwise interpolates
    /// between the surrounding keys and clamps outside the keyed range.
    /// Bones without keys are at rest.
    #[must_use]
    pub fn frame_at(&self, bone: &str, frame: u32) -> BoneFrame {
        let Some(keys) = self.bones.get(bone) else {
            return BoneFrame::identity();
        };
        if let Some(exact) = keys.get(&frame) {
            return *exact;
        }

        let prev = keys.range(..frame).next_back();
        let next = keys.range(frame..).next();
        match (prev, next) {
            (Some((&t0, f0)), Some((&t1, f1))) => {
                let s = f64::from(frame - t0) / f64::from(t1 - t0);
                BoneFrame::new(
                    f0.rotation
                        .try_slerp(&f1.rotation, s, SLERP_EPSILON)
                        .unwrap_or(f0.rotation),
                    f0.position.lerp(&f1.position, s),
                )
            }
            (Some((_, f)), None) | (None, Some((_, f))) => BoneFrame::new(f.rotation, f.position),
            (None, None) => BoneFrame::identity(),
        }
    }

    /// Ascending distinct frames `>= start` at which any of `bones` has a key.
    #[must_use]
    pub fn key_frame_indices<S: AsRef<str>>(&self, bones: &[S], start: u32) -> Vec<u32> {
        let mut frames = BTreeSet::new();
        for bone in bones {
            if let Some(keys) = self.bones.get(bone.as_ref()) {
                frames.extend(keys.range(start..).map(|(&t, _)| t));
            }
        }
        frames.into_iter().collect()
    }

    /// Keys of one bone, in frame order.
    pub fn keys(&self, bone: &str) -> impl Iterator<Item = (u32, &BoneFrame)> {
        self.bones
            .get(bone)
            .into_iter()
            .flat_map(|keys| keys.iter().map(|(&t, f)| (t, f)))
    }

    /// Names of all bones with at least one key entry.
    pub fn bone_names(&self) -> impl Iterator<Item = &str> {
        self.bones.keys().map(String::as_str)
    }

    /// Total number of explicit keys over all bones.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.bones.values().map(BTreeMap::len).sum()
    }

    /// Whether the motion holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn rot_z(angle: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle)
    }

    #[test]
    fn test_unkeyed_bone_is_rest() {
        let motion = MotionStore::new();
        let f = motion.frame_at("elbow.L", 3);
        assert_eq!(f, BoneFrame::identity());
        assert!(motion.is_empty());
    }

    #[test]
    fn test_register_marks_key() {
        let mut motion = MotionStore::new();
        motion.register("elbow.L", 4, BoneFrame::from_rotation(rot_z(0.3)));
        let f = motion.frame_at("elbow.L", 4);
        assert!(f.key);
        assert!(motion.has_key("elbow.L", 4));
        assert_eq!(motion.key_count(), 1);
    }

    #[test]
    fn test_interpolation_between_keys() {
        let mut motion = MotionStore::new();
        motion.register(
            "wrist.L",
            0,
            BoneFrame::new(rot_z(0.0), Vector3::new(0.0, 0.0, 0.0)),
        );
        motion.register(
            "wrist.L",
            4,
            BoneFrame::new(rot_z(FRAC_PI_2), Vector3::new(4.0, 0.0, 0.0)),
        );

        let f = motion.frame_at("wrist.L", 1);
        assert!(!f.key);
        assert_relative_eq!(f.position.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(f.rotation.angle(), FRAC_PI_2 / 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clamps_outside_key_range() {
        let mut motion = MotionStore::new();
        motion.register("wrist.L", 5, BoneFrame::from_rotation(rot_z(0.5)));
        motion.register("wrist.L", 9, BoneFrame::from_rotation(rot_z(0.9)));

        assert_relative_eq!(motion.frame_at("wrist.L", 0).rotation.angle(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(motion.frame_at("wrist.L", 50).rotation.angle(), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_set_rotation_keeps_position() {
        let mut motion = MotionStore::new();
        motion.register("elbow.L", 0, BoneFrame::new(rot_z(0.0), Vector3::new(1.0, 2.0, 3.0)));
        motion.set_rotation("elbow.L", 2, rot_z(0.7));

        let f = motion.key("elbow.L", 2).unwrap();
        assert!(f.key);
        assert_eq!(f.position, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(f.rotation.angle(), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_key_frame_indices_merges_and_filters() {
        let mut motion = MotionStore::new();
        motion.register("upper_arm.L", 0, BoneFrame::identity());
        motion.register("upper_arm.L", 10, BoneFrame::identity());
        motion.register("elbow.L", 10, BoneFrame::identity());
        motion.register("elbow.L", 3, BoneFrame::identity());
        motion.register("head", 7, BoneFrame::identity());

        let bones = ["upper_arm.L", "elbow.L", "wrist.L"];
        assert_eq!(motion.key_frame_indices(&bones, 0), vec![0, 3, 10]);
        assert_eq!(motion.key_frame_indices(&bones, 4), vec![10]);
        assert!(motion.key_frame_indices(&bones, 11).is_empty());
    }

    #[test]
    fn test_remove_key() {
        let mut motion = MotionStore::new();
        motion.register("elbow.L", 1, BoneFrame::identity());
        assert!(motion.remove_key("elbow.L", 1).is_some());
        assert!(!motion.has_key("elbow.L", 1));
        assert!(motion.remove_key("elbow.L", 1).is_none());
    }
}
