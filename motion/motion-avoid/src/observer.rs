//! Debug hooks for the frame solver.
//!
//! An [`AvoidanceObserver`] sees where volumes were placed and where each
//! colliding effector was before and after IK. [`MarkerRecorder`] turns
//! those events into keyframes on synthetic bones in a separate motion, so
//! they can be inspected alongside the corrected animation without touching
//! real bones.

use motion_types::{BoneFrame, MotionStore};
use nalgebra::{Point3, UnitQuaternion};

use crate::volume::VolumePose;

/// Receives solver events. Every hook defaults to doing nothing.
pub trait AvoidanceObserver {
    /// A volume's world pose was computed for `frame`.
    fn volume_posed(&mut self, _frame: u32, _volume: &str, _pose: &VolumePose) {}

    /// `effector` was found inside a volume at `position`.
    fn effector_before(&mut self, _frame: u32, _effector: &str, _position: &Point3<f64>) {}

    /// `effector` reached `position` after an IK attempt.
    fn effector_after(&mut self, _frame: u32, _effector: &str, _position: &Point3<f64>) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl AvoidanceObserver for NoopObserver {}

/// Records solver events as position keys on synthetic bones.
///
/// Marker names are `volume:<name>`, `before:<effector>` and
/// `after:<effector>`.
#[derive(Debug, Clone, Default)]
pub struct MarkerRecorder {
    markers: MotionStore,
}

impl MarkerRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded markers.
    #[must_use]
    pub fn markers(&self) -> &MotionStore {
        &self.markers
    }

    /// Take the recorded markers.
    #[must_use]
    pub fn into_markers(self) -> MotionStore {
        self.markers
    }

    fn mark(
        &mut self,
        name: &str,
        frame: u32,
        position: &Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) {
        self.markers
            .register(name, frame, BoneFrame::new(rotation, position.coords));
    }
}

impl AvoidanceObserver for MarkerRecorder {
    fn volume_posed(&mut self, frame: u32, volume: &str, pose: &VolumePose) {
        self.mark(&format!("volume:{volume}"), frame, &pose.center, pose.rotation);
    }

    fn effector_before(&mut self, frame: u32, effector: &str, position: &Point3<f64>) {
        self.mark(
            &format!("before:{effector}"),
            frame,
            position,
            UnitQuaternion::identity(),
        );
    }

    fn effector_after(&mut self, frame: u32, effector: &str, position: &Point3<f64>) {
        self.mark(
            &format!("after:{effector}"),
            frame,
            position,
            UnitQuaternion::identity(),
        );
    }
}

impl<O: AvoidanceObserver + ?Sized> AvoidanceObserver for &mut O {
    fn volume_posed(&mut self, frame: u32, volume: &str, pose: &VolumePose) {
        (**self).volume_posed(frame, volume, pose);
    }

    fn effector_before(&mut self, frame: u32, effector: &str, position: &Point3<f64>) {
        (**self).effector_before(frame, effector, position);
    }

    fn effector_after(&mut self, frame: u32, effector: &str, position: &Point3<f64>) {
        (**self).effector_after(frame, effector, position);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use motion_types::ProxyShape;
    use nalgebra::Vector3;

    #[test]
    fn test_marker_names_and_positions() {
        let mut recorder = MarkerRecorder::new();
        let pose = VolumePose::new(
            Point3::new(0.0, 100.0, 0.0),
            UnitQuaternion::identity(),
            ProxyShape::cuboid(Vector3::new(10.0, 10.0, 10.0)),
        );
        recorder.volume_posed(10, "chest", &pose);
        recorder.effector_before(10, "wrist.L", &Point3::new(0.0, 100.0, 5.0));
        recorder.effector_after(10, "wrist.L", &Point3::new(0.0, 100.0, 10.0));

        let markers = recorder.into_markers();
        assert_eq!(
            markers.bone_names().collect::<Vec<_>>(),
            ["after:wrist.L", "before:wrist.L", "volume:chest"]
        );
        assert_eq!(
            markers.key("after:wrist.L", 10).unwrap().position,
            Vector3::new(0.0, 100.0, 10.0)
        );
        assert!(!markers.has_key("wrist.L", 10));
    }

    #[test]
    fn test_forwarding_through_mut_reference() {
        fn touch<O: AvoidanceObserver>(mut observer: O) {
            observer.effector_before(3, "elbow.L", &Point3::new(1.0, 2.0, 3.0));
        }

        let mut recorder = MarkerRecorder::new();
        touch(&mut recorder);
        touch(NoopObserver);
        assert!(recorder.markers().has_key("before:elbow.L", 3));
    }
}
