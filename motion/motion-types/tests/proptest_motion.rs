//! Property-based tests for motion store queries.
//!
//! Run with: cargo test -p motion-types -- proptest

use motion_types::{BoneFrame, MotionStore};
use proptest::prelude::*;

const ARM: [&str; 3] = ["upper_arm.L", "elbow.L", "wrist.L"];

/// Random keys on the three arm bones plus an unrelated bone.
fn arb_motion() -> impl Strategy<Value = (MotionStore, Vec<(usize, u32)>)> {
    prop::collection::vec((0usize..4, 0u32..200), 0..40).prop_map(|keys| {
        let mut motion = MotionStore::new();
        for &(bone, frame) in &keys {
            let name = ARM.get(bone).copied().unwrap_or("head");
            motion.register(name, frame, BoneFrame::identity());
        }
        (motion, keys)
    })
}

proptest! {
    #[test]
    fn key_indices_sorted_distinct_and_bounded((motion, _) in arb_motion(), start in 0u32..220) {
        let frames = motion.key_frame_indices(&ARM, start);
        prop_assert!(frames.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(frames.iter().all(|&f| f >= start));
    }

    #[test]
    fn key_indices_cover_every_arm_key((motion, keys) in arb_motion(), start in 0u32..220) {
        let frames = motion.key_frame_indices(&ARM, start);
        for &(bone, frame) in &keys {
            if bone < ARM.len() && frame >= start {
                prop_assert!(frames.contains(&frame));
            }
        }
    }

    #[test]
    fn registered_key_is_visible_from_next_query((motion, _) in arb_motion(), frame in 0u32..200) {
        let mut motion = motion;
        motion.register("wrist.L", frame + 1, BoneFrame::identity());
        let frames = motion.key_frame_indices(&ARM, frame + 1);
        prop_assert_eq!(frames.first().copied(), Some(frame + 1));
    }
}
