//! Keyframe-driven frame scheduling.
//!
//! Frames are visited in ascending order, one at a time. The set of frames is
//! re-queried after every visit because solving a frame may write new keys,
//! including at frames not yet visited.

use motion_types::MotionStore;
use tracing::info;

use crate::error::Result;

/// Visit every frame at which any of `bones` carries an explicit key.
///
/// Starting from frame 0, the earliest keyed frame at or after the cursor is
/// passed to `visit`, then the cursor moves to the frame after it and the
/// motion is queried again. Stops when no keyed frame remains or `visit`
/// fails. Returns the number of frames visited.
///
/// Progress is logged each time the visited frame crosses a multiple of
/// `progress_interval`.
///
/// # Example
///
/// ```
/// use motion_avoid::for_each_key_frame;
/// use motion_types::{BoneFrame, MotionStore};
///
/// let mut motion = MotionStore::new();
/// motion.register("wrist.L", 0, BoneFrame::identity());
/// motion.register("wrist.L", 4, BoneFrame::identity());
///
/// let mut seen = Vec::new();
/// let bones = ["wrist.L".to_string()];
/// let count = for_each_key_frame(&mut motion, &bones, 500, |motion, frame| {
///     if frame == 0 {
///         motion.register("wrist.L", 2, BoneFrame::identity());
///     }
///     seen.push(frame);
///     Ok(())
/// })
/// .unwrap();
///
/// assert_eq!(seen, [0, 2, 4]);
/// assert_eq!(count, 3);
/// ```
pub fn for_each_key_frame<F>(
    motion: &mut MotionStore,
    bones: &[String],
    progress_interval: u32,
    mut visit: F,
) -> Result<usize>
where
    F: FnMut(&mut MotionStore, u32) -> Result<()>,
{
    let interval = progress_interval.max(1);
    let mut cursor = 0_u32;
    let mut visited = 0_usize;
    let mut reported = 0_u32;

    loop {
        let frames = motion.key_frame_indices(bones, cursor);
        let (Some(&frame), Some(&last)) = (frames.first(), frames.last()) else {
            break;
        };

        visit(motion, frame)?;
        visited += 1;

        if frame / interval > reported && last > 0 {
            reported = frame / interval;
            let percent = f64::from(frame) / f64::from(last) * 100.0;
            info!(frame, last, percent, "Arm avoidance progress");
        }

        match frame.checked_add(1) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    Ok(visited)
}
