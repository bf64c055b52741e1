//! Clip inference for video recordings.
//!
//! The recording system sometimes closes a video file and opens a new one a few
//! seconds later, splitting one logical recording across several files. A video
//! is marked `clipped` when the next video starts within the handover tolerance
//! after it ends. The last file of a chain is not marked.

use chrono::Duration;
use tracing::debug;

use crate::records::VideoFile;

/// Mark split recordings in a start-ordered video list.
///
/// Must run on the complete, merged video list of one patient; running it per
/// export would miss splits that straddle two exports.
pub fn infer_clips(videos: &mut [VideoFile], tolerance: Duration) -> usize {
    for video in videos.iter_mut() {
        video.clipped = false;
    }

    let mut linked = 0;
    for i in 1..videos.len() {
        let gap = videos[i].start - videos[i - 1].end;
        if gap >= Duration::zero() && gap <= tolerance {
            debug!(
                earlier = %videos[i - 1].path,
                later = %videos[i].path,
                gap_ms = gap.num_milliseconds(),
                "Linked split video"
            );
            videos[i - 1].clipped = true;
            linked += 1;
        }
    }
    linked
}
