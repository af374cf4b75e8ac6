//! Video metadata types.
//!
//! [`VideoMetadata`] is what a [`Prober`](crate::Prober) reports for a video
//! and what the planner needs to place capture points.

use std::time::Duration;

/// Metadata for the primary video stream of a file.
///
/// # Example
///
/// ```no_run
/// use framedump::{FfprobeProber, Prober};
///
/// let metadata = FfprobeProber::new().probe("input.mp4".as_ref())?;
/// println!("{:?} @ {:.2} fps", metadata.duration, metadata.frames_per_second);
/// # Ok::<(), framedump::FramedumpError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Duration of the video stream.
    pub duration: Duration,
    /// Frames per second. Zero when the container does not report a rate.
    pub frames_per_second: f64,
    /// Total number of frames, either reported by the container or estimated
    /// from duration and frame rate. Zero when unknown.
    pub frame_count: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
}

impl VideoMetadata {
    /// Metadata with only a duration and frame rate; the frame count is
    /// estimated from the two.
    pub fn from_duration(duration: Duration, frames_per_second: f64) -> Self {
        Self {
            duration,
            frames_per_second,
            frame_count: crate::utilities::estimate_frame_count(
                duration.as_secs_f64(),
                frames_per_second,
            ),
            width: 0,
            height: 0,
            codec: String::new(),
        }
    }

    /// Whether the frame rate is usable for frame-number arithmetic.
    pub fn has_frame_rate(&self) -> bool {
        self.frames_per_second.is_finite() && self.frames_per_second > 0.0
    }
}
