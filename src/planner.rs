//! Frame-sampling planner.
//!
//! Turns a video's duration (and, when known, frame rate) plus a
//! [`SamplingPolicy`] into an [`ExtractionPlan`]: the ordered capture points
//! the decoder must materialize and the filename each one is written to.
//!
//! Planning is pure and deterministic: the same duration and policy always
//! produce the same timestamps and filenames, so re-running an extraction
//! overwrites exactly the files of the previous run.
//!
//! # Example
//!
//! ```
//! use framedump::{SamplingPolicy, plan};
//!
//! let plan = plan(10.0, SamplingPolicy::Interval(2.5))?;
//! assert_eq!(plan.timestamps(), vec![0.0, 2.5, 5.0, 7.5]);
//! assert_eq!(plan.points()[0].output_filename, "frame_0001.png");
//! # Ok::<(), framedump::FramedumpError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::config::ImageFormat;
use crate::error::FramedumpError;
use crate::metadata::VideoMetadata;
use crate::utilities::{decimal_width, timestamp_to_frame_number};

/// Upper bound on the number of capture points in a single plan.
pub const MAX_CAPTURE_POINTS: usize = 100_000;

/// Minimum zero-padding of the frame index in output filenames.
const MIN_INDEX_WIDTH: usize = 4;

/// Filename stem shared by every extracted frame.
pub const FRAME_FILE_PREFIX: &str = "frame_";

/// How frames are sampled from a video.
///
/// Exactly one rule is active per run. Use
/// [`from_options`](SamplingPolicy::from_options) to build a policy from two
/// optional command-line values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingPolicy {
    /// Capture this many frames, evenly spaced over the whole video.
    FrameCount(u32),
    /// Capture one frame every this many seconds, starting at zero.
    Interval(f64),
}

impl SamplingPolicy {
    /// Build a policy from mutually exclusive optional values.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Planning`] if both or neither value is given, or if
    /// the given value is not positive.
    ///
    /// ```
    /// use framedump::SamplingPolicy;
    ///
    /// assert!(SamplingPolicy::from_options(Some(10), None).is_ok());
    /// assert!(SamplingPolicy::from_options(Some(10), Some(1.0)).is_err());
    /// assert!(SamplingPolicy::from_options(None, None).is_err());
    /// ```
    pub fn from_options(
        frame_count: Option<u32>,
        interval_seconds: Option<f64>,
    ) -> Result<Self, FramedumpError> {
        let policy = match (frame_count, interval_seconds) {
            (Some(count), None) => SamplingPolicy::FrameCount(count),
            (None, Some(seconds)) => SamplingPolicy::Interval(seconds),
            (Some(_), Some(_)) => {
                return Err(FramedumpError::Planning(
                    "specify either a frame count or an interval, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(FramedumpError::Planning(
                    "either a frame count or an interval is required".to_string(),
                ));
            }
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check that the policy's parameter is positive and finite.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Planning`] for a zero frame count or a non-positive
    /// interval.
    pub fn validate(&self) -> Result<(), FramedumpError> {
        match *self {
            SamplingPolicy::FrameCount(0) => Err(FramedumpError::Planning(
                "frame count must be greater than zero".to_string(),
            )),
            SamplingPolicy::Interval(seconds) if !(seconds.is_finite() && seconds > 0.0) => {
                Err(FramedumpError::Planning(format!(
                    "interval must be a positive number of seconds, got {seconds}"
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Display for SamplingPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SamplingPolicy::FrameCount(count) => write!(f, "{count} frame(s)"),
            SamplingPolicy::Interval(seconds) => write!(f, "one frame every {seconds}s"),
        }
    }
}

/// A single planned capture: which moment to grab and which file to write.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturePoint {
    /// 1-based position in the plan; also the number in the filename.
    pub index: usize,
    /// Capture time in seconds, within `[0, duration)`.
    pub timestamp_seconds: f64,
    /// Frame containing the timestamp, when the frame rate is known.
    pub frame_number: Option<u64>,
    /// Filename (no directory) the frame is written to.
    pub output_filename: String,
}

impl CapturePoint {
    /// The capture time as a [`Duration`].
    pub fn timestamp(&self) -> Duration {
        Duration::from_secs_f64(self.timestamp_seconds)
    }
}

/// An ordered, validated set of capture points for one video.
///
/// Invariants: timestamps strictly increase and stay below the duration;
/// filenames are unique, zero-padded, and sort in capture order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionPlan {
    points: Vec<CapturePoint>,
    policy: SamplingPolicy,
    duration_seconds: f64,
    step_seconds: f64,
    image_format: ImageFormat,
    index_width: usize,
}

/// Plan PNG captures for a video of `duration_seconds`.
///
/// # Errors
///
/// [`FramedumpError::Planning`] if the duration is not positive, the policy
/// is invalid, or the plan would exceed [`MAX_CAPTURE_POINTS`].
pub fn plan(
    duration_seconds: f64,
    policy: SamplingPolicy,
) -> Result<ExtractionPlan, FramedumpError> {
    ExtractionPlan::new(duration_seconds, policy, ImageFormat::Png)
}

impl ExtractionPlan {
    /// Plan captures for a video of `duration_seconds`, writing `format` files.
    ///
    /// # Errors
    ///
    /// See [`plan`].
    pub fn new(
        duration_seconds: f64,
        policy: SamplingPolicy,
        image_format: ImageFormat,
    ) -> Result<Self, FramedumpError> {
        let timestamps = sample_timestamps(duration_seconds, policy)?;
        let width = decimal_width(timestamps.len()).max(MIN_INDEX_WIDTH);
        let step_seconds = match policy {
            SamplingPolicy::FrameCount(count) => duration_seconds / f64::from(count),
            SamplingPolicy::Interval(seconds) => seconds,
        };
        let extension = image_format.extension();

        let points = timestamps
            .into_iter()
            .enumerate()
            .map(|(offset, timestamp_seconds)| {
                let index = offset + 1;
                CapturePoint {
                    index,
                    timestamp_seconds,
                    frame_number: None,
                    output_filename: format!("{FRAME_FILE_PREFIX}{index:0width$}.{extension}"),
                }
            })
            .collect();

        log::debug!("Planned {policy} over {duration_seconds:.3}s");

        Ok(Self {
            points,
            policy,
            duration_seconds,
            step_seconds,
            image_format,
            index_width: width,
        })
    }

    /// Plan captures for a probed video.
    ///
    /// When the frame rate is known every capture point is pinned to the
    /// frame that contains it, and the decoder selects frames by number.
    ///
    /// # Errors
    ///
    /// Everything [`new`](ExtractionPlan::new) reports, plus
    /// [`FramedumpError::Planning`] when the policy asks for more frames than
    /// the video has or would capture the same frame twice.
    pub fn for_video(
        metadata: &VideoMetadata,
        policy: SamplingPolicy,
        image_format: ImageFormat,
    ) -> Result<Self, FramedumpError> {
        let mut plan = Self::new(metadata.duration.as_secs_f64(), policy, image_format)?;
        if !metadata.has_frame_rate() {
            return Ok(plan);
        }

        let fps = metadata.frames_per_second;
        if metadata.frame_count > 0 && plan.len() as u64 > metadata.frame_count {
            return Err(FramedumpError::Planning(format!(
                "{policy} needs {} frames but the video only has {}",
                plan.len(),
                metadata.frame_count
            )));
        }

        let last_frame = metadata.frame_count.checked_sub(1);
        let mut previous: Option<u64> = None;
        for point in &mut plan.points {
            let mut frame_number = timestamp_to_frame_number(point.timestamp_seconds, fps);
            if let Some(last) = last_frame {
                frame_number = frame_number.min(last);
            }
            if let Some(previous) = previous.filter(|&p| frame_number <= p) {
                return Err(FramedumpError::Planning(format!(
                    "{policy} samples finer than the video's {fps:.3} fps \
                     (captures {} and {} both land on frame {previous})",
                    point.index - 1,
                    point.index,
                )));
            }
            previous = Some(frame_number);
            point.frame_number = Some(frame_number);
        }

        Ok(plan)
    }

    /// The capture points in order.
    pub fn points(&self) -> &[CapturePoint] {
        &self.points
    }

    /// Iterate over the capture points in order.
    pub fn iter(&self) -> std::slice::Iter<'_, CapturePoint> {
        self.points.iter()
    }

    /// Number of capture points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false` for a successfully built plan.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Capture timestamps in seconds.
    pub fn timestamps(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.timestamp_seconds).collect()
    }

    /// Output filenames in capture order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|p| p.output_filename.as_str())
    }

    /// The policy this plan was built from.
    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Duration of the planned video in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Image format of the planned files.
    pub fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    /// Seconds between consecutive capture times.
    pub fn step_seconds(&self) -> f64 {
        self.step_seconds
    }

    /// `printf`-style pattern matching every output filename of this plan,
    /// e.g. `frame_%04d.png`. Numbering starts at 1.
    pub fn filename_pattern(&self) -> String {
        format!(
            "{FRAME_FILE_PREFIX}%0{}d.{}",
            self.index_width,
            self.image_format.extension()
        )
    }
}

impl<'a> IntoIterator for &'a ExtractionPlan {
    type Item = &'a CapturePoint;
    type IntoIter = std::slice::Iter<'a, CapturePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Compute the capture timestamps for `policy` over `[0, duration)`.
fn sample_timestamps(duration: f64, policy: SamplingPolicy) -> Result<Vec<f64>, FramedumpError> {
    if !(duration.is_finite() && duration > 0.0) {
        return Err(FramedumpError::Planning(format!(
            "video duration must be positive, got {duration}s"
        )));
    }
    policy.validate()?;

    let timestamps: Vec<f64> = match policy {
        SamplingPolicy::FrameCount(count) => {
            let count = count as usize;
            ensure_within_limit(count as f64)?;
            let step = duration / count as f64;
            (0..count).map(|i| i as f64 * step).collect()
        }
        SamplingPolicy::Interval(seconds) => {
            let estimate = (duration / seconds).ceil();
            ensure_within_limit(estimate)?;
            // ceil() can be off by one either way after float rounding.
            let mut count = (estimate as usize).max(1);
            while count > 1 && (count - 1) as f64 * seconds >= duration {
                count -= 1;
            }
            while (count as f64) * seconds < duration {
                count += 1;
            }
            (0..count).map(|i| i as f64 * seconds).collect()
        }
    };

    if timestamps.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(FramedumpError::Planning(format!(
            "{policy} is too dense for a {duration}s video"
        )));
    }

    Ok(timestamps)
}

fn ensure_within_limit(count: f64) -> Result<(), FramedumpError> {
    if count > MAX_CAPTURE_POINTS as f64 {
        return Err(FramedumpError::Planning(format!(
            "plan would contain {count} captures, more than the limit of {MAX_CAPTURE_POINTS}"
        )));
    }
    Ok(())
}
