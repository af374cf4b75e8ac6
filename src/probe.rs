//! Video metadata probing.
//!
//! The planner needs a video's duration and frame rate before anything is
//! decoded. [`Prober`] is the capability that supplies them;
//! [`FfprobeProber`] implements it by running `ffprobe` and parsing its JSON
//! output.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::Deserialize;

use crate::error::FramedumpError;
use crate::metadata::VideoMetadata;
use crate::utilities::{
    DIAGNOSTICS_LIMIT, estimate_frame_count, parse_rational, truncate_diagnostics,
};

/// Stream and container fields requested from `ffprobe`.
const SHOW_ENTRIES: &str = concat!(
    "stream=codec_name,width,height,avg_frame_rate,r_frame_rate,duration,nb_frames",
    ":format=duration"
);

/// Reads the metadata of a video file.
pub trait Prober {
    /// Probe `video` and return the metadata of its primary video stream.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Probe`] if the file cannot be read as a video.
    fn probe(&self, video: &Path) -> Result<VideoMetadata, FramedumpError>;
}

/// [`Prober`] backed by the `ffprobe` executable.
///
/// # Example
///
/// ```no_run
/// use framedump::{FfprobeProber, Prober};
///
/// let metadata = FfprobeProber::new().probe("input.mp4".as_ref())?;
/// println!("{} frames", metadata.frame_count);
/// # Ok::<(), framedump::FramedumpError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: PathBuf,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeProber {
    /// Use `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
        }
    }

    /// Use a specific `ffprobe` executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// The `ffprobe` that ships next to the given `ffmpeg` executable.
    ///
    /// `bin/ffmpeg.exe` becomes `bin/ffprobe.exe`; a bare `ffmpeg` becomes a
    /// bare `ffprobe` looked up on `PATH`.
    pub fn beside(ffmpeg_program: &Path) -> Self {
        let program = match ffmpeg_program.file_name().and_then(|name| name.to_str()) {
            Some(name) if name.contains("ffmpeg") => {
                ffmpeg_program.with_file_name(name.replacen("ffmpeg", "ffprobe", 1))
            }
            _ => PathBuf::from("ffprobe"),
        };
        Self { program }
    }

    /// The executable this prober runs.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Prober for FfprobeProber {
    fn probe(&self, video: &Path) -> Result<VideoMetadata, FramedumpError> {
        log::debug!("Probing {} with {}", video.display(), self.program.display());

        let output = Command::new(&self.program)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", SHOW_ENTRIES, "-of", "json"])
            .arg(video)
            .stdin(Stdio::null())
            .output()
            .map_err(|error| FramedumpError::Probe {
                path: video.to_path_buf(),
                reason: format!("failed to launch {}: {error}", self.program.display()),
            })?;

        if !output.status.success() {
            return Err(FramedumpError::Probe {
                path: video.to_path_buf(),
                reason: truncate_diagnostics(
                    &String::from_utf8_lossy(&output.stderr),
                    DIAGNOSTICS_LIMIT,
                ),
            });
        }

        parse_ffprobe_json(&output.stdout).map_err(|reason| FramedumpError::Probe {
            path: video.to_path_buf(),
            reason,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -of json` output into [`VideoMetadata`].
///
/// Duration comes from the stream, falling back to the container. The frame
/// rate prefers `avg_frame_rate` over `r_frame_rate`. The frame count is
/// `nb_frames` when reported, otherwise estimated.
///
/// # Errors
///
/// A message describing malformed JSON or a missing video stream.
pub fn parse_ffprobe_json(bytes: &[u8]) -> Result<VideoMetadata, String> {
    let document: ProbeDocument =
        serde_json::from_slice(bytes).map_err(|error| format!("invalid ffprobe output: {error}"))?;
    let stream = document
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| "no video stream found".to_string())?;

    let duration_seconds = positive(stream.duration.as_deref())
        .or_else(|| positive(document.format.and_then(|f| f.duration).as_deref()))
        .unwrap_or(0.0);

    let frames_per_second = [stream.avg_frame_rate, stream.r_frame_rate]
        .into_iter()
        .flatten()
        .filter_map(|rate| parse_rational(&rate))
        .find(|&fps| fps.is_finite() && fps > 0.0)
        .unwrap_or(0.0);

    let frame_count = stream
        .nb_frames
        .and_then(|n| n.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| estimate_frame_count(duration_seconds, frames_per_second));

    if duration_seconds <= 0.0 || frames_per_second <= 0.0 {
        log::warn!(
            "Incomplete video metadata: duration={duration_seconds}s, fps={frames_per_second}"
        );
    }

    Ok(VideoMetadata {
        duration: Duration::try_from_secs_f64(duration_seconds).unwrap_or_default(),
        frames_per_second,
        frame_count,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        codec: stream.codec_name.unwrap_or_default(),
    })
}

fn positive(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}
