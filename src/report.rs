//! Per-video outcomes and run reports.
//!
//! A run never aborts because one video failed. Instead each video gets an
//! [`ExtractionResult`], and the [`RunReport`] collects them in manifest
//! order so the caller can show which videos succeeded and which did not.
//!
//! # Example
//!
//! ```no_run
//! use framedump::{BatchRunner, FfmpegDecoder, FfprobeProber, InputSource, SamplingPolicy};
//!
//! let runner = BatchRunner::new(FfprobeProber::new(), FfmpegDecoder::new());
//! let source = InputSource::from_path("videos.json", None)?;
//! let report = runner.run_source(&source, SamplingPolicy::Interval(2.0))?;
//! print!("{report}");
//! if !report.is_success() {
//!     std::process::exit(1);
//! }
//! # Ok::<(), framedump::FramedumpError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use crate::error::FramedumpError;

/// Outcome of extracting one video.
#[derive(Debug)]
pub enum ExtractionStatus {
    /// Every planned frame was written.
    Success {
        /// Number of frames written, equal to the plan's length.
        frame_count: usize,
    },
    /// The video could not be processed.
    Failure(FramedumpError),
}

/// The result for a single video of a run.
#[derive(Debug)]
pub struct ExtractionResult {
    /// The video this result describes.
    pub video: PathBuf,
    /// Where frames were (or would have been) written, once resolved.
    pub output_dir: Option<PathBuf>,
    /// What happened.
    pub status: ExtractionStatus,
}

impl ExtractionResult {
    /// A successful result.
    pub fn success(
        video: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        frame_count: usize,
    ) -> Self {
        Self {
            video: video.into(),
            output_dir: Some(output_dir.into()),
            status: ExtractionStatus::Success { frame_count },
        }
    }

    /// A failed result.
    pub fn failure(
        video: impl Into<PathBuf>,
        output_dir: Option<PathBuf>,
        error: FramedumpError,
    ) -> Self {
        Self {
            video: video.into(),
            output_dir,
            status: ExtractionStatus::Failure(error),
        }
    }

    /// Returns `true` if every planned frame was written.
    pub fn is_success(&self) -> bool {
        matches!(self.status, ExtractionStatus::Success { .. })
    }

    /// Frames written, or `None` on failure.
    pub fn frame_count(&self) -> Option<usize> {
        match self.status {
            ExtractionStatus::Success { frame_count } => Some(frame_count),
            ExtractionStatus::Failure(_) => None,
        }
    }

    /// The failure reason, if any.
    pub fn error(&self) -> Option<&FramedumpError> {
        match &self.status {
            ExtractionStatus::Success { .. } => None,
            ExtractionStatus::Failure(error) => Some(error),
        }
    }
}

impl Display for ExtractionResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.status {
            ExtractionStatus::Success { frame_count } => {
                write!(f, "[OK] {}: {frame_count} frame(s)", self.video.display())?;
                if let Some(dir) = &self.output_dir {
                    write!(f, " -> {}", dir.display())?;
                }
                Ok(())
            }
            ExtractionStatus::Failure(error) => {
                write!(f, "[FAIL] {}: {error}", self.video.display())
            }
        }
    }
}

/// Ordered results of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// One entry per requested video, in request order.
    pub results: Vec<ExtractionResult>,
}

impl RunReport {
    /// Number of videos in the report.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if the report holds no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns `true` if every video succeeded.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(ExtractionResult::is_success)
    }

    /// Number of successful videos.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of failed videos.
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Total frames written across all successful videos.
    pub fn total_frames(&self) -> usize {
        self.results.iter().filter_map(ExtractionResult::frame_count).sum()
    }

    /// The result for `video`, if it was part of the run.
    pub fn result_for(&self, video: &Path) -> Option<&ExtractionResult> {
        self.results.iter().find(|r| r.video == video)
    }

    /// Iterate over the results in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ExtractionResult> {
        self.results.iter()
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for result in &self.results {
            writeln!(f, "{result}")?;
        }
        writeln!(
            f,
            "{} of {} video(s) succeeded, {} frame(s) written",
            self.succeeded(),
            self.len(),
            self.total_frames()
        )
    }
}
