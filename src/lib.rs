//! # framedump
//!
//! Sample still frames from video files, singly or in unattended batches,
//! for downstream consumers such as multimodal models.
//!
//! Decoding is delegated to the `ffmpeg` executable. This crate decides
//! *which* frames to capture and *where* they go, drives the decoder once
//! per video, keeps one bad video from sinking a batch, and cleans up old
//! output.
//!
//! ## Quick Start
//!
//! ### Plan captures
//!
//! ```
//! use framedump::{SamplingPolicy, plan};
//!
//! let plan = plan(30.0, SamplingPolicy::FrameCount(15))?;
//! assert_eq!(plan.len(), 15);
//! assert_eq!(plan.timestamps()[1], 2.0);
//! # Ok::<(), framedump::FramedumpError>(())
//! ```
//!
//! ### Extract a batch
//!
//! ```no_run
//! use framedump::{BatchRunner, FfmpegDecoder, FfprobeProber, InputSource, SamplingPolicy};
//!
//! let source = InputSource::from_path("videos.json", None)?;
//! let runner = BatchRunner::new(FfprobeProber::new(), FfmpegDecoder::new());
//! let report = runner.run_source(&source, SamplingPolicy::Interval(2.5))?;
//! print!("{report}");
//! # Ok::<(), framedump::FramedumpError>(())
//! ```
//!
//! ### Clean up
//!
//! ```no_run
//! let report = framedump::clean("clips".as_ref())?;
//! assert!(report.is_success());
//! # Ok::<(), framedump::FramedumpError>(())
//! ```
//!
//! ## Output layout
//!
//! Frames land in `<video_parent>/frames/frame_0001.png`, `frame_0002.png`,
//! ... unless a single-video run names an explicit output directory. The
//! index is zero-padded to at least four digits so names sort in capture
//! order.
//!
//! ## Requirements
//!
//! `ffmpeg` and `ffprobe` must be installed, either on `PATH` or in a `bin/`
//! directory next to the executable (see [`locate_ffmpeg`]).

pub mod batch;
pub mod cleaner;
pub mod config;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod manifest;
pub mod metadata;
pub mod paths;
pub mod planner;
pub mod probe;
pub mod progress;
pub mod report;
mod utilities;

pub use batch::BatchRunner;
pub use cleaner::{Cleaner, CleanupReport, clean, clean_with_format, resolve_cleanup_directory};
pub use config::{ExtractionConfig, ImageFormat};
pub use decoder::{
    DecodeRequest, Decoder, DecoderOutput, FfmpegDecoder, locate_ffmpeg, selection_filter,
};
pub use error::{CleanupItemError, ErrorCategory, FramedumpError};
pub use extractor::FrameExtractor;
pub use manifest::{BatchManifest, InputSource, is_manifest_path};
pub use metadata::VideoMetadata;
pub use paths::{FRAMES_DIRECTORY, RunMode, derived_output_directory, resolve_output_directory};
pub use planner::{CapturePoint, ExtractionPlan, MAX_CAPTURE_POINTS, SamplingPolicy, plan};
pub use probe::{FfprobeProber, Prober, parse_ffprobe_json};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use report::{ExtractionResult, ExtractionStatus, RunReport};
