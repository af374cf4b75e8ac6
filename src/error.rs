//! Error types for the `framedump` crate.
//!
//! This module defines [`FramedumpError`], the unified error type returned by
//! every fallible operation, and [`CleanupItemError`], the non-fatal record of
//! a single file the cleaner could not delete. Errors carry the path or
//! decoder diagnostics needed to explain a failure in a run report.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Error as IoError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The unified error type for all `framedump` operations.
///
/// Per-video variants end up inside
/// [`ExtractionStatus::Failure`](crate::ExtractionStatus::Failure) during a
/// batch run; configuration-level variants are returned before any work
/// starts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramedumpError {
    /// Invalid input source or batch manifest.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required directory or video path is missing or unusable.
    #[error("Path error at {path}: {reason}")]
    Path {
        /// The offending path.
        path: PathBuf,
        /// Why the path could not be used.
        reason: String,
    },

    /// The sampling policy cannot produce a valid plan for the video.
    #[error("Planning error: {0}")]
    Planning(String),

    /// The prober could not read the video's metadata.
    #[error("Failed to probe {path}: {reason}")]
    Probe {
        /// Video that was probed.
        path: PathBuf,
        /// Prober diagnostics.
        reason: String,
    },

    /// The decoder executable could not be started.
    #[error("Failed to launch decoder {program}: {reason}")]
    DecoderLaunch {
        /// Program that was spawned.
        program: PathBuf,
        /// Underlying spawn error.
        reason: String,
    },

    /// The decoder ran but reported failure.
    #[error("Decoder failed ({status}): {diagnostics}")]
    Decode {
        /// Exit status description (e.g. `exit code 1`).
        status: String,
        /// Tail of the decoder's diagnostic output.
        diagnostics: String,
    },

    /// The decoder exited cleanly but some planned frames were not written.
    #[error("Decoder output incomplete, missing {}: {}", missing.len(), missing.join(", "))]
    IncompleteOutput {
        /// Planned filenames that are absent or unreadable.
        missing: Vec<String>,
    },

    /// The decoder did not finish within the configured timeout.
    #[error("Decoder timed out after {0:?}")]
    Timeout(Duration),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse error taxonomy used for reporting and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Contradictory or malformed input; aborts before any work.
    Configuration,
    /// Missing or uncreatable directories and video paths.
    Path,
    /// Degenerate duration or policy.
    Planning,
    /// External process failure or incomplete output.
    Decode,
    /// Unclassified filesystem failure.
    Io,
    /// Stopped by the user.
    Cancelled,
}

impl FramedumpError {
    /// Shorthand for a [`FramedumpError::Path`] error.
    pub(crate) fn path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        FramedumpError::Path {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The taxonomy bucket this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FramedumpError::Configuration(_) => ErrorCategory::Configuration,
            FramedumpError::Path { .. } => ErrorCategory::Path,
            FramedumpError::Planning(_) => ErrorCategory::Planning,
            FramedumpError::Probe { .. }
            | FramedumpError::DecoderLaunch { .. }
            | FramedumpError::Decode { .. }
            | FramedumpError::IncompleteOutput { .. }
            | FramedumpError::Timeout(_) => ErrorCategory::Decode,
            FramedumpError::Io(_) => ErrorCategory::Io,
            FramedumpError::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

/// A single file the cleaner failed to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupItemError {
    /// The file that could not be removed.
    pub path: PathBuf,
    /// The underlying OS error message.
    pub reason: String,
}

impl Display for CleanupItemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}
