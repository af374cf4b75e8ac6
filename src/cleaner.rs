//! Removal of previously extracted frames.
//!
//! The cleaner accepts either a frames directory or the directory holding
//! the videos (in which case its `frames` subfolder is cleaned). It only
//! ever deletes regular files with the frame image extension from that one
//! directory: nothing recursive, no other file types, never the directory.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ImageFormat;
use crate::error::{CleanupItemError, FramedumpError};
use crate::paths::FRAMES_DIRECTORY;
use crate::progress::{OperationType, ProgressCallback, ProgressTracker};

/// Outcome of a cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// The directory that was cleaned.
    pub directory: PathBuf,
    /// Number of frame files removed.
    pub files_deleted: usize,
    /// Files that matched but could not be removed, in directory order.
    pub errors: Vec<CleanupItemError>,
}

impl CleanupReport {
    /// Returns `true` if every matching file was removed.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Display for CleanupReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(
            f,
            "Deleted {} file(s) from {}",
            self.files_deleted,
            self.directory.display()
        )?;
        for error in &self.errors {
            writeln!(f, "[ERROR] {error}")?;
        }
        Ok(())
    }
}

/// Delete extracted PNG frames under `target`.
///
/// # Errors
///
/// See [`clean_with_format`].
///
/// # Example
///
/// ```no_run
/// let report = framedump::clean("clips".as_ref())?;
/// println!("{report}");
/// # Ok::<(), framedump::FramedumpError>(())
/// ```
pub fn clean(target: &Path) -> Result<CleanupReport, FramedumpError> {
    clean_with_format(target, ImageFormat::Png)
}

/// Delete extracted frames of `format` under `target`.
///
/// # Errors
///
/// [`FramedumpError::Path`] if the resolved directory does not exist or is
/// not a directory. Individual files that cannot be deleted are reported in
/// [`CleanupReport::errors`] instead.
pub fn clean_with_format(
    target: &Path,
    format: ImageFormat,
) -> Result<CleanupReport, FramedumpError> {
    Cleaner::new(format).clean(target)
}

/// Directory a cleanup of `target` operates on.
///
/// `target/frames` when it is a directory and `target` is not itself named
/// `frames`, otherwise `target`.
pub fn resolve_cleanup_directory(target: &Path) -> PathBuf {
    let named_frames = target
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(FRAMES_DIRECTORY));
    if !named_frames {
        let nested = target.join(FRAMES_DIRECTORY);
        if nested.is_dir() {
            return nested;
        }
    }
    target.to_path_buf()
}

/// Configurable cleanup with progress reporting.
#[derive(Clone)]
pub struct Cleaner {
    format: ImageFormat,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl Cleaner {
    /// A cleaner deleting files of `format`.
    pub fn new(format: ImageFormat) -> Self {
        Self {
            format,
            progress: None,
        }
    }

    /// Report each deleted file to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Run the cleanup. See [`clean_with_format`].
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Path`] if the resolved directory is missing.
    pub fn clean(&self, target: &Path) -> Result<CleanupReport, FramedumpError> {
        let directory = resolve_cleanup_directory(target);
        if !directory.exists() {
            return Err(FramedumpError::path(directory, "directory does not exist"));
        }
        if !directory.is_dir() {
            return Err(FramedumpError::path(directory, "not a directory"));
        }

        let mut report = CleanupReport {
            directory: directory.clone(),
            files_deleted: 0,
            errors: Vec::new(),
        };

        let mut candidates = Vec::new();
        for entry in fs::read_dir(&directory)? {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let is_file = entry.file_type().is_ok_and(|t| t.is_file());
                    if is_file && self.format.matches(&path) {
                        candidates.push(path);
                    }
                }
                Err(error) => report.errors.push(CleanupItemError {
                    path: directory.clone(),
                    reason: error.to_string(),
                }),
            }
        }
        candidates.sort();

        if candidates.is_empty() {
            log::info!("No .{} files found in {}", self.format, directory.display());
            return Ok(report);
        }

        log::info!(
            "Deleting {} .{} file(s) from {}",
            candidates.len(),
            self.format,
            directory.display()
        );
        let mut tracker = self.progress.clone().map(|callback| {
            ProgressTracker::new(callback, OperationType::Cleanup, Some(candidates.len() as u64))
        });

        for path in candidates {
            match fs::remove_file(&path) {
                Ok(()) => report.files_deleted += 1,
                Err(error) => {
                    log::error!("Error deleting {}: {error}", path.display());
                    report.errors.push(CleanupItemError {
                        path: path.clone(),
                        reason: error.to_string(),
                    });
                }
            }
            if let Some(tracker) = tracker.as_mut() {
                tracker.advance(&path);
            }
        }

        Ok(report)
    }
}
