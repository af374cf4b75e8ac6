//! Output directory resolution.
//!
//! Every video's frames go to a `frames` folder next to the video unless a
//! single-video run names an explicit directory. Batch runs always derive
//! the directory per video so that videos never share an output folder.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FramedumpError;

/// Name of the derived output folder created beside each video.
pub const FRAMES_DIRECTORY: &str = "frames";

/// Whether a run processes one video or a manifest of videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One video; an explicit output directory is honored.
    Single,
    /// Many videos; explicit output directories are ignored.
    Batch,
}

/// The derived `<video_parent>/frames` directory, without touching the disk.
pub fn derived_output_directory(video: &Path) -> PathBuf {
    video_parent(video).join(FRAMES_DIRECTORY)
}

/// Resolve and create the output directory for `video`.
///
/// In [`RunMode::Batch`] `explicit_output` is ignored. The returned path is
/// absolute and the directory exists when this returns `Ok`.
///
/// # Errors
///
/// [`FramedumpError::Path`] if the video's parent directory is missing, the
/// output path exists but is not a directory, or it cannot be created.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use framedump::{RunMode, resolve_output_directory};
///
/// let dir = resolve_output_directory(Path::new("clips/a.mp4"), None, RunMode::Single)?;
/// assert!(dir.ends_with("clips/frames"));
/// # Ok::<(), framedump::FramedumpError>(())
/// ```
pub fn resolve_output_directory(
    video: &Path,
    explicit_output: Option<&Path>,
    mode: RunMode,
) -> Result<PathBuf, FramedumpError> {
    let target = match explicit_output {
        Some(explicit) if mode == RunMode::Single => explicit.to_path_buf(),
        ignored => {
            if let Some(explicit) = ignored {
                log::warn!(
                    "Ignoring output directory {} in batch mode",
                    explicit.display()
                );
            }
            let parent = video_parent(video);
            if !parent.is_dir() {
                return Err(FramedumpError::path(
                    parent,
                    "parent directory of the video does not exist",
                ));
            }
            derived_output_directory(video)
        }
    };

    let target = std::path::absolute(&target).map_err(|error| {
        FramedumpError::path(&target, format!("cannot make path absolute: {error}"))
    })?;

    if target.exists() && !target.is_dir() {
        return Err(FramedumpError::path(
            target,
            "output path exists and is not a directory",
        ));
    }

    fs::create_dir_all(&target).map_err(|error| {
        FramedumpError::path(&target, format!("cannot create output directory: {error}"))
    })?;

    log::debug!("Output directory for {}: {}", video.display(), target.display());
    Ok(target)
}

/// Parent directory of a video; `.` for a bare file name.
fn video_parent(video: &Path) -> &Path {
    match video.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
