//! Batch manifests and input sources.
//!
//! A manifest is a JSON document with a single `videos` list:
//!
//! ```json
//! { "videos": ["clips/a.mp4", "clips/b.mkv"] }
//! ```
//!
//! It is read and validated completely before any video is touched, so a
//! malformed manifest aborts the run without side effects. Relative entries
//! are resolved against the current working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::FramedumpError;

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    videos: Vec<String>,
}

/// A validated, non-empty, ordered list of videos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchManifest {
    videos: Vec<PathBuf>,
}

impl BatchManifest {
    /// Build a manifest from paths.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Configuration`] if the list is empty or an entry is
    /// an empty path.
    pub fn new(videos: Vec<PathBuf>) -> Result<Self, FramedumpError> {
        if videos.is_empty() {
            return Err(FramedumpError::Configuration(
                "manifest contains no videos".to_string(),
            ));
        }
        if let Some(position) = videos.iter().position(|v| v.as_os_str().is_empty()) {
            return Err(FramedumpError::Configuration(format!(
                "manifest entry {} is an empty path",
                position + 1
            )));
        }
        Ok(Self { videos })
    }

    /// Parse a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Configuration`] if the JSON is malformed, has no
    /// `videos` list, contains non-string or blank entries, or the list is
    /// empty.
    ///
    /// ```
    /// use framedump::BatchManifest;
    ///
    /// let manifest = BatchManifest::from_json_str(r#"{"videos": ["a.mp4", "b.mp4"]}"#)?;
    /// assert_eq!(manifest.len(), 2);
    /// assert!(BatchManifest::from_json_str(r#"{"videos": []}"#).is_err());
    /// # Ok::<(), framedump::FramedumpError>(())
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, FramedumpError> {
        let document: ManifestDocument = serde_json::from_str(json).map_err(|error| {
            FramedumpError::Configuration(format!(
                "manifest must be an object with a \"videos\" list of paths: {error}"
            ))
        })?;

        if let Some(position) = document.videos.iter().position(|v| v.trim().is_empty()) {
            return Err(FramedumpError::Configuration(format!(
                "manifest entry {} is an empty path",
                position + 1
            )));
        }

        Self::new(document.videos.into_iter().map(PathBuf::from).collect())
    }

    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Configuration`] if the file cannot be read or is
    /// invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FramedumpError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|error| {
            FramedumpError::Configuration(format!(
                "cannot read manifest {}: {error}",
                path.display()
            ))
        })?;
        let manifest = Self::from_json_str(&text).map_err(|error| match error {
            FramedumpError::Configuration(reason) => {
                FramedumpError::Configuration(format!("{}: {reason}", path.display()))
            }
            other => other,
        })?;
        log::info!("Loaded {} video(s) from {}", manifest.len(), path.display());
        Ok(manifest)
    }

    /// The videos in manifest order.
    pub fn videos(&self) -> &[PathBuf] {
        &self.videos
    }

    /// Number of videos.
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    /// Always `false`; manifests are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

/// Returns `true` if `path` names a manifest (a `.json` file).
pub fn is_manifest_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// What a run should process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// One video, optionally with an explicit output directory.
    SingleVideo {
        /// The video to extract.
        path: PathBuf,
        /// Output directory overriding `<video_parent>/frames`.
        output_override: Option<PathBuf>,
    },
    /// Every video of a manifest, each into its own derived directory.
    Manifest(BatchManifest),
}

impl InputSource {
    /// Interpret a command-line path: `.json` files are manifests, anything
    /// else is a single video.
    ///
    /// An output directory given together with a manifest is ignored with a
    /// warning; batch runs always derive output directories.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Configuration`] if a manifest cannot be loaded.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        output_override: Option<PathBuf>,
    ) -> Result<Self, FramedumpError> {
        let path = path.as_ref();
        if !is_manifest_path(path) {
            return Ok(InputSource::SingleVideo {
                path: path.to_path_buf(),
                output_override,
            });
        }

        if let Some(ignored) = output_override {
            log::warn!(
                "Output directory {} is ignored for batch manifests",
                ignored.display()
            );
        }
        BatchManifest::load(path).map(InputSource::Manifest)
    }

    /// Number of videos this source will process.
    pub fn len(&self) -> usize {
        match self {
            InputSource::SingleVideo { .. } => 1,
            InputSource::Manifest(manifest) => manifest.len(),
        }
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
