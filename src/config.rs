//! Extraction configuration.
//!
//! [`ExtractionConfig`] is a builder that threads the output image format,
//! progress callbacks, cancellation tokens, and output verification through
//! [`FrameExtractor`](crate::FrameExtractor) and
//! [`BatchRunner`](crate::BatchRunner) without polluting every signature.
//!
//! # Example
//!
//! ```no_run
//! use framedump::{CancellationToken, ExtractionConfig, ImageFormat};
//!
//! let token = CancellationToken::new();
//! let config = ExtractionConfig::new()
//!     .with_image_format(ImageFormat::Jpeg)
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Image format of extracted frame files.
///
/// The decoder infers the encoder from the file extension, and the cleaner
/// only deletes files carrying this format's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Lossless PNG. This is the default.
    #[default]
    Png,
    /// JPEG, written with the `.jpg` extension.
    Jpeg,
    /// Uncompressed BMP.
    Bmp,
}

impl ImageFormat {
    /// The extension used for newly written frames, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Bmp => "bmp",
        }
    }

    /// Whether `path` carries an extension of this format (case-insensitive).
    pub fn matches(self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let extension = extension.to_ascii_lowercase();
        match self {
            ImageFormat::Jpeg => extension == "jpg" || extension == "jpeg",
            other => extension == other.extension(),
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "bmp" => Ok(ImageFormat::Bmp),
            other => Err(format!("unsupported image format: {other} (png, jpg, bmp)")),
        }
    }
}

/// Configuration for extraction runs.
///
/// All fields have sensible defaults: PNG output, no progress callback, no
/// cancellation, and header verification of every written frame.
#[derive(Clone)]
pub struct ExtractionConfig {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) image_format: ImageFormat,
    pub(crate) verify_images: bool,
}

impl Debug for ExtractionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionConfig")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("image_format", &self.image_format)
            .field("verify_images", &self.verify_images)
            .finish()
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            image_format: ImageFormat::default(),
            verify_images: true,
        }
    }

    /// Attach a progress callback, invoked once per processed video.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the running decoder is killed and the
    /// remaining videos are reported as
    /// [`FramedumpError::Cancelled`](crate::FramedumpError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set the image format of extracted frames.
    #[must_use]
    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Control whether each written frame's image header is parsed after
    /// decoding. Defaults to `true`; when disabled only existence is checked.
    #[must_use]
    pub fn with_verify_images(mut self, verify: bool) -> Self {
        self.verify_images = verify;
        self
    }

    /// The configured output image format.
    pub fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
