//! Single-video frame extraction.
//!
//! [`FrameExtractor`] hands a whole [`ExtractionPlan`] to a [`Decoder`] in one
//! call and then checks the output directory itself: a video only counts as
//! a success when every planned file exists (and, by default, parses as an
//! image). A decoder that exits cleanly but skips frames is a failure.

use std::path::Path;

use crate::config::ExtractionConfig;
use crate::decoder::{DecodeRequest, Decoder};
use crate::error::FramedumpError;
use crate::planner::ExtractionPlan;
use crate::report::ExtractionResult;

/// Drives a [`Decoder`] for one video at a time.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use framedump::{FfmpegDecoder, FrameExtractor, SamplingPolicy, plan};
///
/// let extractor = FrameExtractor::new(FfmpegDecoder::new());
/// let plan = plan(30.0, SamplingPolicy::FrameCount(15))?;
/// let result = extractor.extract(Path::new("talk.mp4"), &plan, Path::new("talk_frames"));
/// println!("{result}");
/// # Ok::<(), framedump::FramedumpError>(())
/// ```
#[derive(Debug)]
pub struct FrameExtractor<D> {
    decoder: D,
    config: ExtractionConfig,
}

impl<D: Decoder> FrameExtractor<D> {
    /// Create an extractor with the default configuration.
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            config: ExtractionConfig::new(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// The wrapped decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Materialize `plan` for `video` into `output_dir`.
    ///
    /// Never panics or returns early on decoder problems; the outcome is
    /// always captured in the returned [`ExtractionResult`].
    pub fn extract(
        &self,
        video: &Path,
        plan: &ExtractionPlan,
        output_dir: &Path,
    ) -> ExtractionResult {
        match self.try_extract(video, plan, output_dir) {
            Ok(frame_count) => {
                log::info!(
                    "Extracted {frame_count} frame(s) from {} to {}",
                    video.display(),
                    output_dir.display()
                );
                ExtractionResult::success(video, output_dir, frame_count)
            }
            Err(error) => {
                log::error!("Could not extract {}: {error}", video.display());
                ExtractionResult::failure(video, Some(output_dir.to_path_buf()), error)
            }
        }
    }

    fn try_extract(
        &self,
        video: &Path,
        plan: &ExtractionPlan,
        output_dir: &Path,
    ) -> Result<usize, FramedumpError> {
        if self.config.is_cancelled() {
            return Err(FramedumpError::Cancelled);
        }

        let request = DecodeRequest {
            video,
            plan,
            output_dir,
            cancellation: self.config.cancellation.as_ref(),
        };
        let output = self.decoder.decode(&request)?;
        if !output.success {
            return Err(FramedumpError::Decode {
                status: output.status,
                diagnostics: output.diagnostics,
            });
        }
        if !output.diagnostics.is_empty() {
            log::debug!("Decoder output for {}: {}", video.display(), output.diagnostics);
        }

        let missing: Vec<String> = plan
            .filenames()
            .filter(|name| !self.is_written(&output_dir.join(name)))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(FramedumpError::IncompleteOutput { missing });
        }

        Ok(plan.len())
    }

    fn is_written(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        if !self.config.verify_images {
            return true;
        }
        match image::image_dimensions(path) {
            Ok(_) => true,
            Err(error) => {
                log::warn!("Unreadable frame {}: {error}", path.display());
                false
            }
        }
    }
}
