//! Unattended multi-video runs.
//!
//! [`BatchRunner`] processes videos strictly one after another, in input
//! order. For each video it probes metadata, plans the captures, resolves the
//! output directory, and extracts. Whatever goes wrong with one video is
//! recorded as that video's failure and the run moves on to the next.
//!
//! Videos sharing a parent folder would share its derived `frames`
//! directory and overwrite each other's frames. Only the first of them is
//! extracted; the others fail with a [`FramedumpError::Path`] naming it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::ExtractionConfig;
use crate::decoder::Decoder;
use crate::error::FramedumpError;
use crate::extractor::FrameExtractor;
use crate::manifest::{BatchManifest, InputSource};
use crate::paths::{RunMode, derived_output_directory, resolve_output_directory};
use crate::planner::{ExtractionPlan, SamplingPolicy};
use crate::probe::Prober;
use crate::progress::{OperationType, ProgressTracker};
use crate::report::{ExtractionResult, RunReport};

/// Runs extraction over one video or a whole manifest.
///
/// # Example
///
/// ```no_run
/// use framedump::{BatchManifest, BatchRunner, FfmpegDecoder, FfprobeProber, SamplingPolicy};
///
/// let manifest = BatchManifest::load("videos.json")?;
/// let runner = BatchRunner::new(FfprobeProber::new(), FfmpegDecoder::new());
/// let report = runner.run(&manifest, SamplingPolicy::FrameCount(20))?;
/// for result in &report.results {
///     println!("{result}");
/// }
/// # Ok::<(), framedump::FramedumpError>(())
/// ```
#[derive(Debug)]
pub struct BatchRunner<P, D> {
    prober: P,
    extractor: FrameExtractor<D>,
}

impl<P: Prober, D: Decoder> BatchRunner<P, D> {
    /// Create a runner with the default configuration.
    pub fn new(prober: P, decoder: D) -> Self {
        Self {
            prober,
            extractor: FrameExtractor::new(decoder),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.extractor = self.extractor.with_config(config);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ExtractionConfig {
        self.extractor.config()
    }

    /// Extract every video of `manifest`, each into `<video_parent>/frames`.
    ///
    /// The report has exactly one entry per manifest entry, in order.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Planning`] if `policy` is invalid; nothing is
    /// touched in that case. Per-video problems never produce an `Err`.
    pub fn run(
        &self,
        manifest: &BatchManifest,
        policy: SamplingPolicy,
    ) -> Result<RunReport, FramedumpError> {
        policy.validate()?;
        let items: Vec<(&Path, Option<&Path>)> = manifest
            .videos()
            .iter()
            .map(|video| (video.as_path(), None))
            .collect();
        Ok(self.run_items(&items, RunMode::Batch, policy))
    }

    /// Extract whatever `source` names.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::Planning`] if `policy` is invalid.
    pub fn run_source(
        &self,
        source: &InputSource,
        policy: SamplingPolicy,
    ) -> Result<RunReport, FramedumpError> {
        match source {
            InputSource::SingleVideo {
                path,
                output_override,
            } => {
                policy.validate()?;
                let items = [(path.as_path(), output_override.as_deref())];
                Ok(self.run_items(&items, RunMode::Single, policy))
            }
            InputSource::Manifest(manifest) => self.run(manifest, policy),
        }
    }

    /// Probe, plan, resolve, and extract a single video.
    pub fn extract_video(
        &self,
        video: &Path,
        explicit_output: Option<&Path>,
        mode: RunMode,
        policy: SamplingPolicy,
    ) -> ExtractionResult {
        match self.prepare(video, explicit_output, mode, policy) {
            Ok((plan, output_dir)) => self.extractor.extract(video, &plan, &output_dir),
            Err(error) => {
                log::error!("Could not process {}: {error}", video.display());
                ExtractionResult::failure(video, None, error)
            }
        }
    }

    fn run_items(
        &self,
        items: &[(&Path, Option<&Path>)],
        mode: RunMode,
        policy: SamplingPolicy,
    ) -> RunReport {
        let config = self.extractor.config();
        let total = items.len();
        let mut tracker = ProgressTracker::new(
            config.progress.clone(),
            OperationType::FrameExtraction,
            Some(total as u64),
        );
        let mut report = RunReport::default();
        // Output directory -> video that wrote into it.
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();

        log::info!("Processing {total} video(s), {policy}");
        for (position, &(video, explicit_output)) in items.iter().enumerate() {
            if config.is_cancelled() {
                log::warn!("Cancelled, skipping {} remaining video(s)", total - position);
                report.results.extend(items[position..].iter().map(|&(skipped, _)| {
                    ExtractionResult::failure(skipped, None, FramedumpError::Cancelled)
                }));
                break;
            }

            log::info!("[{}/{total}] {}", position + 1, video.display());
            let shared = match mode {
                RunMode::Batch => shared_output_directory(&claimed, video),
                RunMode::Single => None,
            };
            let result = match shared {
                Some((directory, earlier)) => {
                    let error = FramedumpError::path(
                        directory,
                        format!("output directory shared with {}", earlier.display()),
                    );
                    log::error!("Could not process {}: {error}", video.display());
                    ExtractionResult::failure(video, None, error)
                }
                None => self.extract_video(video, explicit_output, mode, policy),
            };
            if let Some(directory) = &result.output_dir {
                claimed.entry(directory.clone()).or_insert(video);
            }
            report.results.push(result);
            tracker.advance(video);
        }

        log::info!("{} of {total} video(s) succeeded", report.succeeded());
        report
    }

    /// Everything up to the decoder call. Planning runs before the output
    /// directory is created, so a bad policy leaves no empty folders behind.
    fn prepare(
        &self,
        video: &Path,
        explicit_output: Option<&Path>,
        mode: RunMode,
        policy: SamplingPolicy,
    ) -> Result<(ExtractionPlan, PathBuf), FramedumpError> {
        if !video.is_file() {
            let reason = if video.exists() {
                "not a regular file"
            } else {
                "video file not found"
            };
            return Err(FramedumpError::path(video, reason));
        }

        let metadata = self.prober.probe(video)?;
        let image_format = self.extractor.config().image_format();
        let plan = ExtractionPlan::for_video(&metadata, policy, image_format)?;
        let output_dir = resolve_output_directory(video, explicit_output, mode)?;
        Ok((plan, output_dir))
    }
}

/// The derived output directory of `video` and the earlier video of this run
/// that already wrote into it, if any.
fn shared_output_directory<'a>(
    claimed: &HashMap<PathBuf, &'a Path>,
    video: &Path,
) -> Option<(PathBuf, &'a Path)> {
    let directory = std::path::absolute(derived_output_directory(video)).ok()?;
    let earlier = claimed.get(&directory).copied()?;
    Some((directory, earlier))
}
