//! Progress reporting and cancellation support.
//!
//! Batch runs and cleanups report one [`ProgressInfo`] per processed item
//! (a video or a deleted file) to a [`ProgressCallback`], and stop early when
//! a shared [`CancellationToken`] is cancelled.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framedump::{
//!     BatchManifest, BatchRunner, ExtractionConfig, FfmpegDecoder, FfprobeProber,
//!     ProgressCallback, ProgressInfo, SamplingPolicy,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let manifest = BatchManifest::load("videos.json")?;
//! let config = ExtractionConfig::new().with_progress(Arc::new(PrintProgress));
//! let runner = BatchRunner::new(FfprobeProber::new(), FfmpegDecoder::new()).with_config(config);
//! let report = runner.run(&manifest, SamplingPolicy::FrameCount(10))?;
//! # Ok::<(), framedump::FramedumpError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Extracting frames from a list of videos.
    FrameExtraction,
    /// Deleting previously extracted frames.
    Cleanup,
}

/// A snapshot of run progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items (videos / files) have been processed so far.
    pub current: u64,
    /// Total items expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The item that was just processed.
    pub current_item: Option<PathBuf>,
}

/// Trait for receiving progress updates.
///
/// Callbacks observe but cannot halt the operation. Use
/// [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called after each processed item.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state, so a token handed to a signal handler cancels the run
/// holding any other clone. Batch runs check it between videos and while
/// waiting on the decoder.
///
/// ```
/// use framedump::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.clone().cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks timing for one operation and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one completed item and report it.
    pub(crate) fn advance(&mut self, item: &Path) {
        self.current += 1;

        let elapsed = self.start_time.elapsed();
        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32) * 100.0);
        let estimated_remaining = self.total.map(|t| {
            let remaining = t.saturating_sub(self.current);
            let per_item = elapsed / self.current as u32;
            per_item * remaining as u32
        });

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_item: Some(item.to_path_buf()),
        });
    }
}
