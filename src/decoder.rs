//! The external decoder capability.
//!
//! [`Decoder`] materializes a whole [`ExtractionPlan`] into image files in one
//! call. [`FfmpegDecoder`] implements it with a single `ffmpeg` process and a
//! single decode pass per video: a `select` filter keeps exactly the planned
//! frames and the image muxer numbers them into the planned filenames. The
//! filter is handed over as a script file, so the command line stays the same
//! size however many frames are planned.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ImageFormat;
use crate::error::FramedumpError;
use crate::planner::ExtractionPlan;
use crate::progress::CancellationToken;
use crate::utilities::{DIAGNOSTICS_LIMIT, truncate_diagnostics};

/// Everything a decoder needs to realize one plan.
#[derive(Debug, Clone, Copy)]
pub struct DecodeRequest<'a> {
    /// Source video.
    pub video: &'a Path,
    /// Capture points and their filenames.
    pub plan: &'a ExtractionPlan,
    /// Directory the planned filenames are written into.
    pub output_dir: &'a Path,
    /// Checked while waiting on the decoder.
    pub cancellation: Option<&'a CancellationToken>,
}

/// How a decoder invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOutput {
    /// Whether the decoder reported success.
    pub success: bool,
    /// Human-readable exit status, e.g. `exit code 1`.
    pub status: String,
    /// Diagnostic output (stderr) of the decoder.
    pub diagnostics: String,
}

/// Writes one image file per capture point of a plan.
///
/// Implementations must only create the files named by the plan inside
/// [`DecodeRequest::output_dir`]. Whether every file was actually written is
/// checked by the caller, not trusted from the implementation.
pub trait Decoder {
    /// Decode the planned frames of `request.video`.
    ///
    /// # Errors
    ///
    /// [`FramedumpError::DecoderLaunch`] if the decoder cannot be started,
    /// [`FramedumpError::Timeout`] or [`FramedumpError::Cancelled`] if it was
    /// stopped before finishing. A decoder that runs and fails returns
    /// `Ok` with [`DecoderOutput::success`] set to `false`.
    fn decode(&self, request: &DecodeRequest<'_>) -> Result<DecoderOutput, FramedumpError>;
}

/// Locate the `ffmpeg` executable to use.
///
/// A `bin/ffmpeg` (or `bin/ffmpeg.exe`) bundled beside the running
/// executable wins; otherwise `ffmpeg` is resolved through `PATH`.
pub fn locate_ffmpeg() -> PathBuf {
    let name = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };
    let bundled = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("bin").join(name)))
        .filter(|candidate| candidate.is_file());

    match bundled {
        Some(path) => {
            log::debug!("Using bundled decoder at {}", path.display());
            path
        }
        None => PathBuf::from(name),
    }
}

/// [`Decoder`] backed by the `ffmpeg` executable.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use framedump::FfmpegDecoder;
///
/// let decoder = FfmpegDecoder::new()
///     .with_program("/opt/ffmpeg/bin/ffmpeg")
///     .with_timeout(Duration::from_secs(120));
/// ```
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    program: PathBuf,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegDecoder {
    /// Use `ffmpeg` from `PATH`, with no timeout.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            timeout: None,
            poll_interval: Duration::from_millis(25),
        }
    }

    /// Use a specific `ffmpeg` executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill the decoder if a single video takes longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The executable this decoder runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The configured per-video timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Command-line arguments for `request`, excluding the program name.
    ///
    /// `filter_script` is the file holding [`selection_filter`] for the plan.
    pub fn arguments(&self, request: &DecodeRequest<'_>, filter_script: &Path) -> Vec<OsString> {
        let plan = request.plan;
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
            .into_iter()
            .map(OsString::from)
            .collect();

        args.push("-i".into());
        args.push(request.video.as_os_str().to_owned());
        args.push("-filter_script:v".into());
        args.push(filter_script.as_os_str().to_owned());
        args.push("-an".into());
        args.push("-fps_mode".into());
        args.push("passthrough".into());
        args.push("-frames:v".into());
        args.push(plan.len().to_string().into());
        if plan.image_format() == ImageFormat::Jpeg {
            args.push("-q:v".into());
            args.push("2".into());
        }
        args.push("-start_number".into());
        args.push("1".into());
        args.push(request.output_dir.join(plan.filename_pattern()).into_os_string());

        args
    }
}

/// The `select` filter keeping exactly the planned frames, in ffmpeg
/// filtergraph syntax.
///
/// Plans pinned to frame numbers select by frame index through a balanced
/// tree of `if(lt(n,..))` tests, so every decoded frame costs a logarithmic
/// number of comparisons. Plans without a frame rate keep the first frame at
/// or after each capture time, tracking the next capture time in register 0
/// and the number of selected frames in register 1.
///
/// ```
/// use framedump::{SamplingPolicy, plan, selection_filter};
///
/// let plan = plan(8.0, SamplingPolicy::Interval(2.0))?;
/// assert_eq!(
///     selection_filter(&plan),
///     "select='if(gte(t,ld(0))*lt(ld(1),4),gt(st(0,st(1,ld(1)+1)*2)+1,0),0)'"
/// );
/// # Ok::<(), framedump::FramedumpError>(())
/// ```
pub fn selection_filter(plan: &ExtractionPlan) -> String {
    let frames: Option<Vec<u64>> = plan.iter().map(|point| point.frame_number).collect();
    let expression = match frames {
        Some(frames) if !frames.is_empty() => frame_tree(&frames),
        _ => format!(
            "if(gte(t,ld(0))*lt(ld(1),{}),gt(st(0,st(1,ld(1)+1)*{})+1,0),0)",
            plan.len(),
            plan.step_seconds()
        ),
    };
    format!("select='{expression}'")
}

/// `frames` must be non-empty and strictly increasing.
fn frame_tree(frames: &[u64]) -> String {
    if let [frame] = frames {
        return format!("eq(n,{frame})");
    }
    let (low, high) = frames.split_at(frames.len() / 2);
    format!("if(lt(n,{}),{},{})", high[0], frame_tree(low), frame_tree(high))
}

impl Decoder for FfmpegDecoder {
    fn decode(&self, request: &DecodeRequest<'_>) -> Result<DecoderOutput, FramedumpError> {
        log::debug!(
            "Running {} on {} for {} frame(s)",
            self.program.display(),
            request.video.display(),
            request.plan.len()
        );

        let mut script = tempfile::Builder::new()
            .prefix("framedump-")
            .suffix(".filter")
            .tempfile()?;
        script.write_all(selection_filter(request.plan).as_bytes())?;
        script.flush()?;

        let mut child = Command::new(&self.program)
            .args(self.arguments(request, script.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| FramedumpError::DecoderLaunch {
                program: self.program.clone(),
                reason: error.to_string(),
            })?;

        // Drain stderr concurrently so a chatty decoder never blocks on a full pipe.
        let stderr = child.stderr.take();
        let reader = thread::spawn(move || {
            let mut bytes = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut bytes);
            }
            String::from_utf8_lossy(&bytes).into_owned()
        });

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if request.cancellation.is_some_and(|token| token.is_cancelled()) {
                terminate(&mut child);
                let _ = reader.join();
                return Err(FramedumpError::Cancelled);
            }
            if let Some(timeout) = self.timeout.filter(|&t| started.elapsed() >= t) {
                terminate(&mut child);
                let _ = reader.join();
                return Err(FramedumpError::Timeout(timeout));
            }
            thread::sleep(self.poll_interval);
        };

        let diagnostics = reader.join().unwrap_or_default();
        Ok(DecoderOutput {
            success: status.success(),
            status: describe_status(status),
            diagnostics: truncate_diagnostics(&diagnostics, DIAGNOSTICS_LIMIT),
        })
    }
}

fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
