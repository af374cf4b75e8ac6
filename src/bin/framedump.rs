use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::{ArgGroup, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::{ColoredString, Colorize};
use framedump::{
    BatchRunner, CancellationToken, Cleaner, CleanupReport, ExtractionConfig, FfmpegDecoder,
    FfprobeProber, ImageFormat, InputSource, ProgressCallback, ProgressInfo, RunReport,
    SamplingPolicy, locate_ffmpeg,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter};
use serde_json::json;

const CLI_AFTER_HELP: &str = concat!(
    "Examples:\n",
    "  framedump extract --path talk.mp4 --num-frames 20\n",
    "  framedump extract --path videos.json --interval-sec 2.5\n",
    "  framedump --progress extract --path videos.json --num-frames 10 --json\n",
    "  framedump delete --target-path clips\n",
    "  framedump completions zsh > _framedump"
);

#[derive(Debug, Parser)]
#[command(
    name = "framedump",
    version,
    about = "Extract still frames from video files, singly or in batches",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// ffmpeg executable; ffprobe is expected next to it.
    #[arg(long, env = "FRAMEDUMP_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// Also append log lines to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract frames from a video or every video of a .json manifest.
    #[command(
        about = "Extract frames from video(s)",
        group(ArgGroup::new("sampling").required(true).args(["num_frames", "interval_sec"])),
        after_help = concat!(
            "Examples:\n",
            "  framedump extract --path talk.mp4 --num-frames 20 --output-dir out\n",
            "  framedump extract --path videos.json --interval-sec 00:00:05 --timeout 10:00"
        )
    )]
    Extract {
        /// Path to a single video or a batch .json manifest.
        #[arg(long)]
        path: PathBuf,
        /// Output directory. Single videos only; ignored for manifests.
        #[arg(long, alias = "output_dir")]
        output_dir: Option<PathBuf>,
        /// Total number of frames to extract per video.
        #[arg(long, alias = "num_frames")]
        num_frames: Option<u32>,
        /// Seconds between frames (2.5, 01:30 or 00:01:30).
        #[arg(long, alias = "interval_sec", value_parser = parse_seconds)]
        interval_sec: Option<f64>,
        /// Output image format (png, jpg, bmp).
        #[arg(long, default_value = "png")]
        format: ImageFormat,
        /// Kill the decoder when a single video takes longer than this.
        #[arg(long, value_parser = parse_timeout)]
        timeout: Option<Duration>,
        /// Only check that frames exist, without parsing their headers.
        #[arg(long)]
        no_verify: bool,
        /// Print the run report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete extracted frames from a frames directory or a video folder.
    #[command(
        about = "Delete extracted frames",
        after_help = concat!(
            "Examples:\n",
            "  framedump delete --target-path clips\n",
            "  framedump delete --target-path clips/frames --format jpg"
        )
    )]
    Delete {
        /// A video's parent directory or the frames directory itself.
        #[arg(long, alias = "target_path")]
        target_path: PathBuf,
        /// Image format of the frames to delete (png, jpg, bmp).
        #[arg(long, default_value = "png")]
        format: ImageFormat,
        /// Print the cleanup report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse seconds as a plain number or an `[HH:]MM:SS[.fff]` timecode.
fn parse_timecode(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".to_string());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return Ok(seconds);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid time format: {trimmed}"));
    }

    let number = |part: &str| -> Result<f64, String> {
        part.parse::<f64>()
            .map_err(|_| format!("invalid time format: {trimmed}"))
    };
    let (hours, minutes, seconds) = if parts.len() == 3 {
        (number(parts[0])?, number(parts[1])?, number(parts[2])?)
    } else {
        (0.0, number(parts[0])?, number(parts[1])?)
    };

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    parse_timecode(value)
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let seconds = parse_timecode(value)?;
    match Duration::try_from_secs_f64(seconds) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        _ => Err(format!("timeout must be positive: {value}")),
    }
}

fn short_level(level: Level) -> ColoredString {
    match level {
        Level::Error => "E".red().bold(),
        Level::Warn => "W".yellow().bold(),
        Level::Info => "i".normal(),
        Level::Debug => "d".dimmed(),
        Level::Trace => "t".dimmed(),
    }
}

fn init_logger(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let console_level = if global.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut dispatch = fern::Dispatch::new().level(LevelFilter::Debug).chain(
        fern::Dispatch::new()
            .level(console_level)
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}  {}   {}",
                    Local::now().format("%H:%M:%S"),
                    short_level(record.level()),
                    message
                ))
            })
            .chain(std::io::stderr()),
    );

    if let Some(path) = &global.log_file {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} - {:<8} - {:<15} - {}",
                        Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(fern::log_file(path)?),
        );
    }

    dispatch.apply()?;
    Ok(())
}

fn install_interrupt_handler(token: CancellationToken) {
    let result = ctrlc::set_handler(move || {
        if !token.is_cancelled() {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                "interrupted, stopping after the current video".yellow()
            );
        }
        token.cancel();
    });
    if let Err(error) = result {
        log::warn!("Could not install interrupt handler: {error}");
    }
}

fn progress_bar(
    enabled: bool,
    total: usize,
) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    let bar = ProgressBar::new(total as u64);
    let style =
        ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
    bar.set_style(style.progress_chars("##-"));
    Ok(Some(bar))
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if let Some(name) = info.current_item.as_deref().and_then(Path::file_name) {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn run_report_json(report: &RunReport) -> serde_json::Value {
    let results: Vec<_> = report
        .results
        .iter()
        .map(|result| {
            json!({
                "video": display_path(&result.video),
                "output_dir": result.output_dir.as_deref().map(display_path),
                "status": if result.is_success() { "success" } else { "failure" },
                "frame_count": result.frame_count(),
                "error": result.error().map(|error| error.to_string()),
                "category": result.error().map(|error| format!("{:?}", error.category())),
            })
        })
        .collect();

    json!({
        "succeeded": report.succeeded(),
        "failed": report.failed(),
        "total_frames": report.total_frames(),
        "results": results,
    })
}

fn cleanup_report_json(report: &CleanupReport) -> serde_json::Value {
    json!({
        "directory": display_path(&report.directory),
        "files_deleted": report.files_deleted,
        "errors": report.errors.iter().map(|error| json!({
            "path": display_path(&error.path),
            "reason": error.reason,
        })).collect::<Vec<_>>(),
    })
}

fn print_run_report(report: &RunReport) {
    for result in &report.results {
        match (result.frame_count(), result.error()) {
            (Some(frame_count), _) => println!(
                "{} {} ({frame_count} frame(s) -> {})",
                "ok".green().bold(),
                result.video.display(),
                result.output_dir.as_deref().map(display_path).unwrap_or_default()
            ),
            (None, Some(error)) => println!(
                "{} {}: {}",
                "failed".red().bold(),
                result.video.display(),
                error.to_string().red()
            ),
            (None, None) => {}
        }
    }

    let summary = format!(
        "{} of {} video(s) succeeded, {} frame(s) written",
        report.succeeded(),
        report.len(),
        report.total_frames()
    );
    if report.is_success() {
        println!("{} {}", "success:".green().bold(), summary.green());
    } else {
        println!("{} {}", "failure:".red().bold(), summary.red());
    }
}

fn print_cleanup_report(report: &CleanupReport) {
    for error in &report.errors {
        println!("{} {}", "failed".red().bold(), error.to_string().red());
    }
    let summary = format!(
        "Deleted {} file(s) from {}",
        report.files_deleted,
        report.directory.display()
    );
    if report.is_success() {
        println!("{} {}", "success:".green().bold(), summary.green());
    } else {
        println!("{} {}", "failure:".red().bold(), summary.red());
    }
}

/// Runs the selected command; `Ok(false)` means some item failed.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(&cli.global)?;

    match cli.command {
        Commands::Extract {
            path,
            output_dir,
            num_frames,
            interval_sec,
            format,
            timeout,
            no_verify,
            json,
        } => {
            let policy = SamplingPolicy::from_options(num_frames, interval_sec)?;
            let source = InputSource::from_path(&path, output_dir)?;

            let ffmpeg = cli.global.ffmpeg.clone().unwrap_or_else(locate_ffmpeg);
            let prober = FfprobeProber::beside(&ffmpeg);
            let mut decoder = FfmpegDecoder::new().with_program(&ffmpeg);
            if let Some(timeout) = timeout {
                decoder = decoder.with_timeout(timeout);
            }
            log::debug!(
                "Using {} and {}",
                decoder.program().display(),
                prober.program().display()
            );

            let token = CancellationToken::new();
            install_interrupt_handler(token.clone());

            let mut config = ExtractionConfig::new()
                .with_image_format(format)
                .with_verify_images(!no_verify)
                .with_cancellation(token);
            let bar = progress_bar(cli.global.progress, source.len())?;
            if let Some(bar) = &bar {
                config = config.with_progress(Arc::new(TerminalProgress { bar: bar.clone() }));
            }

            let runner = BatchRunner::new(prober, decoder).with_config(config);
            let report = runner.run_source(&source, policy)?;

            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&run_report_json(&report))?);
            } else {
                print_run_report(&report);
            }
            Ok(report.is_success())
        }
        Commands::Delete {
            target_path,
            format,
            json,
        } => {
            let mut cleaner = Cleaner::new(format);
            let bar = progress_bar(cli.global.progress, 0)?;
            if let Some(bar) = &bar {
                cleaner = cleaner.with_progress(Arc::new(TerminalProgress { bar: bar.clone() }));
            }

            let report = cleaner.clean(&target_path)?;

            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&cleanup_report_json(&report))?);
            } else {
                print_cleanup_report(&report);
            }
            Ok(report.is_success())
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framedump", &mut std::io::stdout());
            Ok(true)
        }
    }
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}
