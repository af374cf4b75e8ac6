//! In-process stand-ins for `ffprobe` and `ffmpeg`.
//!
//! [`FakeDecoder`] writes real (tiny) PNG files so the extractor's output
//! verification runs exactly as it does against ffmpeg.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use framedump::{
    CancellationToken, DecodeRequest, Decoder, DecoderOutput, FramedumpError, Prober, VideoMetadata,
};

/// Write a placeholder video file the runner will accept as a regular file.
pub fn touch_video(directory: &Path, name: &str) -> PathBuf {
    let path = directory.join(name);
    std::fs::write(&path, b"not really a video").expect("Failed to write video file");
    path
}

/// Sorted file names inside `directory`.
pub fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(directory)
        .expect("Failed to read directory")
        .map(|entry| {
            entry
                .expect("Failed to read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// Reports fixed metadata for every video, with per-video overrides.
pub struct FakeProber {
    default: VideoMetadata,
    overrides: HashMap<String, VideoMetadata>,
    unreadable: Vec<String>,
}

impl FakeProber {
    pub fn new(duration_seconds: f64, frames_per_second: f64) -> Self {
        Self {
            default: VideoMetadata::from_duration(
                Duration::from_secs_f64(duration_seconds),
                frames_per_second,
            ),
            overrides: HashMap::new(),
            unreadable: Vec::new(),
        }
    }

    pub fn with_video(mut self, file_name: &str, metadata: VideoMetadata) -> Self {
        self.overrides.insert(file_name.to_string(), metadata);
        self
    }

    pub fn unreadable(mut self, file_name: &str) -> Self {
        self.unreadable.push(file_name.to_string());
        self
    }
}

fn file_name_of(video: &Path) -> String {
    video
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Prober for FakeProber {
    fn probe(&self, video: &Path) -> Result<VideoMetadata, FramedumpError> {
        let name = file_name_of(video);
        if self.unreadable.contains(&name) {
            return Err(FramedumpError::Probe {
                path: video.to_path_buf(),
                reason: "Invalid data found when processing input".to_string(),
            });
        }
        Ok(self
            .overrides
            .get(&name)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

/// Writes a 4x4 PNG for every planned capture unless told otherwise.
#[derive(Default)]
pub struct FakeDecoder {
    failing: Vec<String>,
    skipped_indices: Vec<usize>,
    garbage: bool,
    cancel_on_call: Option<CancellationToken>,
    calls: Mutex<Vec<PathBuf>>,
}

impl FakeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit with status 1 for this video, writing nothing.
    pub fn failing_for(mut self, file_name: &str) -> Self {
        self.failing.push(file_name.to_string());
        self
    }

    /// Silently skip the capture with this 1-based index.
    pub fn skipping(mut self, index: usize) -> Self {
        self.skipped_indices.push(index);
        self
    }

    /// Write bytes that are not an image instead of PNGs.
    pub fn writing_garbage(mut self) -> Self {
        self.garbage = true;
        self
    }

    /// Cancel `token` as soon as the first video is decoded.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    /// Videos decoded so far, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

impl Decoder for FakeDecoder {
    fn decode(&self, request: &DecodeRequest<'_>) -> Result<DecoderOutput, FramedumpError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(request.video.to_path_buf());

        if self.failing.contains(&file_name_of(request.video)) {
            return Ok(DecoderOutput {
                success: false,
                status: "exit code 1".to_string(),
                diagnostics: "moov atom not found".to_string(),
            });
        }

        for point in request.plan {
            if self.skipped_indices.contains(&point.index) {
                continue;
            }
            let path = request.output_dir.join(&point.output_filename);
            if self.garbage {
                std::fs::write(&path, b"garbage")?;
            } else {
                image::RgbImage::new(4, 4)
                    .save(&path)
                    .map_err(|error| FramedumpError::Io(std::io::Error::other(error)))?;
            }
        }

        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }

        Ok(DecoderOutput {
            success: true,
            status: "exit code 0".to_string(),
            diagnostics: String::new(),
        })
    }
}
