//! Batch runner tests against in-process decoder and prober fakes.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{FakeDecoder, FakeProber, file_names, touch_video};
use framedump::{
    BatchManifest, BatchRunner, CancellationToken, ErrorCategory, ExtractionConfig,
    FramedumpError, InputSource, OperationType, ProgressCallback, ProgressInfo, RunMode,
    SamplingPolicy, VideoMetadata,
};

/// One video per subdirectory so every video gets its own `frames` folder.
fn video_in_own_directory(root: &Path, folder: &str, name: &str) -> PathBuf {
    let directory = root.join(folder);
    fs::create_dir_all(&directory).expect("Failed to create video directory");
    touch_video(&directory, name)
}

fn frame_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("frame_{i:04}.png")).collect()
}

// ── Batch isolation ───────────────────────────────────────────────

#[test]
fn two_videos_each_get_their_own_frames() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let first = video_in_own_directory(root.path(), "one", "a.mp4");
    let second = video_in_own_directory(root.path(), "two", "b.mp4");
    let manifest =
        BatchManifest::new(vec![first.clone(), second.clone()]).expect("Failed to build manifest");

    let runner = BatchRunner::new(FakeProber::new(60.0, 30.0), FakeDecoder::new());
    let report = runner
        .run(&manifest, SamplingPolicy::FrameCount(20))
        .expect("Run should not fail");

    assert!(report.is_success(), "{report}");
    assert_eq!(report.len(), 2);
    assert_eq!(report.total_frames(), 40);
    assert_eq!(file_names(&root.path().join("one/frames")), frame_names(20));
    assert_eq!(file_names(&root.path().join("two/frames")), frame_names(20));

    let result = report.result_for(&first).expect("first video in report");
    assert_eq!(result.frame_count(), Some(20));
    let output_dir = result.output_dir.as_deref().expect("output dir recorded");
    assert!(output_dir.is_absolute());
    assert!(output_dir.ends_with("one/frames"));
}

#[test]
fn failing_video_does_not_stop_the_batch() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let videos = vec![
        video_in_own_directory(root.path(), "a", "good1.mp4"),
        video_in_own_directory(root.path(), "b", "broken.mp4"),
        video_in_own_directory(root.path(), "c", "good2.mp4"),
    ];
    let manifest = BatchManifest::new(videos.clone()).expect("Failed to build manifest");
    let decoder = FakeDecoder::new().failing_for("broken.mp4");

    let runner = BatchRunner::new(FakeProber::new(10.0, 25.0), decoder);
    let report = runner
        .run(&manifest, SamplingPolicy::Interval(2.5))
        .expect("Run should not fail");

    assert_eq!(report.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());

    let order: Vec<&Path> = report.iter().map(|r| r.video.as_path()).collect();
    assert_eq!(order, videos.iter().map(PathBuf::as_path).collect::<Vec<_>>());

    let broken = &report.results[1];
    match broken.error() {
        Some(FramedumpError::Decode { status, diagnostics }) => {
            assert_eq!(status, "exit code 1");
            assert!(diagnostics.contains("moov atom"));
        }
        other => panic!("Expected a decode error, got {other:?}"),
    }
    assert_eq!(file_names(&root.path().join("c/frames")), frame_names(4));
}

#[test]
fn missing_video_is_reported_without_creating_output() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let present = video_in_own_directory(root.path(), "here", "a.mp4");
    let missing = root.path().join("gone/b.mp4");
    let manifest =
        BatchManifest::new(vec![missing.clone(), present]).expect("Failed to build manifest");

    let runner = BatchRunner::new(FakeProber::new(10.0, 25.0), FakeDecoder::new());
    let report = runner
        .run(&manifest, SamplingPolicy::FrameCount(3))
        .expect("Run should not fail");

    let result = report.result_for(&missing).expect("missing video in report");
    let error = result.error().expect("missing video fails");
    assert_eq!(error.category(), ErrorCategory::Path);
    assert!(error.to_string().contains("not found"), "{error}");
    assert!(result.output_dir.is_none());
    assert!(!root.path().join("gone").exists());
    assert!(report.results[1].is_success());
}

#[test]
fn invalid_middle_path_is_isolated() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let manifest = BatchManifest::new(vec![
        video_in_own_directory(root.path(), "a", "first.mp4"),
        root.path().join("b/does-not-exist.mp4"),
        video_in_own_directory(root.path(), "c", "third.mp4"),
    ])
    .expect("Failed to build manifest");

    let decoder = FakeDecoder::new();
    let runner = BatchRunner::new(FakeProber::new(10.0, 25.0), decoder);
    let report = runner
        .run(&manifest, SamplingPolicy::FrameCount(4))
        .expect("Run should not fail");

    let outcomes: Vec<bool> = report.iter().map(|r| r.is_success()).collect();
    assert_eq!(outcomes, vec![true, false, true]);
}

#[test]
fn videos_sharing_a_folder_do_not_overwrite_frames() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let first = touch_video(root.path(), "a.mp4");
    let second = touch_video(root.path(), "b.mp4");
    let manifest =
        BatchManifest::new(vec![first.clone(), second.clone()]).expect("Failed to build manifest");

    let runner = BatchRunner::new(FakeProber::new(10.0, 25.0), FakeDecoder::new());
    let report = runner
        .run(&manifest, SamplingPolicy::FrameCount(3))
        .expect("Run should not fail");

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.total_frames(), 3);
    assert!(report.result_for(&first).expect("first video in report").is_success());

    let error = report
        .result_for(&second)
        .and_then(|result| result.error())
        .expect("second video fails");
    assert_eq!(error.category(), ErrorCategory::Path);
    assert!(error.to_string().contains("shared with"), "{error}");
    assert!(error.to_string().contains("a.mp4"), "{error}");

    assert_eq!(file_names(&root.path().join("frames")), frame_names(3));
}

#[test]
fn unreadable_video_is_a_probe_failure() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let video = video_in_own_directory(root.path(), "x", "corrupt.mp4");
    let manifest = BatchManifest::new(vec![video]).expect("Failed to build manifest");

    let decoder = FakeDecoder::new();
    let runner = BatchRunner::new(FakeProber::new(10.0, 25.0).unreadable("corrupt.mp4"), decoder);
    let report = runner
        .run(&manifest, SamplingPolicy::FrameCount(3))
        .expect("Run should not fail");

    let error = report.results[0].error().expect("probe failure");
    assert!(matches!(error, FramedumpError::Probe { .. }), "{error}");
    assert_eq!(error.category(), ErrorCategory::Decode);
}

#[test]
fn too_short_video_fails_planning_only_for_itself() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let short = video_in_own_directory(root.path(), "short", "blip.mp4");
    let long = video_in_own_directory(root.path(), "long", "talk.mp4");
    let manifest = BatchManifest::new(vec![short, long]).expect("Failed to build manifest");

    let prober = FakeProber::new(60.0, 30.0).with_video(
        "blip.mp4",
        VideoMetadata::from_duration(Duration::from_millis(500), 10.0),
    );
    let runner = BatchRunner::new(prober, FakeDecoder::new());
    let report = runner
        .run(&manifest, SamplingPolicy::FrameCount(20))
        .expect("Run should not fail");

    let error = report.results[0].error().expect("planning failure");
    assert_eq!(error.category(), ErrorCategory::Planning);
    assert!(!root.path().join("short/frames").exists());
    assert!(report.results[1].is_success());
}

#[test]
fn invalid_policy_aborts_before_any_work() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let video = video_in_own_directory(root.path(), "v", "a.mp4");
    let manifest = BatchManifest::new(vec![video]).expect("Failed to build manifest");

    let runner = BatchRunner::new(FakeProber::new(10.0, 25.0), FakeDecoder::new());
    let error = runner
        .run(&manifest, SamplingPolicy::Interval(0.0))
        .unwrap_err();
    assert_eq!(error.category(), ErrorCategory::Planning);
    assert!(!root.path().join("v/frames").exists());
}

// ── Output directory selection ────────────────────────────────────

#[test]
fn single_video_honors_explicit_output() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let video = touch_video(root.path(), "clip.mp4");
    let output = root.path().join("custom/out");
    let source = InputSource::SingleVideo {
        path: video,
        output_override: Some(output.clone()),
    };

    let runner = BatchRunner::new(FakeProber::new(30.0, 30.0), FakeDecoder::new());
    let report = runner
        .run_source(&source, SamplingPolicy::FrameCount(15))
        .expect("Run should not fail");

    assert!(report.is_success(), "{report}");
    assert_eq!(file_names(&output), frame_names(15));
    assert!(!root.path().join("frames").exists());
}

#[test]
fn manifest_ignores_explicit_output() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let video = touch_video(root.path(), "clip.mp4");
    let manifest_path = root.path().join("videos.json");
    let json = serde_json::json!({ "videos": [video.to_string_lossy()] });
    fs::write(&manifest_path, json.to_string()).expect("Failed to write manifest");
    let ignored = root.path().join("ignored");

    let source = InputSource::from_path(&manifest_path, Some(ignored.clone()))
        .expect("Failed to load manifest");
    assert!(matches!(source, InputSource::Manifest(_)));

    let runner = BatchRunner::new(FakeProber::new(30.0, 30.0), FakeDecoder::new());
    let report = runner
        .run_source(&source, SamplingPolicy::FrameCount(2))
        .expect("Run should not fail");

    assert!(report.is_success(), "{report}");
    assert!(!ignored.exists());
    assert_eq!(file_names(&root.path().join("frames")), frame_names(2));
}

#[test]
fn extract_video_in_batch_mode_derives_directory() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let video = touch_video(root.path(), "clip.mp4");
    let ignored = root.path().join("elsewhere");

    let runner = BatchRunner::new(FakeProber::new(30.0, 30.0), FakeDecoder::new());
    let result = runner.extract_video(
        &video,
        Some(ignored.as_path()),
        RunMode::Batch,
        SamplingPolicy::FrameCount(1),
    );

    assert!(result.is_success());
    assert!(!ignored.exists());
    assert!(root.path().join("frames/frame_0001.png").is_file());
}

#[test]
fn rerun_overwrites_previous_frames() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let video = touch_video(root.path(), "clip.mp4");
    let manifest = BatchManifest::new(vec![video]).expect("Failed to build manifest");
    let runner = BatchRunner::new(FakeProber::new(30.0, 30.0), FakeDecoder::new());

    for _ in 0..2 {
        let report = runner
            .run(&manifest, SamplingPolicy::FrameCount(3))
            .expect("Run should not fail");
        assert!(report.is_success());
    }
    assert_eq!(file_names(&root.path().join("frames")), frame_names(3));
}

// ── Progress and cancellation ─────────────────────────────────────

struct RecordingProgress {
    calls: AtomicU64,
    last: Mutex<Option<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().expect("lock poisoned") = Some(info.clone());
    }
}

#[test]
fn progress_is_reported_per_video() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let videos = vec![
        video_in_own_directory(root.path(), "a", "1.mp4"),
        video_in_own_directory(root.path(), "b", "2.mp4"),
        video_in_own_directory(root.path(), "c", "3.mp4"),
    ];
    let manifest = BatchManifest::new(videos.clone()).expect("Failed to build manifest");
    let progress = Arc::new(RecordingProgress {
        calls: AtomicU64::new(0),
        last: Mutex::new(None),
    });

    let config = ExtractionConfig::new().with_progress(progress.clone());
    let runner =
        BatchRunner::new(FakeProber::new(10.0, 25.0), FakeDecoder::new()).with_config(config);
    runner
        .run(&manifest, SamplingPolicy::FrameCount(2))
        .expect("Run should not fail");

    assert_eq!(progress.calls.load(Ordering::SeqCst), 3);
    let last = progress.last.lock().expect("lock poisoned").clone().expect("progress reported");
    assert_eq!(last.operation, OperationType::FrameExtraction);
    assert_eq!(last.current, 3);
    assert_eq!(last.total, Some(3));
    assert_eq!(last.percentage, Some(100.0));
    assert_eq!(last.current_item.as_deref(), Some(videos[2].as_path()));
}

#[test]
fn cancellation_reports_remaining_videos() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let videos = vec![
        video_in_own_directory(root.path(), "a", "1.mp4"),
        video_in_own_directory(root.path(), "b", "2.mp4"),
        video_in_own_directory(root.path(), "c", "3.mp4"),
    ];
    let manifest = BatchManifest::new(videos).expect("Failed to build manifest");

    let token = CancellationToken::new();
    let config = ExtractionConfig::new().with_cancellation(token.clone());
    let decoder = FakeDecoder::new().cancelling(token);
    let runner = BatchRunner::new(FakeProber::new(10.0, 25.0), decoder).with_config(config);
    let report = runner
        .run(&manifest, SamplingPolicy::FrameCount(2))
        .expect("Run should not fail");

    assert_eq!(report.len(), 3);
    assert!(report.results[0].is_success());
    for result in &report.results[1..] {
        assert!(matches!(result.error(), Some(FramedumpError::Cancelled)), "{result}");
        assert_eq!(result.error().map(FramedumpError::category), Some(ErrorCategory::Cancelled));
    }
    assert!(!root.path().join("b/frames").exists());
}

#[test]
fn cancelled_before_start_decodes_nothing() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let video = touch_video(root.path(), "clip.mp4");
    let manifest = BatchManifest::new(vec![video]).expect("Failed to build manifest");

    let token = CancellationToken::new();
    token.cancel();
    let config = ExtractionConfig::new().with_cancellation(token);
    let runner =
        BatchRunner::new(FakeProber::new(10.0, 25.0), FakeDecoder::new()).with_config(config);
    let report = runner
        .run(&manifest, SamplingPolicy::FrameCount(2))
        .expect("Run should not fail");

    assert_eq!(report.failed(), 1);
    assert!(!root.path().join("frames").exists());
}
