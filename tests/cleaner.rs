//! Frame cleanup tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use framedump::{
    Cleaner, ErrorCategory, ImageFormat, OperationType, ProgressCallback, ProgressInfo, clean,
    clean_with_format, resolve_cleanup_directory,
};

fn write(path: &Path) {
    fs::write(path, b"x").expect("Failed to write file");
}

#[test]
fn deletes_only_frame_images() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let frames = root.path().join("frames");
    fs::create_dir(&frames).expect("Failed to create frames dir");
    write(&frames.join("frame_0001.png"));
    write(&frames.join("frame_0002.png"));
    write(&frames.join("notes.txt"));

    let report = clean(&frames).expect("Cleanup should succeed");

    assert_eq!(report.files_deleted, 2);
    assert!(report.is_success());
    assert!(frames.join("notes.txt").is_file());
    assert!(!frames.join("frame_0001.png").exists());
    assert!(frames.is_dir(), "the directory itself is kept");
}

#[test]
fn video_folder_resolves_to_its_frames() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let frames = root.path().join("frames");
    fs::create_dir(&frames).expect("Failed to create frames dir");
    write(&frames.join("frame_0001.png"));
    write(&root.path().join("poster.png"));

    assert_eq!(resolve_cleanup_directory(root.path()), frames);
    let report = clean(root.path()).expect("Cleanup should succeed");

    assert_eq!(report.directory, frames);
    assert_eq!(report.files_deleted, 1);
    assert!(root.path().join("poster.png").is_file());
}

#[test]
fn folder_without_frames_is_cleaned_directly() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    write(&root.path().join("frame_0001.png"));

    assert_eq!(resolve_cleanup_directory(root.path()), root.path());
    let report = clean(root.path()).expect("Cleanup should succeed");
    assert_eq!(report.files_deleted, 1);
}

#[test]
fn subdirectories_are_not_touched() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let nested = root.path().join("frames").join("older");
    fs::create_dir_all(&nested).expect("Failed to create nested dir");
    write(&nested.join("frame_0001.png"));
    fs::create_dir(root.path().join("frames").join("dir.png")).expect("Failed to create dir");

    let report = clean(&root.path().join("frames")).expect("Cleanup should succeed");

    assert_eq!(report.files_deleted, 0);
    assert!(nested.join("frame_0001.png").is_file());
    assert!(root.path().join("frames").join("dir.png").is_dir());
}

#[test]
fn extension_match_ignores_case() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    write(&root.path().join("A.PNG"));
    write(&root.path().join("b.jpg"));
    write(&root.path().join("c.jpeg"));

    let report = clean(root.path()).expect("Cleanup should succeed");
    assert_eq!(report.files_deleted, 1);

    let report = clean_with_format(root.path(), ImageFormat::Jpeg).expect("Cleanup should succeed");
    assert_eq!(report.files_deleted, 2);
}

#[test]
fn missing_target_is_a_path_error() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let error = clean(&root.path().join("nope")).unwrap_err();
    assert_eq!(error.category(), ErrorCategory::Path);
    assert!(error.to_string().contains("does not exist"), "{error}");
}

#[test]
fn file_target_is_a_path_error() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let file = root.path().join("frame_0001.png");
    write(&file);

    let error = Cleaner::new(ImageFormat::Png).clean(&file).unwrap_err();
    assert_eq!(error.category(), ErrorCategory::Path);
}

#[test]
fn empty_directory_deletes_nothing() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let report = clean(root.path()).expect("Cleanup should succeed");
    assert_eq!(report.files_deleted, 0);
    assert!(report.to_string().starts_with("Deleted 0 file(s)"));
}

// ── Per-file failures ─────────────────────────────────────────────

/// Removes `victim` behind the cleaner's back on the first notification.
struct RemovingProgress {
    victim: Mutex<Option<PathBuf>>,
    seen: Mutex<Vec<(OperationType, u64, Option<u64>)>>,
}

impl ProgressCallback for RemovingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(victim) = self.victim.lock().expect("victim lock poisoned").take() {
            fs::remove_file(victim).expect("Failed to remove file early");
        }
        self.seen
            .lock()
            .expect("seen lock poisoned")
            .push((info.operation, info.current, info.total));
    }
}

#[test]
fn one_failed_delete_does_not_stop_the_rest() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    for name in ["frame_0001.png", "frame_0002.png", "frame_0003.png"] {
        write(&root.path().join(name));
    }
    let vanished = root.path().join("frame_0002.png");
    let progress = Arc::new(RemovingProgress {
        victim: Mutex::new(Some(vanished.clone())),
        seen: Mutex::new(Vec::new()),
    });

    let report = Cleaner::new(ImageFormat::Png)
        .with_progress(progress.clone())
        .clean(root.path())
        .expect("Cleanup should still return a report");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, vanished);
    assert_eq!(report.files_deleted, 2);
    assert!(!report.is_success());
    assert!(!root.path().join("frame_0001.png").exists());
    assert!(!root.path().join("frame_0003.png").exists());

    let seen = progress.seen.lock().expect("seen lock poisoned").clone();
    assert_eq!(
        seen,
        vec![
            (OperationType::Cleanup, 1, Some(3)),
            (OperationType::Cleanup, 2, Some(3)),
            (OperationType::Cleanup, 3, Some(3)),
        ]
    );
}
