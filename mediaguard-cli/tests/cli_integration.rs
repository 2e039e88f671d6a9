//! CLI integration tests for mediaguard-cli.
//!
//! These tests verify the CLI behavior by running the actual binary
//! and checking outputs, exit codes, and file artifacts.

use assert_cmd::Command;
use image::{ImageFormat, Rgb, RgbImage};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the mediaguard binary.
fn mediaguard() -> Command {
    let mut cmd = Command::cargo_bin("mediaguard").unwrap();
    cmd.env_remove("CLASSIFIER_URL").env_remove("RUST_LOG");
    cmd
}

fn write_png(path: &Path) {
    let img = RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 90]));
    img.save_with_format(path, ImageFormat::Png).unwrap();
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    mediaguard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Media manipulation analysis"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("hash"))
        .stdout(predicate::str::contains("evaluate"));
}

#[test]
fn test_version_displays_version() {
    mediaguard()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediaguard"));
}

#[test]
fn test_help_shows_exit_codes() {
    mediaguard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("66"));
}

#[test]
fn test_analyze_help_shows_options() {
    mediaguard()
        .args(["analyze", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--mock"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--max-frames"))
        .stdout(predicate::str::contains("--heatmap"));
}

#[test]
fn test_evaluate_help_shows_options() {
    mediaguard()
        .args(["evaluate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--real"))
        .stdout(predicate::str::contains("--fake"))
        .stdout(predicate::str::contains("--threshold"));
}

// ============================================================================
// Hash Tests
// ============================================================================

#[test]
fn test_hash_prints_sha3_256() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("abc.bin");
    fs::write(&file, b"abc").unwrap();

    mediaguard()
        .args(["hash", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532  ",
        ));
}

#[test]
fn test_hash_missing_file_returns_input_error() {
    // Exit code 66 = EX_NOINPUT
    mediaguard()
        .args(["hash", "nonexistent_file.jpg"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

// ============================================================================
// Analyze Tests
// ============================================================================

#[test]
fn test_analyze_image_with_mock() {
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("photo.png");
    write_png(&image);

    mediaguard()
        .args(["analyze", "--mock", image.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Verdict:"))
        .stdout(predicate::str::contains("Confidence:"))
        .stderr(predicate::str::contains("MOCK"));
}

#[test]
fn test_analyze_image_json_and_heatmap() {
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("photo.png");
    let heatmap = temp.path().join("heatmap.png");
    write_png(&image);

    let output = mediaguard()
        .args([
            "analyze",
            "--mock",
            "--json",
            "--heatmap",
            heatmap.to_str().unwrap(),
            image.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["media_type"], "image");
    assert_eq!(json["frames_analyzed"], 1);
    assert_eq!(json["hash"].as_str().unwrap().len(), 64);
    let confidence = json["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert!(["Real", "Suspicious", "LikelyFake"].contains(&json["verdict"].as_str().unwrap()));

    // Overlay is rendered at the classifier input size
    let overlay = image::open(&heatmap).unwrap();
    assert_eq!((overlay.width(), overlay.height()), (380, 380));
}

#[test]
fn test_analyze_missing_file_returns_input_error() {
    mediaguard()
        .args(["analyze", "--mock", "nonexistent_file.png"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_analyze_rejected_media_returns_data_error() {
    let temp = TempDir::new().unwrap();
    let fake_png = temp.path().join("anim.png");
    fs::write(&fake_png, b"GIF89a\x01\x00\x01\x00not really a png").unwrap();

    // Exit code 65 = EX_DATAERR
    mediaguard()
        .args(["analyze", "--mock", fake_png.to_str().unwrap()])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Media rejected"));
}

#[test]
fn test_analyze_unknown_extension_returns_usage_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("clip.xyz");
    fs::write(&file, b"data").unwrap();

    mediaguard()
        .args(["analyze", "--mock", file.to_str().unwrap()])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("--kind"));
}

#[test]
fn test_analyze_without_classifier_returns_usage_error() {
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("photo.png");
    write_png(&image);

    mediaguard()
        .args(["analyze", image.to_str().unwrap()])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("No classifier configured"));
}

#[test]
fn test_analyze_video_without_ffprobe_returns_unavailable() {
    let temp = TempDir::new().unwrap();
    let video = temp.path().join("clip.mp4");
    fs::write(&video, b"\x00\x00\x00\x18ftypmp42 not a real video").unwrap();

    // Exit code 69 = EX_UNAVAILABLE
    mediaguard()
        .env("FFPROBE_PATH", temp.path().join("no-ffprobe"))
        .args(["analyze", "--mock", video.to_str().unwrap()])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("ffprobe"));
}

// ============================================================================
// Evaluate Tests
// ============================================================================

#[test]
fn test_evaluate_missing_dir_returns_input_error() {
    let temp = TempDir::new().unwrap();

    mediaguard()
        .args([
            "evaluate",
            "--mock",
            "--real",
            temp.path().join("missing").to_str().unwrap(),
            "--fake",
            temp.path().to_str().unwrap(),
        ])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read directory"));
}

#[test]
fn test_evaluate_empty_dirs_returns_input_error() {
    let temp = TempDir::new().unwrap();
    let real = temp.path().join("real");
    let fake = temp.path().join("fake");
    fs::create_dir(&real).unwrap();
    fs::create_dir(&fake).unwrap();
    fs::write(real.join("readme.txt"), b"no videos here").unwrap();

    mediaguard()
        .args([
            "evaluate",
            "--mock",
            "--real",
            real.to_str().unwrap(),
            "--fake",
            fake.to_str().unwrap(),
        ])
        .assert()
        .code(66)
        .stderr(predicate::str::contains(".mp4"));
}
