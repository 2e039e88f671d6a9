//! Common utility functions shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use mediaguard_core::{
    FfmpegBackend, FfmpegConfig, FrameClassifier, MediaKind, MockClassifier, Verdict,
    VideoBackend,
};
use tracing::{info, warn};

use crate::exit_codes::Failure;

const NO_CLASSIFIER: &str =
    "No classifier configured: pass --classifier-url (or set CLASSIFIER_URL) or use --mock";

/// Detect media kind from file extension.
pub fn detect_media_kind(path: &Path) -> Option<MediaKind> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg" | "png") => Some(MediaKind::Image),
        Some("mp4" | "mov" | "avi" | "mkv" | "webm" | "m4v") => Some(MediaKind::Video),
        _ => None,
    }
}

/// Read an input file, tagging failures so they exit with EX_NOINPUT.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Build the frame classifier selected on the command line.
///
/// An explicit URL wins, then `CLASSIFIER_URL`. The mock is only used when
/// asked for.
pub fn build_classifier(
    mock: bool,
    classifier_url: Option<String>,
    quiet: bool,
) -> Result<Arc<dyn FrameClassifier>> {
    if mock {
        warn!("Using MOCK classifier (scores are not a detection!)");
        if !quiet {
            eprintln!(
                "{}",
                "Using MOCK classifier (scores are not a detection!)".yellow()
            );
        }
        return Ok(Arc::new(MockClassifier::default()));
    }

    remote_classifier(classifier_url)
}

#[cfg(feature = "network")]
fn remote_classifier(classifier_url: Option<String>) -> Result<Arc<dyn FrameClassifier>> {
    use mediaguard_core::{HttpClassifier, HttpClassifierConfig};

    let config = match classifier_url {
        Some(endpoint) => HttpClassifierConfig {
            api_key: std::env::var("CLASSIFIER_API_KEY").ok(),
            ..HttpClassifierConfig::new(endpoint)
        },
        None => HttpClassifierConfig::from_env().map_err(|_| Failure::usage(NO_CLASSIFIER))?,
    };

    info!(endpoint = %config.endpoint, "Using remote classifier");
    let classifier =
        HttpClassifier::with_config(config).context("Failed to create classifier client")?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "network"))]
fn remote_classifier(_classifier_url: Option<String>) -> Result<Arc<dyn FrameClassifier>> {
    Err(Failure::usage(NO_CLASSIFIER).into())
}

/// ffmpeg-backed decoder, failing early when ffprobe cannot be run.
pub fn video_backend() -> Result<Arc<dyn VideoBackend>> {
    let backend = FfmpegBackend::new(FfmpegConfig::default());
    if !backend.is_available() {
        return Err(Failure::unavailable(
            "ffprobe not available: install ffmpeg or set FFPROBE_PATH",
        )
        .into());
    }
    Ok(Arc::new(backend))
}

/// Verdict label colored by severity.
pub fn colored_verdict(verdict: Verdict) -> ColoredString {
    match verdict {
        Verdict::Real => verdict.label().green().bold(),
        Verdict::Suspicious => verdict.label().yellow().bold(),
        Verdict::LikelyFake => verdict.label().red().bold(),
    }
}
