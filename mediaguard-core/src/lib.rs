//! MediaGuard Core - media manipulation analysis orchestration
//!
//! This crate takes untrusted uploads through validation, routes images to
//! synchronous classification and videos to an asynchronous job pipeline,
//! and turns per-frame classifier scores into a single verdict.
//!
//! # Features
//!
//! - Size, format and integrity validation before any analysis
//! - Content hashing (SHA3-256) for privacy-preserving audit records
//! - Coverage-based frame sampling: a bounded, evenly spaced frame set per video
//! - Robust percentile aggregation of frame scores
//! - Bounded worker pool with pollable job states
//! - Pluggable classifier behind an async trait (remote HTTP or mock)
//!
//! Media bytes are never persisted: images live only in memory for the
//! duration of a request and videos only in a scratch file owned by the
//! decoding task.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mediaguard_core::{
//!     analyze_image, ClassifierConfig, ClassifierFactory, FrameScorer, MediaBlob, MediaValidator,
//! };
//!
//! # async fn example(bytes: Vec<u8>) -> mediaguard_core::Result<()> {
//! let classifier = ClassifierFactory::create(ClassifierConfig::Mock { seed: 7 })?;
//! let scorer = FrameScorer::new(classifier);
//!
//! let image = MediaValidator::default().validate_image(MediaBlob::image(bytes))?;
//! let result = analyze_image(&scorer, image).await?;
//! println!("{} ({:.2})", result.verdict, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod audit;
pub mod classifier;
pub mod error;
pub mod jobs;
pub mod media;
pub mod pipeline;
pub mod sampler;
pub mod scorer;
pub mod validation;
pub mod verdict;

// Re-export main types for convenience
pub use aggregate::{aggregate, percentile, AggregateScore, VIDEO_PERCENTILE};
pub use audit::{AuditEvent, AuditRecorder};
pub use classifier::{
    Classification, ClassifierConfig, ClassifierFactory, ClassifierSource, FrameClassifier,
    MockClassifier,
};
pub use error::{MediaGuardError, Result, ValidationError, MAX_IMAGE_BYTES, MAX_VIDEO_BYTES};
pub use jobs::{
    JobHandler, JobId, JobOrchestrator, JobPhase, JobStatus, OrchestratorConfig, VideoJob,
};
pub use media::{ContentHash, MediaBlob, MediaKind};
pub use pipeline::{analyze_image, AnalysisResult, VideoAnalyzer};
pub use sampler::{
    frame_indices, FfmpegBackend, FfmpegConfig, FrameSample, VideoBackend, VideoSource,
    DEFAULT_MAX_FRAMES,
};
pub use scorer::{FrameScore, FrameScorer};
pub use validation::{MediaValidator, ValidatedImage, ValidatedMedia, ValidatedVideo};
pub use verdict::Verdict;

// Network-dependent exports
#[cfg(feature = "network")]
pub use classifier::{HttpClassifier, HttpClassifierConfig};
