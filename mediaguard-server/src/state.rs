//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use mediaguard_core::{
    AuditRecorder, ClassifierFactory, FfmpegBackend, FrameClassifier, FrameScorer,
    JobOrchestrator, MediaGuardError, MediaValidator, VideoAnalyzer, VideoBackend,
};

use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Upload size/format/integrity checks
    pub validator: MediaValidator,
    /// Classifier adapter used for still images
    pub scorer: FrameScorer,
    /// Video job pool
    pub orchestrator: Arc<JobOrchestrator>,
    /// Audit trail
    pub audit: AuditRecorder,
}

impl AppState {
    /// Build state from configuration, with ffmpeg-backed video decoding.
    ///
    /// Starts the worker pool, so this must run inside a tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self, MediaGuardError> {
        let classifier = ClassifierFactory::create(config.classifier_config()?)?;
        let backend = Arc::new(FfmpegBackend::new(config.ffmpeg.clone()));
        if !backend.is_available() {
            tracing::warn!("ffprobe not found, video jobs will fail until it is installed");
        }
        Ok(Self::with_components(config, classifier, backend))
    }

    /// Build state around explicit classifier and video backend.
    pub fn with_components(
        config: &Config,
        classifier: Arc<dyn FrameClassifier>,
        backend: Arc<dyn VideoBackend>,
    ) -> Self {
        let scorer = FrameScorer::new(classifier);
        tracing::info!(classifier = %scorer.source_id(), "Classifier ready");

        let analyzer =
            VideoAnalyzer::new(scorer.clone(), backend).with_max_frames(config.max_frames);
        let orchestrator = JobOrchestrator::start(config.orchestrator_config(), Arc::new(analyzer));

        Self {
            validator: MediaValidator::default(),
            scorer,
            orchestrator,
            audit: AuditRecorder::new(),
        }
    }
}
