//! Adapter between sampled frames and the classifier.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::classifier::{Classification, ClassifierSource, FrameClassifier};
use crate::error::{MediaGuardError, Result};
use crate::sampler::FrameSample;

/// Normalized classifier output for one sampled frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameScore {
    pub index: u64,
    pub score: f64,
}

/// Scores frames through the injected classifier.
///
/// Each call reaches the classifier exactly once; nothing is cached.
#[derive(Clone)]
pub struct FrameScorer {
    classifier: Arc<dyn FrameClassifier>,
}

impl FrameScorer {
    pub fn new(classifier: Arc<dyn FrameClassifier>) -> Self {
        Self { classifier }
    }

    pub fn source_id(&self) -> ClassifierSource {
        self.classifier.source_id()
    }

    /// Score one sampled frame.
    pub async fn score(&self, frame: &FrameSample) -> Result<FrameScore> {
        let start = Instant::now();
        let raw = self.classifier.classify(&frame.image).await?;
        let score = normalize(raw)?;

        debug!(
            frame_index = frame.index,
            score,
            latency_ms = start.elapsed().as_millis() as u64,
            "Frame scored"
        );
        Ok(FrameScore {
            index: frame.index,
            score,
        })
    }

    /// Score a frame, logging and swallowing classifier failures.
    pub async fn score_or_skip(&self, frame: &FrameSample) -> Option<FrameScore> {
        match self.score(frame).await {
            Ok(score) => Some(score),
            Err(e) => {
                warn!(frame_index = frame.index, error = %e, "Frame omitted from aggregate");
                None
            }
        }
    }

    /// Score and explanation for a single still image.
    pub async fn explain(&self, image: &image::RgbImage) -> Result<Classification> {
        let mut result = self.classifier.explain(image).await?;
        result.confidence = normalize(result.confidence)?;
        Ok(result)
    }
}

/// Reject non-finite scores and clamp the rest into `[0, 1]`.
fn normalize(raw: f64) -> Result<f64> {
    if !raw.is_finite() {
        return Err(MediaGuardError::Oracle(format!("non-finite score: {raw}")));
    }
    Ok(raw.clamp(0.0, 1.0))
}
