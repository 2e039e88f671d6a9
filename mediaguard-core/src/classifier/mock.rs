//! Mock classifier for testing.

use async_trait::async_trait;
use image::RgbImage;
use sha3::{Digest, Sha3_256};

use super::heatmap::{gradient_saliency, render_overlay};
use super::{Classification, ClassifierSource, FrameClassifier};
use crate::error::Result;

/// Mock classifier for testing.
/// WARNING: scores are a hash of the pixels, not a detection!
///
/// Identical frames always get identical scores. A fixed score can be forced
/// with [`MockClassifier::fixed`].
pub struct MockClassifier {
    seed: u64,
    fixed: Option<f64>,
}

impl MockClassifier {
    pub fn new(seed: u64) -> Self {
        Self { seed, fixed: None }
    }

    /// Always answer `confidence`.
    pub fn fixed(confidence: f64) -> Self {
        Self {
            seed: 0,
            fixed: Some(confidence),
        }
    }

    /// Deterministic pseudo-score in `[0, 1]` derived from seed and pixels.
    pub fn score_sync(&self, image: &RgbImage) -> f64 {
        if let Some(confidence) = self.fixed {
            return confidence;
        }

        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(image.width().to_le_bytes());
        hasher.update(image.height().to_le_bytes());
        hasher.update(image.as_raw());
        let digest = hasher.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head) as f64 / u64::MAX as f64
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new(0xDEADBEEF_CAFEBABE)
    }
}

#[async_trait]
impl FrameClassifier for MockClassifier {
    async fn classify(&self, image: &RgbImage) -> Result<f64> {
        Ok(self.score_sync(image))
    }

    async fn explain(&self, image: &RgbImage) -> Result<Classification> {
        let confidence = self.score_sync(image);
        let explanation = render_overlay(image, &gradient_saliency(image))?;
        Ok(Classification {
            confidence,
            explanation: Some(explanation),
        })
    }

    fn source_id(&self) -> ClassifierSource {
        ClassifierSource::Mock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame(v: u8) -> RgbImage {
        RgbImage::from_pixel(6, 6, Rgb([v, v, v]))
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let a = MockClassifier::new(42);
        let b = MockClassifier::new(42);
        assert_eq!(a.score_sync(&frame(3)), b.score_sync(&frame(3)));
    }

    #[test]
    fn test_seed_and_content_change_score() {
        let a = MockClassifier::new(1);
        let b = MockClassifier::new(2);
        assert_ne!(a.score_sync(&frame(3)), b.score_sync(&frame(3)));
        assert_ne!(a.score_sync(&frame(3)), a.score_sync(&frame(4)));
    }

    #[test]
    fn test_score_in_unit_range() {
        let classifier = MockClassifier::default();
        for v in 0..32u8 {
            let score = classifier.score_sync(&frame(v));
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[tokio::test]
    async fn test_fixed_score_with_overlay() {
        let classifier = MockClassifier::fixed(0.8);
        let result = classifier.explain(&frame(100)).await.unwrap();
        assert_eq!(result.confidence, 0.8);
        let overlay = result.explanation.expect("mock renders an overlay");
        assert!(overlay.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
