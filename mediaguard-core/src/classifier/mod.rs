//! Single-frame manipulation classifiers.
//!
//! The neural network that scores a frame lives outside this crate. It is
//! reached through the [`FrameClassifier`] trait, constructed once at process
//! start and shared behind an `Arc`, so the orchestration code never knows
//! whether it is talking to a remote inference service or a test double.
//!
//! ## Implementations
//!
//! - [`HttpClassifier`] - remote inference endpoint (feature `network`)
//! - [`MockClassifier`] - deterministic scores for tests and local runs
//!
//! ## Quick Start
//!
//! ```no_run
//! use mediaguard_core::classifier::{ClassifierConfig, ClassifierFactory};
//!
//! # async fn example(frame: image::RgbImage) -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = ClassifierFactory::create(ClassifierConfig::Mock { seed: 7 })?;
//! let confidence = classifier.classify(&frame).await?;
//! # Ok(())
//! # }
//! ```

pub mod heatmap;
#[cfg(feature = "network")]
mod http;
mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;

use crate::error::Result;

#[cfg(feature = "network")]
pub use http::{HttpClassifier, HttpClassifierConfig};
pub use mock::MockClassifier;

/// Classifier output for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Manipulation likelihood in `[0, 1]`
    pub confidence: f64,
    /// PNG overlay highlighting the regions that drove the score
    pub explanation: Option<Vec<u8>>,
}

/// Scores a single decoded frame.
///
/// Implementations must be thread-safe and should return comparable scores
/// for identical input. Calls may take seconds.
#[async_trait]
pub trait FrameClassifier: Send + Sync {
    /// Manipulation likelihood for one frame.
    async fn classify(&self, image: &RgbImage) -> Result<f64>;

    /// Score plus an explanation overlay when the implementation has one.
    async fn explain(&self, image: &RgbImage) -> Result<Classification> {
        Ok(Classification {
            confidence: self.classify(image).await?,
            explanation: None,
        })
    }

    /// Identifier reported in health checks and logs.
    fn source_id(&self) -> ClassifierSource;
}

/// Where scores come from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ClassifierSource {
    /// Remote inference service
    Remote { endpoint: String },
    /// Deterministic mock (NOT a real detector)
    Mock,
}

impl std::fmt::Display for ClassifierSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote { endpoint } => write!(f, "Remote: {endpoint}"),
            Self::Mock => write!(f, "Mock (NOT A REAL DETECTOR)"),
        }
    }
}

/// Configuration for creating a classifier.
#[derive(Debug, Clone)]
pub enum ClassifierConfig {
    #[cfg(feature = "network")]
    Remote(HttpClassifierConfig),
    Mock { seed: u64 },
}

/// Builds the process-wide classifier.
pub struct ClassifierFactory;

impl ClassifierFactory {
    pub fn create(config: ClassifierConfig) -> Result<Arc<dyn FrameClassifier>> {
        match config {
            #[cfg(feature = "network")]
            ClassifierConfig::Remote(http_config) => {
                Ok(Arc::new(HttpClassifier::with_config(http_config)?))
            }
            ClassifierConfig::Mock { seed } => Ok(Arc::new(MockClassifier::new(seed))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_mock() {
        let classifier = ClassifierFactory::create(ClassifierConfig::Mock { seed: 1 }).unwrap();
        assert_eq!(classifier.source_id(), ClassifierSource::Mock);

        let frame = RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]));
        let score = classifier.classify(&frame).await.unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_source_display() {
        let remote = ClassifierSource::Remote {
            endpoint: "http://models:8080/v1/classify".into(),
        };
        assert!(remote.to_string().contains("models:8080"));
        assert!(ClassifierSource::Mock.to_string().contains("NOT A REAL"));
    }
}
