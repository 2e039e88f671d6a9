//! Verdict thresholds.
//!
//! Single images and aggregated video confidences are calibrated differently,
//! so each has its own fixed threshold pair. Both are strict "greater than"
//! comparisons on the upper side of each band.

use serde::{Deserialize, Serialize};

/// Image confidence strictly above this is `LikelyFake`.
pub const IMAGE_FAKE_THRESHOLD: f64 = 0.75;
/// Image confidence strictly above this (and not fake) is `Suspicious`.
pub const IMAGE_SUSPICIOUS_THRESHOLD: f64 = 0.45;

/// Aggregated video confidence strictly above this is `LikelyFake`.
pub const VIDEO_FAKE_THRESHOLD: f64 = 0.60;
/// Aggregated video confidence strictly above this (and not fake) is `Suspicious`.
pub const VIDEO_SUSPICIOUS_THRESHOLD: f64 = 0.40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Real,
    Suspicious,
    LikelyFake,
}

impl Verdict {
    /// Classify a single-image classifier confidence.
    pub fn for_image(confidence: f64) -> Self {
        Self::banded(confidence, IMAGE_FAKE_THRESHOLD, IMAGE_SUSPICIOUS_THRESHOLD)
    }

    /// Classify an aggregated video confidence.
    pub fn for_video(confidence: f64) -> Self {
        Self::banded(confidence, VIDEO_FAKE_THRESHOLD, VIDEO_SUSPICIOUS_THRESHOLD)
    }

    fn banded(confidence: f64, fake: f64, suspicious: f64) -> Self {
        if confidence > fake {
            Self::LikelyFake
        } else if confidence > suspicious {
            Self::Suspicious
        } else {
            Self::Real
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Real => "Real",
            Self::Suspicious => "Suspicious",
            Self::LikelyFake => "Likely Fake",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Round a confidence to four decimal places for externally visible results.
pub fn round_confidence(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
