//! Reduction of per-frame scores into a single video verdict.
//!
//! The aggregate is the 75th percentile of the score multiset. Manipulation
//! often touches only part of a clip, which a mean dilutes, while a max
//! follows any single false positive. Order of the input is irrelevant.

use serde::{Deserialize, Serialize};

use crate::error::{MediaGuardError, Result};
use crate::verdict::{round_confidence, Verdict};

/// Percentile used for video aggregation.
pub const VIDEO_PERCENTILE: f64 = 0.75;

/// Aggregated confidence (rounded to four decimals) and its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    pub confidence: f64,
    pub verdict: Verdict,
    pub frames: usize,
}

/// Percentile with linear interpolation between order statistics.
///
/// `q` is in `[0, 1]`. The rank of the result is `q * (n - 1)` over the
/// sorted values. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Aggregate frame scores into a video confidence and verdict.
///
/// Fails with [`MediaGuardError::EmptyScores`] when no frame was scored so
/// that a broken pipeline can never read as a `Real` verdict.
pub fn aggregate(scores: &[f64]) -> Result<AggregateScore> {
    let raw = percentile(scores, VIDEO_PERCENTILE)
        .ok_or(MediaGuardError::EmptyScores)?
        .clamp(0.0, 1.0);

    // Bands apply to the raw score; rounding only shapes the reported value.
    Ok(AggregateScore {
        confidence: round_confidence(raw),
        verdict: Verdict::for_video(raw),
        frames: scores.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_empty_scores_fail() {
        assert!(matches!(aggregate(&[]), Err(MediaGuardError::EmptyScores)));
    }

    #[test]
    fn test_brief_manipulation_surfaces() {
        let result = aggregate(&[0.1, 0.2, 0.3, 0.9, 0.95]).unwrap();
        assert!((result.confidence - 0.9).abs() < EPS);
        assert_eq!(result.verdict, Verdict::LikelyFake);
        assert_eq!(result.frames, 5);
    }

    #[test]
    fn test_verdict_uses_unrounded_score() {
        let above_fake = aggregate(&[0.60004]).unwrap();
        assert!((above_fake.confidence - 0.6).abs() < EPS);
        assert_eq!(above_fake.verdict, Verdict::LikelyFake);

        let above_suspicious = aggregate(&[0.40004]).unwrap();
        assert!((above_suspicious.confidence - 0.4).abs() < EPS);
        assert_eq!(above_suspicious.verdict, Verdict::Suspicious);

        assert_eq!(aggregate(&[0.6]).unwrap().verdict, Verdict::Suspicious);
        assert_eq!(aggregate(&[0.4]).unwrap().verdict, Verdict::Real);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = aggregate(&[0.95, 0.1, 0.9, 0.3, 0.2]).unwrap();
        let b = aggregate(&[0.1, 0.2, 0.3, 0.9, 0.95]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_score() {
        let result = aggregate(&[0.42]).unwrap();
        assert!((result.confidence - 0.42).abs() < EPS);
        assert_eq!(result.verdict, Verdict::Suspicious);
    }

    #[test]
    fn test_interpolates_between_order_statistics() {
        // n = 4, rank = 2.25 -> 0.3 + 0.25 * (0.4 - 0.3)
        let value = percentile(&[0.1, 0.2, 0.3, 0.4], 0.75).unwrap();
        assert!((value - 0.325).abs() < EPS);

        let result = aggregate(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(result.confidence, 0.325);
        assert_eq!(result.verdict, Verdict::Real);
    }

    #[test]
    fn test_isolated_spike_is_damped() {
        // One high frame among twelve low ones stays below the fake band.
        let mut scores = vec![0.1; 11];
        scores.push(0.99);
        let result = aggregate(&scores).unwrap();
        assert!((result.confidence - 0.1).abs() < EPS);
        assert_eq!(result.verdict, Verdict::Real);
    }

    #[test]
    fn test_percentile_extremes() {
        let values = [0.5, 0.2, 0.8];
        assert_eq!(percentile(&values, 0.0), Some(0.2));
        assert_eq!(percentile(&values, 1.0), Some(0.8));
        assert_eq!(percentile(&values, 0.5), Some(0.5));
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn test_confidence_rounded_to_four_places() {
        let result = aggregate(&[0.123456, 0.123456]).unwrap();
        assert_eq!(result.confidence, 0.1235);
    }
}
