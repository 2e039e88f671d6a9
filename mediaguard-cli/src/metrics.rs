//! Binary detection metrics for labelled evaluation runs.
//!
//! Positive means "manipulated". Scores at or above the threshold are
//! predicted positive.

/// Confusion matrix counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl Confusion {
    pub fn tally(labels: &[bool], scores: &[f64], threshold: f64) -> Self {
        let mut counts = Self::default();
        for (&label, &score) in labels.iter().zip(scores) {
            match (label, score >= threshold) {
                (true, true) => counts.true_positive += 1,
                (false, true) => counts.false_positive += 1,
                (false, false) => counts.true_negative += 1,
                (true, false) => counts.false_negative += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

/// Summary of one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub threshold: f64,
    pub confusion: Confusion,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Undefined when only one class is present
    pub roc_auc: Option<f64>,
}

impl Report {
    pub fn compute(labels: &[bool], scores: &[f64], threshold: f64) -> Self {
        let confusion = Confusion::tally(labels, scores, threshold);
        let tp = confusion.true_positive as f64;

        let accuracy = ratio(
            (confusion.true_positive + confusion.true_negative) as f64,
            confusion.total() as f64,
        );
        let precision = ratio(tp, (confusion.true_positive + confusion.false_positive) as f64);
        let recall = ratio(tp, (confusion.true_positive + confusion.false_negative) as f64);
        let f1 = ratio(2.0 * precision * recall, precision + recall);

        Self {
            threshold,
            confusion,
            accuracy,
            precision,
            recall,
            f1,
            roc_auc: roc_auc(labels, scores),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "threshold": self.threshold,
            "samples": self.confusion.total(),
            "true_positive": self.confusion.true_positive,
            "false_positive": self.confusion.false_positive,
            "true_negative": self.confusion.true_negative,
            "false_negative": self.confusion.false_negative,
            "accuracy": self.accuracy,
            "precision": self.precision,
            "recall": self.recall,
            "f1": self.f1,
            "roc_auc": self.roc_auc,
        })
    }
}

// Zero denominators score 0 rather than NaN.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Area under the ROC curve via the rank-sum statistic.
///
/// Tied scores share their average rank.
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    let n = labels.len().min(scores.len());
    let positives = labels[..n].iter().filter(|&&l| l).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks start..end (1-based: start+1..=end)
        let rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            if labels[i] {
                positive_rank_sum += rank;
            }
        }
        start = end;
    }

    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Some(u / (p * negatives as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_report_on_mixed_predictions() {
        let labels = [false, false, true, true];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let report = Report::compute(&labels, &scores, 0.5);

        assert_eq!(
            report.confusion,
            Confusion {
                true_positive: 1,
                false_positive: 0,
                true_negative: 2,
                false_negative: 1,
            }
        );
        assert!(close(report.accuracy, 0.75));
        assert!(close(report.precision, 1.0));
        assert!(close(report.recall, 0.5));
        assert!(close(report.f1, 2.0 / 3.0));
        assert!(close(report.roc_auc.unwrap(), 0.75));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let report = Report::compute(&[true], &[0.5], 0.5);
        assert_eq!(report.confusion.true_positive, 1);
    }

    #[test]
    fn test_no_positive_predictions() {
        let report = Report::compute(&[true, false], &[0.2, 0.1], 0.5);
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1, 0.0);
        assert!(close(report.accuracy, 0.5));
        assert!(close(report.roc_auc.unwrap(), 1.0));
    }

    #[test]
    fn test_auc_ties_and_single_class() {
        assert!(close(
            roc_auc(&[true, false, true, false], &[0.5, 0.5, 0.5, 0.5]).unwrap(),
            0.5
        ));
        assert!(close(roc_auc(&[false, true], &[0.9, 0.1]).unwrap(), 0.0));
        assert_eq!(roc_auc(&[true, true], &[0.9, 0.1]), None);
        assert_eq!(roc_auc(&[], &[]), None);
    }

    #[test]
    fn test_json_shape() {
        let json = Report::compute(&[true, true], &[0.9, 0.8], 0.5).to_json();
        assert_eq!(json["samples"], 2);
        assert!(json["roc_auc"].is_null());
    }
}
