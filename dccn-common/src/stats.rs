//! Review statistics
//!
//! Descriptive statistics over submission scores of one conference and the
//! quality classification derived from them. A submission score is the mean
//! of its completely scored reviews (see [`SubmissionView::score`]); only
//! positive scores take part in the statistics.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::SubmissionStatus;
use crate::snapshot::SubmissionView;

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Mean of the values greater than zero; 0 if there are none
pub fn mean_of_positive<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let positive: Vec<f64> = values.into_iter().filter(|v| *v > 0.0).collect();
    mean(&positive)
}

/// Median of an already sorted slice; 0 for an empty slice
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

/// Lower quartile, median and upper quartile
///
/// The halves exclude the median element for odd counts. A quartile whose
/// half is empty equals the median.
pub fn quartiles(values: &[f64]) -> (f64, f64, f64) {
    let sorted = sorted(values);
    let n = sorted.len();
    let q2 = median(&sorted);
    let lower = &sorted[..n / 2];
    let upper = &sorted[(n + 1) / 2..];
    let q1 = if lower.is_empty() { q2 } else { median(lower) };
    let q3 = if upper.is_empty() { q2 } else { median(upper) };
    (q1, q2, q3)
}

/// Review progress and score statistics of a conference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    /// Submissions past the SUBMIT status
    pub num_submissions: usize,
    /// Submissions with a positive score
    pub num_scored: usize,
    pub average_score: f64,
    pub median_score: f64,
    pub q1_score: f64,
    pub q3_score: f64,
    pub num_submissions_reviewed: usize,
    pub num_submissions_with_incomplete_reviews: usize,
    pub num_submissions_with_missing_reviewers: usize,
}

impl ReviewStats {
    pub fn compute<'a, I>(submissions: I) -> Self
    where
        I: IntoIterator<Item = &'a SubmissionView>,
    {
        let under_review: Vec<&SubmissionView> = submissions
            .into_iter()
            .filter(|s| s.status() != SubmissionStatus::Submitted)
            .collect();

        let scores: Vec<f64> = under_review
            .iter()
            .map(|s| s.score())
            .filter(|score| *score > 0.0)
            .collect();
        let (q1, q2, q3) = quartiles(&scores);

        Self {
            num_submissions: under_review.len(),
            num_scored: scores.len(),
            average_score: mean(&scores),
            median_score: q2,
            q1_score: q1,
            q3_score: q3,
            num_submissions_reviewed: under_review.iter().filter(|s| s.review_finished()).count(),
            num_submissions_with_incomplete_reviews: under_review
                .iter()
                .filter(|s| s.has_incomplete_reviews())
                .count(),
            num_submissions_with_missing_reviewers: under_review
                .iter()
                .filter(|s| s.count_missing_reviews() > 0)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quality {
    Unknown,
    Low,
    BelowMedian,
    AboveMedian,
    High,
}

/// Place a score relative to the conference quartiles
pub fn qualify_score(score: f64, stats: &ReviewStats) -> Quality {
    if score <= 0.0 {
        Quality::Unknown
    } else if score < stats.q1_score {
        Quality::Low
    } else if score < stats.median_score {
        Quality::BelowMedian
    } else if score < stats.q3_score {
        Quality::AboveMedian
    } else {
        Quality::High
    }
}

/// Number of submissions per status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPartition {
    pub counts: BTreeMap<SubmissionStatus, usize>,
    pub total: usize,
}

impl StatusPartition {
    pub fn compute<'a, I>(submissions: I) -> Self
    where
        I: IntoIterator<Item = &'a SubmissionView>,
    {
        let mut counts: BTreeMap<SubmissionStatus, usize> =
            SubmissionStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut total = 0;
        for sub in submissions {
            *counts.entry(sub.status()).or_insert(0) += 1;
            total += 1;
        }
        Self { counts, total }
    }

    pub fn count(&self, status: SubmissionStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

/// Review feed ordering
///
/// Fully reviewed, scored submissions come first by descending score. The
/// rest follow, those missing more reviewers last, older ones first among
/// equals. The sort is stable.
pub fn sort_review_feed(submissions: &mut [&SubmissionView]) {
    let max_id = submissions.iter().map(|s| s.id()).max().unwrap_or(1).max(1) as f64;
    let key = |s: &SubmissionView| -> f64 {
        let score = s.score();
        let num_missing = s.count_missing_reviews();
        if score > 0.0 && num_missing == 0 {
            score
        } else {
            -(num_missing as f64) - s.id() as f64 / max_id
        }
    };
    submissions.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
}
