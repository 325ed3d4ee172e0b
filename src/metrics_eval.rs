//! Evaluation metrics for binary classifiers.
//!
//! Cross-validation uses [`evaluate`] to score each fold per round.

use crate::core::constants::CLASSIFICATION_THRESHOLD;
use crate::core::types::{Label, MetricType, Score};
use ndarray::ArrayView1;

/// Evaluate one metric on predicted probabilities.
pub fn evaluate(
    metric: MetricType,
    probabilities: ArrayView1<'_, Score>,
    labels: ArrayView1<'_, Label>,
) -> f64 {
    match metric {
        MetricType::Error => binary_error(probabilities, labels),
        MetricType::Auc => binary_auc(probabilities, labels),
    }
}

/// Fraction of samples whose thresholded probability disagrees with the
/// label. `0.0` for an empty set.
pub fn binary_error(probabilities: ArrayView1<'_, Score>, labels: ArrayView1<'_, Label>) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }

    let wrong = probabilities
        .iter()
        .zip(labels.iter())
        .filter(|&(&p, &y)| (p > CLASSIFICATION_THRESHOLD) != (y > 0.5))
        .count();
    wrong as f64 / labels.len() as f64
}

/// Rank-based AUC with tied scores sharing their average rank.
///
/// Returns `0.5` when only one class is present.
pub fn binary_auc(probabilities: ArrayView1<'_, Score>, labels: ArrayView1<'_, Label>) -> f64 {
    let n = labels.len();
    let positives = labels.iter().filter(|&&y| y > 0.5).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| probabilities[a].total_cmp(&probabilities[b]));

    // Sum of 1-based ranks over positives, ties averaged
    let mut rank_sum = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && probabilities[order[end]] == probabilities[order[start]] {
            end += 1;
        }
        let average_rank = (start + end + 1) as f64 / 2.0;
        let tied_positives = order[start..end]
            .iter()
            .filter(|&&i| labels[i] > 0.5)
            .count();
        rank_sum += average_rank * tied_positives as f64;
        start = end;
    }

    let p = positives as f64;
    (rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_binary_error() {
        let probabilities = array![0.9, 0.2, 0.6, 0.4];
        let labels = array![1.0f32, 0.0, 0.0, 0.0];
        assert_relative_eq!(binary_error(probabilities.view(), labels.view()), 0.25);
    }

    #[test]
    fn test_auc_perfect_and_inverted() {
        let labels = array![0.0f32, 0.0, 1.0, 1.0];
        let perfect = array![0.1, 0.2, 0.8, 0.9];
        let inverted = array![0.9, 0.8, 0.2, 0.1];
        assert_relative_eq!(binary_auc(perfect.view(), labels.view()), 1.0);
        assert_relative_eq!(binary_auc(inverted.view(), labels.view()), 0.0);
    }

    #[test]
    fn test_auc_ties_count_half() {
        let labels = array![0.0f32, 1.0];
        let tied = array![0.5, 0.5];
        assert_relative_eq!(binary_auc(tied.view(), labels.view()), 0.5);

        // one of four pairs tied, the rest ordered correctly
        let labels = array![0.0f32, 0.0, 1.0, 1.0];
        let scores = array![0.1, 0.6, 0.6, 0.9];
        assert_relative_eq!(binary_auc(scores.view(), labels.view()), 0.875);
    }

    #[test]
    fn test_auc_single_class() {
        let labels = array![1.0f32, 1.0, 1.0];
        let scores = array![0.1, 0.5, 0.9];
        assert_relative_eq!(binary_auc(scores.view(), labels.view()), 0.5);
    }

    #[test]
    fn test_evaluate_dispatch() {
        let probabilities = array![0.7, 0.4];
        let labels = array![0.0f32, 1.0];
        assert_relative_eq!(
            evaluate(MetricType::Error, probabilities.view(), labels.view()),
            1.0
        );
        assert_relative_eq!(
            evaluate(MetricType::Auc, probabilities.view(), labels.view()),
            0.0
        );
    }
}
