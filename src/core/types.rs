//! Core data types shared across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Margin, probability and gradient value type.
pub type Score = f64;

/// Binary training label type (`0.0` or `1.0`).
pub type Label = f32;

/// Immune subtype identifier as found in the input label vector.
pub type SubtypeLabel = u32;

/// Feature index type for identifying columns of a prepared feature matrix.
pub type FeatureIndex = usize;

/// Tree node identifier type.
pub type NodeIndex = usize;

/// Boosting iteration number, 1-based wherever it is reported.
pub type IterationIndex = usize;

/// Metric types tracked during cross-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Binary classification error rate at a 0.5 probability cut
    Error,
    /// Area under the ROC curve
    Auc,
}

impl MetricType {
    /// Whether larger values of this metric are better.
    pub fn higher_is_better(self) -> bool {
        matches!(self, MetricType::Auc)
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricType::Error => write!(f, "error"),
            MetricType::Auc => write!(f, "auc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_direction() {
        assert!(MetricType::Auc.higher_is_better());
        assert!(!MetricType::Error.higher_is_better());
    }

    #[test]
    fn test_metric_display() {
        assert_eq!(MetricType::Error.to_string(), "error");
        assert_eq!(MetricType::Auc.to_string(), "auc");
    }
}
