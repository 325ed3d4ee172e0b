//! Label vectors, break points and target selection.

use crate::core::constants::DEFAULT_BREAKS;
use crate::core::error::{DatasetError, Result, SubtypeError};
use crate::core::types::SubtypeLabel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One label per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelVector {
    /// Class indicators (immune subtypes)
    Subtypes(Vec<SubtypeLabel>),
    /// Continuous scores
    Scores(Vec<f64>),
}

impl LabelVector {
    /// Number of samples labelled
    pub fn len(&self) -> usize {
        match self {
            LabelVector::Subtypes(labels) => labels.len(),
            LabelVector::Scores(scores) => scores.len(),
        }
    }

    /// Whether the vector is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label kind, for messages
    pub fn kind(&self) -> &'static str {
        match self {
            LabelVector::Subtypes(_) => "subtype",
            LabelVector::Scores(_) => "score",
        }
    }

    /// Subtype labels; score labels are a dataset error.
    pub fn as_subtypes(&self) -> Result<&[SubtypeLabel]> {
        match self {
            LabelVector::Subtypes(labels) => Ok(labels),
            LabelVector::Scores(_) => Err(SubtypeError::dataset(
                "expected subtype labels, found continuous scores",
            )),
        }
    }

    /// Labels restricted to `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<LabelVector> {
        let length = self.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= length) {
            return Err(DatasetError::SampleOutOfRange { index, length }.into());
        }

        Ok(match self {
            LabelVector::Subtypes(labels) => {
                LabelVector::Subtypes(indices.iter().map(|&i| labels[i]).collect())
            }
            LabelVector::Scores(scores) => {
                LabelVector::Scores(indices.iter().map(|&i| scores[i]).collect())
            }
        })
    }
}

/// Which samples count as the positive class during preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSelector {
    /// One subtype against all others
    Subtype(SubtypeLabel),
    /// Upper score tail against lower score tail
    UpperTail,
}

impl TargetSelector {
    /// Selector kind, for messages
    pub fn kind(&self) -> &'static str {
        match self {
            TargetSelector::Subtype(_) => "subtype",
            TargetSelector::UpperTail => "upper-tail",
        }
    }
}

/// Ordered cut points in `[0, 1]` used to bin values by quantile.
///
/// Invariants: at least two points, strictly increasing, first point `0`,
/// last point `1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct BreakPoints(Vec<f64>);

impl BreakPoints {
    /// Create a validated break-point vector
    pub fn new(points: Vec<f64>) -> Result<Self> {
        let breaks = BreakPoints(points);
        breaks.validate()?;
        Ok(breaks)
    }

    /// Check the invariants
    pub fn validate(&self) -> Result<()> {
        let points = &self.0;
        if points.len() < 2 {
            return Err(SubtypeError::invalid_parameter(
                "breaks",
                format!("{:?}", points),
                "needs at least two points",
            ));
        }
        if points.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(SubtypeError::invalid_parameter(
                "breaks",
                format!("{:?}", points),
                "points must lie in [0, 1]",
            ));
        }
        if points.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SubtypeError::invalid_parameter(
                "breaks",
                format!("{:?}", points),
                "points must be strictly increasing",
            ));
        }
        if points[0] != 0.0 || points[points.len() - 1] != 1.0 {
            return Err(SubtypeError::invalid_parameter(
                "breaks",
                format!("{:?}", points),
                "points must span [0, 1]",
            ));
        }
        Ok(())
    }

    /// All break points
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of break points
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated vector
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of bins the points define
    pub fn num_bins(&self) -> usize {
        self.0.len() - 1
    }

    /// Break points strictly inside `(0, 1)`
    pub fn interior(&self) -> &[f64] {
        &self.0[1..self.0.len() - 1]
    }

    /// Quantiles of `sorted` at the interior break points.
    pub fn interior_quantiles(&self, sorted: &[f64]) -> Vec<f64> {
        self.interior()
            .iter()
            .map(|&p| quantile_sorted(sorted, p))
            .collect()
    }
}

impl Default for BreakPoints {
    fn default() -> Self {
        BreakPoints(DEFAULT_BREAKS.to_vec())
    }
}

impl TryFrom<Vec<f64>> for BreakPoints {
    type Error = SubtypeError;

    fn try_from(points: Vec<f64>) -> Result<Self> {
        BreakPoints::new(points)
    }
}

impl From<BreakPoints> for Vec<f64> {
    fn from(breaks: BreakPoints) -> Self {
        breaks.0
    }
}

/// Distinct subtype labels in first-encountered order.
pub fn distinct_subtypes(labels: &[SubtypeLabel]) -> Vec<SubtypeLabel> {
    let mut seen = HashSet::new();
    labels
        .iter()
        .copied()
        .filter(|label| seen.insert(*label))
        .collect()
}

/// Quantile of an ascending slice, linear interpolation between order
/// statistics at position `(n - 1) * p`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
            let lower = h.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            let fraction = h - lower as f64;
            sorted[lower] + fraction * (sorted[upper] - sorted[lower])
        }
    }
}

/// 1-based bin of `value` given ascending interior cut values.
///
/// Bins are right-closed: a value equal to a cut stays in the lower bin.
pub fn bin_index(value: f64, interior_cuts: &[f64]) -> usize {
    1 + interior_cuts.iter().filter(|&&cut| value > cut).count()
}

/// Cut continuous scores into `breaks.num_bins()` quantile bins labelled
/// `1..=num_bins`.
pub fn cut_scores(scores: &[f64], breaks: &BreakPoints) -> Result<Vec<SubtypeLabel>> {
    if scores.is_empty() {
        return Err(DatasetError::Empty.into());
    }
    if let Some(position) = scores.iter().position(|s| !s.is_finite()) {
        return Err(SubtypeError::dataset(format!(
            "score at index {} is not finite",
            position
        )));
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let cuts = breaks.interior_quantiles(&sorted);

    Ok(scores
        .iter()
        .map(|&score| bin_index(score, &cuts) as SubtypeLabel)
        .collect())
}
