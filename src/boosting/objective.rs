//! Binary logistic objective.
//!
//! - Loss: `-y*log(σ(m)) - (1-y)*log(1-σ(m))` where σ is the sigmoid of the
//!   raw margin `m`
//! - Gradient: `σ(m) - y`
//! - Hessian: `σ(m)(1-σ(m))`, floored at [`MIN_HESSIAN`]

use crate::core::constants::MIN_HESSIAN;
use crate::core::error::{Result, TrainingError};
use crate::core::types::{Label, Score};
use ndarray::ArrayView1;

/// Binary logistic loss with a base score of 0.5.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BinaryLogistic;

impl BinaryLogistic {
    /// Base probability every model starts from
    pub const BASE_SCORE: Score = 0.5;

    /// Raw margin corresponding to [`BASE_SCORE`](Self::BASE_SCORE)
    pub fn base_margin(&self) -> Score {
        (Self::BASE_SCORE / (1.0 - Self::BASE_SCORE)).ln()
    }

    /// Logistic sigmoid
    #[inline]
    pub fn sigmoid(margin: Score) -> Score {
        1.0 / (1.0 + (-margin).exp())
    }

    /// Reject labels outside `[0, 1]`.
    pub fn check_labels(&self, labels: ArrayView1<'_, Label>) -> Result<()> {
        match labels.iter().position(|&y| !(0.0..=1.0).contains(&y)) {
            Some(index) => Err(TrainingError::InvalidLabel {
                index,
                value: labels[index],
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Fill per-sample gradients and hessians from current margins.
    pub fn compute_gradients(
        &self,
        margins: &[Score],
        labels: ArrayView1<'_, Label>,
        gradients: &mut [f64],
        hessians: &mut [f64],
    ) {
        debug_assert_eq!(margins.len(), labels.len());
        for (i, (&margin, &label)) in margins.iter().zip(labels.iter()).enumerate() {
            let p = Self::sigmoid(margin);
            gradients[i] = p - label as f64;
            hessians[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_base_margin_is_zero() {
        assert_relative_eq!(BinaryLogistic.base_margin(), 0.0);
        assert_relative_eq!(BinaryLogistic::sigmoid(0.0), 0.5);
    }

    #[test]
    fn test_gradients_at_base_score() {
        let labels = array![1.0f32, 0.0];
        let mut gradients = vec![0.0; 2];
        let mut hessians = vec![0.0; 2];
        BinaryLogistic.compute_gradients(
            &[0.0, 0.0],
            labels.view(),
            &mut gradients,
            &mut hessians,
        );

        assert_relative_eq!(gradients[0], -0.5);
        assert_relative_eq!(gradients[1], 0.5);
        assert_relative_eq!(hessians[0], 0.25);
    }

    #[test]
    fn test_hessian_floor() {
        let labels = array![1.0f32];
        let mut gradients = vec![0.0];
        let mut hessians = vec![0.0];
        BinaryLogistic.compute_gradients(
            &[800.0],
            labels.view(),
            &mut gradients,
            &mut hessians,
        );
        assert_eq!(hessians[0], MIN_HESSIAN);
    }

    #[test]
    fn test_label_check() {
        assert!(BinaryLogistic.check_labels(array![0.0f32, 1.0].view()).is_ok());
        assert!(BinaryLogistic.check_labels(array![0.0f32, 2.0].view()).is_err());
        assert!(BinaryLogistic.check_labels(array![f32::NAN].view()).is_err());
    }
}
