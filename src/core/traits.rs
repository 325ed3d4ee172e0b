//! Trait seams between the training orchestration and its collaborators.
//!
//! The orchestration in [`crate::training`] never touches a concrete tree
//! engine or preprocessing routine directly; it goes through these traits so
//! that the bundled [`GradientBooster`](crate::boosting::GradientBooster) and
//! [`QuantileBinPreparer`](crate::dataset::QuantileBinPreparer) can be swapped
//! for other implementations.

use crate::boosting::cross_validation::{CrossValidationConfig, CrossValidationResult};
use crate::config::BoostParams;
use crate::core::error::Result;
use crate::core::types::Label;
use crate::dataset::{BreakPoints, ExpressionMatrix, LabelVector, PreparedData, TargetSelector};
use ndarray::{ArrayView1, ArrayView2};
use std::fmt::Debug;

/// A boosted-tree training engine with a binary-logistic objective.
///
/// Feature matrices are samples × features; labels are `0.0`/`1.0`.
pub trait BoostingBackend: Send + Sync + Debug {
    /// Fitted classifier produced by this backend.
    type Model: Clone + Debug + Send + Sync;

    /// Fit one model with `params.num_rounds` boosting rounds.
    fn fit(
        &self,
        features: ArrayView2<'_, f32>,
        labels: ArrayView1<'_, Label>,
        params: &BoostParams,
    ) -> Result<Self::Model>;

    /// Run k-fold cross-validation with early stopping and report the best
    /// iteration together with the per-round evaluation log.
    fn cross_validate(
        &self,
        features: ArrayView2<'_, f32>,
        labels: ArrayView1<'_, Label>,
        params: &BoostParams,
        cv: &CrossValidationConfig,
    ) -> Result<CrossValidationResult>;

    /// Backend name used in log messages.
    fn name(&self) -> &'static str;
}

/// Turns a full expression matrix and label vector into a one-vs-rest
/// training set for a single target.
pub trait DataPreparer: Send + Sync + Debug {
    /// Binarize `labels` against `selector`, trim by `tail_fraction` and bin
    /// expression values with `breaks`.
    fn prepare(
        &self,
        matrix: &ExpressionMatrix,
        labels: &LabelVector,
        selector: TargetSelector,
        tail_fraction: f64,
        breaks: &BreakPoints,
    ) -> Result<PreparedData>;
}
