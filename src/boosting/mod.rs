//! Gradient boosting backend.
//!
//! [`GradientBooster`] implements [`BoostingBackend`](crate::core::traits::BoostingBackend)
//! with a binary logistic objective ([`objective`]), exact greedy depth-wise
//! trees ([`tree`]) and k-fold cross-validation with early stopping
//! ([`cross_validation`], [`early_stopping`]).

pub mod cross_validation;
pub mod early_stopping;
pub mod gbdt;
pub mod objective;
pub mod tree;

pub use cross_validation::{
    assign_folds, CrossValidationConfig, CrossValidationResult, MetricSummary, RoundEvaluation,
};
pub use early_stopping::{EarlyStopping, EarlyStoppingConfig};
pub use gbdt::{BoostedModel, GradientBooster};
pub use objective::BinaryLogistic;
pub use tree::{GainParams, Tree, TreeGrower, TreeNode};
