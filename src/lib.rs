//! # Immune Subtype Classifier
//!
//! Ensembles of gradient-boosted binary classifiers that predict cancer
//! immune subtypes from gene-expression data.
//!
//! Training is layered:
//!
//! - a **single model** is one boosted-tree fit on a binned feature matrix;
//! - a **cross-validated model** picks its round count with k-fold
//!   cross-validation and early stopping, then refits on all samples;
//! - a **per-subtype collection** holds one cross-validated model per immune
//!   subtype, each trained "this subtype vs rest";
//! - an **ensemble** repeats the per-subtype training on random sample
//!   subsets, spread across a fixed-size worker pool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use immune_subtype_classifier::{fit_ensemble_model, BoostParams, BreakPoints, ExpressionMatrix};
//! use ndarray::Array2;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! immune_subtype_classifier::init_logging();
//!
//! // 100 genes × 40 samples
//! let matrix = ExpressionMatrix::from_values(Array2::zeros((100, 40)))?;
//! let labels: Vec<u32> = (0..40).map(|i| i % 6 + 1).collect();
//!
//! let ensemble = fit_ensemble_model(
//!     &matrix,
//!     &labels,
//!     2,   // members
//!     0.7, // fraction of samples per member
//!     &BreakPoints::default(),
//!     &BoostParams::default(),
//!     0.5, // tail fraction
//!     2,   // workers
//!     42,  // seed
//! )?;
//!
//! for member in &ensemble {
//!     for (subtype, trained) in member.iter() {
//!         println!("subtype {}: {} trees", subtype, trained.model.num_trees());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: types, constants, error handling and the collaborator traits
//! - [`config`]: hyperparameters, preparation and ensemble settings, TOML loading
//! - [`dataset`]: expression matrices, labels, CSV loading and data preparation
//! - [`boosting`]: the bundled gradient-boosted tree engine and cross-validation
//! - [`metrics_eval`]: the binary metrics cross-validation tracks
//! - [`training`]: single, cross-validated and per-subtype training
//! - [`ensemble`]: ensemble training on a worker pool

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Dataset management module
pub mod dataset;

// Boosting module
pub mod boosting;

// Metrics evaluation module
pub mod metrics_eval;

// Training orchestration module
pub mod training;

// Model ensemble module
pub mod ensemble;

// Re-export core functionality for convenience
pub use self::core::{
    constants::*,
    error::{DatasetError, Result, SubtypeError, TrainingError},
    traits::*,
    types::*,
};

// Re-export configuration functionality
pub use self::config::{BoostParams, BoostParamsBuilder, EnsembleConfig, PrepConfig, TrainingConfig};

// Re-export dataset functionality
pub use self::dataset::{
    cut_scores, BreakPoints, ExpressionMatrix, LabelVector, PreparedData, QuantileBinPreparer,
    TargetSelector,
};

// Re-export boosting functionality
pub use self::boosting::{
    BoostedModel, CrossValidationConfig, CrossValidationResult, GradientBooster, RoundEvaluation,
};

// Re-export metrics evaluation functionality
pub use self::metrics_eval::{binary_auc, binary_error, evaluate};

// Re-export training functionality
pub use self::training::{
    cv_fit_one_model, fit_ensemble_model, fit_one_model, fit_subtype_model, ModelTrainer,
    SubtypeModels, TrainedModel, WorkerPool,
};

// Re-export ensemble functionality
pub use self::ensemble::{Ensemble, EnsembleTrainer, MemberTask};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the `env_logger` backend for the `log` facade.
///
/// The default filter is `info`; set `RUST_LOG` to change it. Safe to call
/// more than once.
///
/// ```rust
/// immune_subtype_classifier::init_logging();
/// log::info!("ready");
/// ```
pub fn init_logging() {
    core::initialize_logging()
}
