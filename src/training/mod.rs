//! Training orchestration.
//!
//! Four layers, each built on the previous one:
//!
//! - [`fit_one_model`]: one backend fit with fixed hyperparameters
//! - [`cv_fit_one_model`]: k-fold cross-validation picks the round count,
//!   then one refit with exactly that many rounds
//! - [`fit_subtype_model`]: one cross-validated model per subtype
//! - [`fit_ensemble_model`]: the per-subtype trainer repeated on random
//!   sample subsets across a [`WorkerPool`]
//!
//! The free functions use the bundled [`GradientBooster`] and
//! [`QuantileBinPreparer`]; [`ModelTrainer`] and
//! [`EnsembleTrainer`](crate::ensemble::EnsembleTrainer) accept any
//! [`BoostingBackend`](crate::core::traits::BoostingBackend) and
//! [`DataPreparer`](crate::core::traits::DataPreparer).
//!
//! ```rust,no_run
//! use immune_subtype_classifier::config::{BoostParams, EnsembleConfig, PrepConfig};
//! use immune_subtype_classifier::dataset::{read_expression_csv, read_subtype_labels};
//! use immune_subtype_classifier::ensemble::EnsembleTrainer;
//! use immune_subtype_classifier::training::ModelTrainer;
//!
//! # fn main() -> immune_subtype_classifier::Result<()> {
//! let matrix = read_expression_csv("expression.csv")?;
//! let labels = read_subtype_labels("subtypes.csv", &matrix)?;
//!
//! let trainer = ModelTrainer::new(BoostParams::default(), PrepConfig::default())?;
//! let ensemble = EnsembleTrainer::new(trainer, EnsembleConfig::default())?
//!     .fit(&matrix, labels.as_subtypes()?)?;
//! println!("trained {} members", ensemble.num_members());
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod single;
pub mod subtype;

pub use pool::WorkerPool;
pub use single::{ModelTrainer, TrainedModel};
pub use subtype::{observed_subtypes, SubtypeModels};

use crate::boosting::{BoostedModel, GradientBooster};
use crate::config::{BoostParams, EnsembleConfig, PrepConfig};
use crate::core::error::Result;
use crate::core::types::{Label, SubtypeLabel};
use crate::dataset::{BreakPoints, ExpressionMatrix, QuantileBinPreparer};
use crate::ensemble::{Ensemble, EnsembleTrainer};
use ndarray::{ArrayView1, ArrayView2};

/// Fit one binary-logistic model on `features` (samples × features).
pub fn fit_one_model(
    features: ArrayView2<'_, f32>,
    labels: ArrayView1<'_, Label>,
    params: &BoostParams,
) -> Result<BoostedModel> {
    ModelTrainer::new(params.clone(), PrepConfig::default())?.fit_one(features, labels)
}

/// Cross-validate, refit with the best round count and bundle the model with
/// `breaks` and `genes`.
pub fn cv_fit_one_model(
    features: ArrayView2<'_, f32>,
    labels: ArrayView1<'_, Label>,
    params: &BoostParams,
    breaks: &BreakPoints,
    genes: &[String],
) -> Result<TrainedModel<BoostedModel>> {
    let prep = PrepConfig {
        breaks: breaks.clone(),
        ..PrepConfig::default()
    };
    ModelTrainer::new(params.clone(), prep)?.cv_fit_one(features, labels, breaks, genes)
}

/// Train one cross-validated model per distinct subtype in `labels`.
pub fn fit_subtype_model(
    matrix: &ExpressionMatrix,
    labels: &[SubtypeLabel],
    breaks: &BreakPoints,
    params: &BoostParams,
    tail_fraction: f64,
) -> Result<SubtypeModels<BoostedModel>> {
    let prep = PrepConfig {
        tail_fraction,
        breaks: breaks.clone(),
    };
    ModelTrainer::new(params.clone(), prep)?.fit_subtypes(matrix, labels)
}

/// Train `num_members` per-subtype collections, each on
/// `⌊sample_fraction × samples⌋` randomly drawn samples, on a pool of
/// `num_workers` threads.
#[allow(clippy::too_many_arguments)]
pub fn fit_ensemble_model(
    matrix: &ExpressionMatrix,
    labels: &[SubtypeLabel],
    num_members: usize,
    sample_fraction: f64,
    breaks: &BreakPoints,
    params: &BoostParams,
    tail_fraction: f64,
    num_workers: usize,
    seed: u64,
) -> Result<Ensemble<BoostedModel>> {
    let prep = PrepConfig {
        tail_fraction,
        breaks: breaks.clone(),
    };
    let trainer: ModelTrainer<GradientBooster, QuantileBinPreparer> =
        ModelTrainer::new(params.clone(), prep)?;
    let config = EnsembleConfig {
        num_members,
        sample_fraction,
        num_workers,
        seed,
    };
    EnsembleTrainer::new(trainer, config)?.fit(matrix, labels)
}
