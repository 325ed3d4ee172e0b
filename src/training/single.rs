//! Single-model training, with and without cross-validated round selection.

use crate::boosting::cross_validation::CrossValidationConfig;
use crate::boosting::gbdt::GradientBooster;
use crate::config::{BoostParams, PrepConfig, TrainingConfig};
use crate::core::error::{Result, TrainingError};
use crate::core::traits::{BoostingBackend, DataPreparer};
use crate::core::types::{IterationIndex, Label};
use crate::dataset::preparation::QuantileBinPreparer;
use crate::dataset::BreakPoints;
use ndarray::{ArrayView1, ArrayView2};

/// A fitted classifier bundled with the break points and genes it was
/// trained with.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel<M> {
    /// Fitted classifier
    pub model: M,
    /// Break points used to bin the training features
    pub breaks: BreakPoints,
    /// Gene identifiers, one per feature column
    pub genes: Vec<String>,
    /// Round count chosen by cross-validation and used for the refit
    pub best_iteration: IterationIndex,
}

/// Orchestrates a boosting backend and a data preparer under one set of
/// hyperparameters and preparation settings.
#[derive(Debug, Clone)]
pub struct ModelTrainer<B = GradientBooster, P = QuantileBinPreparer> {
    pub(crate) backend: B,
    pub(crate) preparer: P,
    pub(crate) params: BoostParams,
    pub(crate) prep: PrepConfig,
}

impl ModelTrainer {
    /// Trainer using the bundled backend and preparer.
    pub fn new(params: BoostParams, prep: PrepConfig) -> Result<Self> {
        Self::with_components(GradientBooster, QuantileBinPreparer, params, prep)
    }

    /// Trainer configured from the `boost` and `prep` sections.
    pub fn from_config(config: &TrainingConfig) -> Result<Self> {
        Self::new(config.boost.clone(), config.prep.clone())
    }
}

impl<B: BoostingBackend, P: DataPreparer> ModelTrainer<B, P> {
    /// Trainer over custom components; validates the settings.
    pub fn with_components(
        backend: B,
        preparer: P,
        params: BoostParams,
        prep: PrepConfig,
    ) -> Result<Self> {
        params.validate()?;
        prep.validate()?;
        Ok(ModelTrainer {
            backend,
            preparer,
            params,
            prep,
        })
    }

    /// Hyperparameters
    pub fn params(&self) -> &BoostParams {
        &self.params
    }

    /// Preparation settings
    pub fn prep(&self) -> &PrepConfig {
        &self.prep
    }

    /// Boosting backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fit one model with the configured round count.
    ///
    /// `features` is samples × features, `labels` holds `0.0`/`1.0`.
    pub fn fit_one(
        &self,
        features: ArrayView2<'_, f32>,
        labels: ArrayView1<'_, Label>,
    ) -> Result<B::Model> {
        self.backend.fit(features, labels, &self.params)
    }

    /// Pick a round count by k-fold cross-validation, then refit on all
    /// samples with exactly that many rounds.
    pub fn cv_fit_one(
        &self,
        features: ArrayView2<'_, f32>,
        labels: ArrayView1<'_, Label>,
        breaks: &BreakPoints,
        genes: &[String],
    ) -> Result<TrainedModel<B::Model>> {
        let cv = CrossValidationConfig::from_params(&self.params);
        let result = self
            .backend
            .cross_validate(features, labels, &self.params, &cv)?;

        let best_iteration = result.best_iteration;
        if best_iteration < 1 || best_iteration > self.params.num_rounds {
            return Err(TrainingError::NoBestIteration.into());
        }
        log::debug!(
            "{}: best iteration {} of {} (test {} {:.6})",
            self.backend.name(),
            best_iteration,
            result.num_rounds_evaluated(),
            cv.stopping_metric().map_or("metric".to_string(), |m| m.to_string()),
            result.best_score
        );

        let model = self
            .backend
            .fit(features, labels, &self.params.with_num_rounds(best_iteration))?;

        Ok(TrainedModel {
            model,
            breaks: breaks.clone(),
            genes: genes.to_vec(),
            best_iteration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boosting::cross_validation::CrossValidationResult;
    use crate::core::error::SubtypeError;
    use ndarray::{Array1, Array2};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that records the round count of every fit.
    #[derive(Debug, Default)]
    struct RecordingBackend {
        fits: AtomicUsize,
        last_rounds: AtomicUsize,
        best_iteration: usize,
    }

    impl BoostingBackend for RecordingBackend {
        type Model = usize;

        fn fit(
            &self,
            _features: ArrayView2<'_, f32>,
            _labels: ArrayView1<'_, Label>,
            params: &BoostParams,
        ) -> Result<usize> {
            self.fits.fetch_add(1, Ordering::SeqCst);
            self.last_rounds.store(params.num_rounds, Ordering::SeqCst);
            Ok(params.num_rounds)
        }

        fn cross_validate(
            &self,
            _features: ArrayView2<'_, f32>,
            _labels: ArrayView1<'_, Label>,
            _params: &BoostParams,
            cv: &CrossValidationConfig,
        ) -> Result<CrossValidationResult> {
            if self.best_iteration == 0 {
                return Err(SubtypeError::training("no rounds"));
            }
            Ok(CrossValidationResult {
                best_iteration: self.best_iteration,
                best_score: 0.9,
                evaluation_log: Vec::new(),
                num_folds: cv.num_folds,
            })
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn trainer(best_iteration: usize) -> ModelTrainer<RecordingBackend, QuantileBinPreparer> {
        ModelTrainer::with_components(
            RecordingBackend {
                best_iteration,
                ..RecordingBackend::default()
            },
            QuantileBinPreparer,
            BoostParams::default(),
            PrepConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_fit_one_calls_backend_once() {
        let trainer = trainer(3);
        let features = Array2::<f32>::zeros((4, 2));
        let labels = Array1::<Label>::zeros(4);
        let rounds = trainer.fit_one(features.view(), labels.view()).unwrap();

        assert_eq!(rounds, 100);
        assert_eq!(trainer.backend().fits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cv_fit_refits_with_best_iteration() {
        let trainer = trainer(7);
        let features = Array2::<f32>::zeros((4, 2));
        let labels = Array1::<Label>::zeros(4);
        let genes = vec!["a".to_string(), "b".to_string()];
        let trained = trainer
            .cv_fit_one(features.view(), labels.view(), &BreakPoints::default(), &genes)
            .unwrap();

        assert_eq!(trained.model, 7);
        assert_eq!(trained.best_iteration, 7);
        assert_eq!(trained.genes, genes);
        assert_eq!(trained.breaks, BreakPoints::default());
        assert_eq!(trainer.backend().last_rounds.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_cv_fit_rejects_out_of_range_iteration() {
        let trainer = trainer(500);
        let features = Array2::<f32>::zeros((4, 2));
        let labels = Array1::<Label>::zeros(4);
        let err = trainer
            .cv_fit_one(features.view(), labels.view(), &BreakPoints::default(), &[])
            .unwrap_err();
        assert_eq!(err.category(), "training");
        assert_eq!(trainer.backend().fits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backend_errors_propagate() {
        let trainer = trainer(0);
        let features = Array2::<f32>::zeros((4, 2));
        let labels = Array1::<Label>::zeros(4);
        let err = trainer
            .cv_fit_one(features.view(), labels.view(), &BreakPoints::default(), &[])
            .unwrap_err();
        assert!(err.to_string().contains("no rounds"));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let params = BoostParams {
            num_folds: 1,
            ..BoostParams::default()
        };
        assert!(ModelTrainer::new(params, PrepConfig::default()).is_err());
    }
}
