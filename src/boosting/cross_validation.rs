//! K-fold cross-validation with early stopping.
//!
//! Every fold boosts its own model one round at a time. After each round the
//! configured metrics are averaged over folds, for the training and the
//! held-out parts separately, and the held-out mean of the last metric feeds
//! [`EarlyStopping`].

use crate::boosting::early_stopping::{EarlyStopping, EarlyStoppingConfig};
use crate::boosting::gbdt::BoosterState;
use crate::boosting::objective::BinaryLogistic;
use crate::config::BoostParams;
use crate::core::constants::DEFAULT_CV_METRICS;
use crate::core::error::{Result, SubtypeError, TrainingError};
use crate::core::types::{IterationIndex, Label, MetricType, Score};
use crate::metrics_eval::evaluate;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cross-validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationConfig {
    /// Number of folds
    pub num_folds: usize,
    /// Rounds without improvement of the last metric before stopping
    pub early_stopping_rounds: usize,
    /// Metrics evaluated per round; the last one drives early stopping
    pub metrics: Vec<MetricType>,
    /// Keep class proportions equal across folds
    pub stratified: bool,
    /// Seed for fold assignment
    pub seed: u64,
}

impl CrossValidationConfig {
    /// Settings carried by a hyperparameter record, tracking error and AUC.
    pub fn from_params(params: &BoostParams) -> Self {
        CrossValidationConfig {
            num_folds: params.num_folds,
            early_stopping_rounds: params.early_stopping_rounds,
            metrics: DEFAULT_CV_METRICS.to_vec(),
            stratified: true,
            seed: params.seed,
        }
    }

    /// Metric that drives early stopping
    pub fn stopping_metric(&self) -> Option<MetricType> {
        self.metrics.last().copied()
    }
}

/// Mean and standard deviation of one metric over folds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Metric evaluated
    pub metric: MetricType,
    /// Mean over folds
    pub mean: f64,
    /// Population standard deviation over folds
    pub std: f64,
}

impl MetricSummary {
    fn from_values(metric: MetricType, values: &[f64]) -> Self {
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        MetricSummary {
            metric,
            mean,
            std: variance.sqrt(),
        }
    }
}

/// Fold-averaged metrics after one boosting round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundEvaluation {
    /// 1-based boosting round
    pub iteration: IterationIndex,
    /// Metrics on the training parts
    pub train: Vec<MetricSummary>,
    /// Metrics on the held-out parts
    pub test: Vec<MetricSummary>,
}

impl fmt::Display for RoundEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.iteration)?;
        for (part, summaries) in [("train", &self.train), ("test", &self.test)] {
            for summary in summaries.iter() {
                write!(
                    f,
                    "\t{}-{}:{:.6}+{:.6}",
                    part, summary.metric, summary.mean, summary.std
                )?;
            }
        }
        Ok(())
    }
}

/// Outcome of a cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    /// 1-based round with the best held-out value of the stopping metric
    pub best_iteration: IterationIndex,
    /// Held-out mean of the stopping metric at `best_iteration`
    pub best_score: f64,
    /// One entry per evaluated round
    pub evaluation_log: Vec<RoundEvaluation>,
    /// Number of folds used
    pub num_folds: usize,
}

impl CrossValidationResult {
    /// Number of rounds evaluated before stopping
    pub fn num_rounds_evaluated(&self) -> usize {
        self.evaluation_log.len()
    }

    /// Log entry for the best iteration
    pub fn best_evaluation(&self) -> Option<&RoundEvaluation> {
        self.evaluation_log
            .iter()
            .find(|entry| entry.iteration == self.best_iteration)
    }
}

/// Assign samples to folds, returning the held-out indices of each fold in
/// ascending order.
///
/// Stratified assignment shuffles each class separately and deals the
/// concatenated classes round-robin, so fold sizes differ by at most one and
/// class proportions are as even as possible.
pub fn assign_folds(
    labels: ArrayView1<'_, Label>,
    num_folds: usize,
    stratified: bool,
    seed: u64,
) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let order: Vec<usize> = if stratified {
        let (mut negatives, mut positives): (Vec<usize>, Vec<usize>) =
            (0..labels.len()).partition(|&i| labels[i] <= 0.5);
        negatives.shuffle(&mut rng);
        positives.shuffle(&mut rng);
        negatives.into_iter().chain(positives).collect()
    } else {
        let mut all: Vec<usize> = (0..labels.len()).collect();
        all.shuffle(&mut rng);
        all
    };

    let mut folds = vec![Vec::new(); num_folds];
    for (position, index) in order.into_iter().enumerate() {
        folds[position % num_folds].push(index);
    }
    for fold in folds.iter_mut() {
        fold.sort_unstable();
    }
    folds
}

/// Owned train/test split for one fold.
struct FoldData {
    train_features: Array2<f32>,
    train_labels: Array1<Label>,
    test_features: Array2<f32>,
    test_labels: Array1<Label>,
}

impl FoldData {
    fn split(
        features: ArrayView2<'_, f32>,
        labels: ArrayView1<'_, Label>,
        test: &[usize],
    ) -> Self {
        let mut is_test = vec![false; labels.len()];
        for &i in test {
            is_test[i] = true;
        }
        let train: Vec<usize> = (0..labels.len()).filter(|&i| !is_test[i]).collect();

        FoldData {
            train_features: features.select(Axis(0), &train),
            train_labels: labels.select(Axis(0), &train),
            test_features: features.select(Axis(0), test),
            test_labels: labels.select(Axis(0), test),
        }
    }
}

/// Boosting state of one fold plus its held-out margins.
struct FoldState<'a> {
    booster: BoosterState<'a, 'a>,
    test_features: ArrayView2<'a, f32>,
    test_labels: ArrayView1<'a, Label>,
    test_margins: Vec<Score>,
}

impl<'a> FoldState<'a> {
    fn new(data: &'a FoldData, params: &BoostParams) -> Self {
        FoldState {
            booster: BoosterState::new(
                data.train_features.view(),
                data.train_labels.view(),
                params,
            ),
            test_features: data.test_features.view(),
            test_labels: data.test_labels.view(),
            test_margins: vec![BinaryLogistic.base_margin(); data.test_labels.len()],
        }
    }

    /// Boost one round, returning train and test metric values.
    fn advance(&mut self, metrics: &[MetricType]) -> (Vec<f64>, Vec<f64>) {
        let tree = self.booster.boost_round();
        for (margin, row) in self.test_margins.iter_mut().zip(self.test_features.rows()) {
            *margin += tree.predict_row(row);
        }

        let train_probabilities = self.booster.probabilities();
        let test_probabilities: Array1<Score> = self
            .test_margins
            .iter()
            .map(|&m| BinaryLogistic::sigmoid(m))
            .collect();

        let train = metrics
            .iter()
            .map(|&metric| evaluate(metric, train_probabilities.view(), self.booster.labels()))
            .collect();
        let test = metrics
            .iter()
            .map(|&metric| evaluate(metric, test_probabilities.view(), self.test_labels))
            .collect();
        (train, test)
    }
}

fn summarize(metrics: &[MetricType], per_fold: &[Vec<f64>]) -> Vec<MetricSummary> {
    metrics
        .iter()
        .enumerate()
        .map(|(m, &metric)| {
            let values: Vec<f64> = per_fold.iter().map(|fold| fold[m]).collect();
            MetricSummary::from_values(metric, &values)
        })
        .collect()
}

/// Validate the fold layout against the data.
fn check_folds(labels: ArrayView1<'_, Label>, cv: &CrossValidationConfig) -> Result<()> {
    if cv.num_folds < 2 {
        return Err(SubtypeError::invalid_parameter(
            "num_folds",
            cv.num_folds.to_string(),
            "must be at least 2",
        ));
    }
    if cv.num_folds > labels.len() {
        return Err(TrainingError::InsufficientData {
            required: cv.num_folds,
            actual: labels.len(),
        }
        .into());
    }
    if cv.metrics.is_empty() {
        return Err(SubtypeError::invalid_parameter(
            "metrics",
            "[]",
            "at least one metric is required",
        ));
    }
    if cv.early_stopping_rounds < 1 {
        return Err(SubtypeError::invalid_parameter(
            "early_stopping_rounds",
            "0",
            "must be at least 1",
        ));
    }

    let positives = labels.iter().filter(|&&y| y > 0.5).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(TrainingError::SingleClass {
            positives,
            negatives,
        }
        .into());
    }
    Ok(())
}

/// Run cross-validation on the current rayon pool.
pub(crate) fn run(
    features: ArrayView2<'_, f32>,
    labels: ArrayView1<'_, Label>,
    params: &BoostParams,
    cv: &CrossValidationConfig,
) -> Result<CrossValidationResult> {
    check_folds(labels, cv)?;
    let stopping_metric = cv.stopping_metric().ok_or_else(|| {
        SubtypeError::internal("cross-validation has no stopping metric")
    })?;

    let folds = assign_folds(labels, cv.num_folds, cv.stratified, cv.seed);
    let fold_data: Vec<FoldData> = folds
        .iter()
        .map(|test| FoldData::split(features, labels, test))
        .collect();
    let mut states: Vec<FoldState<'_>> = fold_data
        .iter()
        .map(|data| FoldState::new(data, params))
        .collect();

    let mut stopping = EarlyStopping::new(EarlyStoppingConfig::for_metric(
        stopping_metric,
        cv.early_stopping_rounds,
    ));
    let mut evaluation_log = Vec::new();

    for iteration in 1..=params.num_rounds {
        let results: Vec<(Vec<f64>, Vec<f64>)> = states
            .par_iter_mut()
            .map(|state| state.advance(&cv.metrics))
            .collect();
        let (train, test): (Vec<Vec<f64>>, Vec<Vec<f64>>) = results.into_iter().unzip();

        let entry = RoundEvaluation {
            iteration,
            train: summarize(&cv.metrics, &train),
            test: summarize(&cv.metrics, &test),
        };
        log::debug!("{}", entry);

        let stopping_value = entry.test.last().map_or(f64::NAN, |summary| summary.mean);
        evaluation_log.push(entry);
        if stopping.update(stopping_value, iteration) {
            break;
        }
    }

    if evaluation_log.is_empty() || stopping.best_iteration() == 0 {
        return Err(TrainingError::NoBestIteration.into());
    }

    Ok(CrossValidationResult {
        best_iteration: stopping.best_iteration(),
        best_score: stopping.best_metric(),
        evaluation_log,
        num_folds: cv.num_folds,
    })
}
