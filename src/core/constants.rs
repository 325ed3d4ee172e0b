//! Domain constants and configuration defaults.

use crate::core::types::MetricType;

/// Number of immune subtypes in the reference classification scheme.
///
/// Training iterates over the subtypes actually present in the labels; this
/// constant only documents the expected count and triggers a warning when the
/// observed count differs.
pub const IMMUNE_SUBTYPE_COUNT: usize = 6;

/// Default maximum tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Default learning rate (shrinkage) applied to every leaf value.
pub const DEFAULT_LEARNING_RATE: f64 = 0.5;

/// Default maximum number of boosting rounds.
pub const DEFAULT_NUM_ROUNDS: usize = 100;

/// Default number of threads used by a single fit.
pub const DEFAULT_NUM_THREADS: usize = 5;

/// Default number of cross-validation folds.
pub const DEFAULT_NUM_FOLDS: usize = 5;

/// Rounds without improvement before cross-validation stops.
pub const DEFAULT_EARLY_STOPPING_ROUNDS: usize = 2;

/// Default L2 regularization on leaf weights.
pub const DEFAULT_LAMBDA: f64 = 1.0;

/// Default minimum hessian sum required in each child of a split.
pub const DEFAULT_MIN_CHILD_WEIGHT: f64 = 1.0;

/// Default minimum gain required to make a split.
pub const DEFAULT_MIN_SPLIT_GAIN: f64 = 0.0;

/// Metrics tracked by cross-validation; the last one drives early stopping.
pub const DEFAULT_CV_METRICS: [MetricType; 2] = [MetricType::Error, MetricType::Auc];

/// Default break points used to bin expression values per sample.
pub const DEFAULT_BREAKS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Default tail proportion used by data preparation.
pub const DEFAULT_TAIL_FRACTION: f64 = 0.5;

/// Default number of ensemble members.
pub const DEFAULT_ENSEMBLE_SIZE: usize = 5;

/// Default fraction of samples retained per ensemble member.
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.7;

/// Default number of ensemble workers.
pub const DEFAULT_NUM_WORKERS: usize = 2;

/// Default random seed for reproducible sampling and fold assignment.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Probability threshold separating the two classes.
pub const CLASSIFICATION_THRESHOLD: f64 = 0.5;

/// Lower bound on the logistic hessian.
pub const MIN_HESSIAN: f64 = 1e-16;
