//! Core configuration structures for training.
//!
//! [`BoostParams`] is the hyperparameter record handed to the boosting
//! backend, [`PrepConfig`] controls data preparation, and [`EnsembleConfig`]
//! controls ensemble sampling and the worker pool. [`TrainingConfig`] bundles
//! the three for loading from a TOML file.

use crate::core::constants::*;
use crate::core::error::{Result, SubtypeError};
use crate::dataset::BreakPoints;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hyperparameters for one boosted classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostParams {
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Shrinkage applied to every leaf value (`eta`)
    pub learning_rate: f64,
    /// Number of boosting rounds (the upper bound during cross-validation)
    pub num_rounds: usize,
    /// Threads used by a single fit or cross-validation run
    pub num_threads: usize,
    /// Number of cross-validation folds
    pub num_folds: usize,
    /// L2 regularization on leaf weights
    pub lambda: f64,
    /// Minimum hessian sum required in each child of a split
    pub min_child_weight: f64,
    /// Minimum gain required to make a split
    pub min_split_gain: f64,
    /// Rounds without improvement before cross-validation stops
    pub early_stopping_rounds: usize,
    /// Seed for cross-validation fold assignment
    pub seed: u64,
}

impl Default for BoostParams {
    fn default() -> Self {
        BoostParams {
            max_depth: DEFAULT_MAX_DEPTH,
            learning_rate: DEFAULT_LEARNING_RATE,
            num_rounds: DEFAULT_NUM_ROUNDS,
            num_threads: DEFAULT_NUM_THREADS,
            num_folds: DEFAULT_NUM_FOLDS,
            lambda: DEFAULT_LAMBDA,
            min_child_weight: DEFAULT_MIN_CHILD_WEIGHT,
            min_split_gain: DEFAULT_MIN_SPLIT_GAIN,
            early_stopping_rounds: DEFAULT_EARLY_STOPPING_ROUNDS,
            seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl BoostParams {
    /// Create a parameter record with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of these parameters with a different round count.
    pub fn with_num_rounds(&self, num_rounds: usize) -> Self {
        BoostParams {
            num_rounds,
            ..self.clone()
        }
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_depth < 1 {
            return Err(SubtypeError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                "must be at least 1",
            ));
        }

        if self.learning_rate <= 0.0 || self.learning_rate > 1.0 {
            return Err(SubtypeError::invalid_parameter(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }

        if self.num_rounds < 1 {
            return Err(SubtypeError::invalid_parameter(
                "num_rounds",
                self.num_rounds.to_string(),
                "must be at least 1",
            ));
        }

        if self.num_threads < 1 {
            return Err(SubtypeError::invalid_parameter(
                "num_threads",
                self.num_threads.to_string(),
                "must be at least 1",
            ));
        } else if self.num_threads > num_cpus::get() * 2 {
            log::warn!(
                "num_threads ({}) is much larger than available cores ({})",
                self.num_threads,
                num_cpus::get()
            );
        }

        if self.num_folds < 2 {
            return Err(SubtypeError::invalid_parameter(
                "num_folds",
                self.num_folds.to_string(),
                "must be at least 2",
            ));
        }

        if self.lambda < 0.0 {
            return Err(SubtypeError::invalid_parameter(
                "lambda",
                self.lambda.to_string(),
                "must be non-negative",
            ));
        }

        if self.min_child_weight < 0.0 {
            return Err(SubtypeError::invalid_parameter(
                "min_child_weight",
                self.min_child_weight.to_string(),
                "must be non-negative",
            ));
        }

        if self.min_split_gain < 0.0 {
            return Err(SubtypeError::invalid_parameter(
                "min_split_gain",
                self.min_split_gain.to_string(),
                "must be non-negative",
            ));
        }

        if self.early_stopping_rounds < 1 {
            return Err(SubtypeError::invalid_parameter(
                "early_stopping_rounds",
                "0",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

/// Builder for [`BoostParams`] that collects validation errors until
/// [`build`](BoostParamsBuilder::build).
#[derive(Debug, Clone, Default)]
pub struct BoostParamsBuilder {
    params: BoostParams,
    validation_errors: Vec<String>,
}

impl BoostParamsBuilder {
    /// Create a new builder starting from the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum tree depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        if depth < 1 {
            self.validation_errors
                .push("max_depth must be at least 1".to_string());
        }
        self.params.max_depth = depth;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, rate: f64) -> Self {
        if rate <= 0.0 || rate > 1.0 {
            self.validation_errors
                .push("learning_rate must be in range (0.0, 1.0]".to_string());
        }
        self.params.learning_rate = rate;
        self
    }

    /// Set the number of boosting rounds
    pub fn num_rounds(mut self, rounds: usize) -> Self {
        self.params.num_rounds = rounds;
        self
    }

    /// Set the number of threads per fit
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.params.num_threads = threads;
        self
    }

    /// Set the number of cross-validation folds
    pub fn num_folds(mut self, folds: usize) -> Self {
        if folds < 2 {
            self.validation_errors
                .push("num_folds must be at least 2".to_string());
        }
        self.params.num_folds = folds;
        self
    }

    /// Set the L2 leaf regularization
    pub fn lambda(mut self, lambda: f64) -> Self {
        if lambda < 0.0 {
            self.validation_errors
                .push("lambda must be non-negative".to_string());
        }
        self.params.lambda = lambda;
        self
    }

    /// Set the minimum child hessian weight
    pub fn min_child_weight(mut self, weight: f64) -> Self {
        self.params.min_child_weight = weight;
        self
    }

    /// Set the minimum split gain
    pub fn min_split_gain(mut self, gain: f64) -> Self {
        self.params.min_split_gain = gain;
        self
    }

    /// Set the early stopping patience
    pub fn early_stopping_rounds(mut self, rounds: usize) -> Self {
        self.params.early_stopping_rounds = rounds;
        self
    }

    /// Set the fold assignment seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    /// Build the parameter record, reporting every recorded error
    pub fn build(self) -> Result<BoostParams> {
        if !self.validation_errors.is_empty() {
            return Err(SubtypeError::config(self.validation_errors.join("; ")));
        }
        self.params.validate()?;
        Ok(self.params)
    }
}

/// Data preparation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Proportion controlling tail trimming during preparation
    pub tail_fraction: f64,
    /// Break points used to bin expression values per sample
    pub breaks: BreakPoints,
}

impl Default for PrepConfig {
    fn default() -> Self {
        PrepConfig {
            tail_fraction: DEFAULT_TAIL_FRACTION,
            breaks: BreakPoints::default(),
        }
    }
}

impl PrepConfig {
    /// Validate the preparation settings
    pub fn validate(&self) -> Result<()> {
        if self.tail_fraction <= 0.0 || self.tail_fraction > 1.0 {
            return Err(SubtypeError::invalid_parameter(
                "tail_fraction",
                self.tail_fraction.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }
        self.breaks.validate()
    }
}

/// Ensemble sampling and worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Number of ensemble members
    pub num_members: usize,
    /// Fraction of samples retained for each member
    pub sample_fraction: f64,
    /// Size of the worker pool
    pub num_workers: usize,
    /// Seed for member subsampling
    pub seed: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            num_members: DEFAULT_ENSEMBLE_SIZE,
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            num_workers: DEFAULT_NUM_WORKERS,
            seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl EnsembleConfig {
    /// Number of samples each member retains out of `total`.
    pub fn member_sample_size(&self, total: usize) -> usize {
        (self.sample_fraction * total as f64).floor() as usize
    }

    /// Validate the ensemble settings
    pub fn validate(&self) -> Result<()> {
        if self.num_members < 1 {
            return Err(SubtypeError::invalid_parameter(
                "num_members",
                self.num_members.to_string(),
                "must be at least 1",
            ));
        }

        if self.sample_fraction <= 0.0 || self.sample_fraction > 1.0 {
            return Err(SubtypeError::invalid_parameter(
                "sample_fraction",
                self.sample_fraction.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }

        if self.num_workers < 1 {
            return Err(SubtypeError::invalid_parameter(
                "num_workers",
                self.num_workers.to_string(),
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

/// Complete training configuration, loadable from TOML.
///
/// ```toml
/// [boost]
/// max_depth = 2
/// learning_rate = 0.5
/// num_rounds = 100
///
/// [prep]
/// tail_fraction = 0.5
/// breaks = [0.0, 0.25, 0.5, 0.75, 1.0]
///
/// [ensemble]
/// num_members = 5
/// sample_fraction = 0.7
/// num_workers = 2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Booster hyperparameters
    pub boost: BoostParams,
    /// Data preparation settings
    pub prep: PrepConfig,
    /// Ensemble settings
    pub ensemble: EnsembleConfig,
}

impl TrainingConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TrainingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.extension().and_then(|s| s.to_str()) != Some("toml") {
            return Err(SubtypeError::config(format!(
                "Unsupported config file format for {}. Use .toml",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.boost.validate()?;
        self.prep.validate()?;
        self.ensemble.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boost_params_defaults() {
        let params = BoostParams::default();
        assert_eq!(params.max_depth, 2);
        assert_eq!(params.learning_rate, 0.5);
        assert_eq!(params.num_rounds, 100);
        assert_eq!(params.num_threads, 5);
        assert_eq!(params.num_folds, 5);
        assert_eq!(params.early_stopping_rounds, 2);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_builder_collects_errors() {
        let result = BoostParamsBuilder::new()
            .learning_rate(-0.1)
            .num_folds(1)
            .build();
        let message = result.unwrap_err().to_string();
        assert!(message.contains("learning_rate"));
        assert!(message.contains("num_folds"));
    }

    #[test]
    fn test_builder_valid() {
        let params = BoostParamsBuilder::new()
            .max_depth(3)
            .learning_rate(0.3)
            .num_rounds(20)
            .num_threads(1)
            .num_folds(3)
            .seed(7)
            .build()
            .unwrap();
        assert_eq!(params.max_depth, 3);
        assert_eq!(params.num_rounds, 20);
        assert_eq!(params.seed, 7);
    }

    #[test]
    fn test_with_num_rounds_keeps_other_fields() {
        let params = BoostParams::default();
        let refit = params.with_num_rounds(7);
        assert_eq!(refit.num_rounds, 7);
        assert_eq!(refit.learning_rate, params.learning_rate);
        assert_eq!(refit.num_folds, params.num_folds);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut params = BoostParams::default();
        params.num_rounds = 0;
        assert!(params.validate().is_err());

        let mut params = BoostParams::default();
        params.max_depth = 0;
        assert!(params.validate().is_err());

        let mut prep = PrepConfig::default();
        prep.tail_fraction = 0.0;
        assert!(prep.validate().is_err());

        let mut ensemble = EnsembleConfig::default();
        ensemble.sample_fraction = 1.5;
        assert!(ensemble.validate().is_err());
    }

    #[test]
    fn test_member_sample_size_floors() {
        let ensemble = EnsembleConfig {
            sample_fraction: 0.7,
            ..EnsembleConfig::default()
        };
        assert_eq!(ensemble.member_sample_size(40), 28);
        assert_eq!(ensemble.member_sample_size(11), 7);
    }

    #[test]
    fn test_toml_partial_sections_use_defaults() {
        let config = TrainingConfig::from_toml_str(
            r#"
            [boost]
            num_rounds = 25
            num_threads = 1

            [ensemble]
            num_members = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.boost.num_rounds, 25);
        assert_eq!(config.boost.max_depth, 2);
        assert_eq!(config.ensemble.num_members, 3);
        assert_eq!(config.ensemble.sample_fraction, 0.7);
        assert_eq!(config.prep, PrepConfig::default());
    }

    #[test]
    fn test_toml_invalid_breaks_rejected() {
        let result = TrainingConfig::from_toml_str(
            r#"
            [prep]
            breaks = [0.0, 0.6, 0.4, 1.0]
            "#,
        );
        assert!(result.is_err());
    }
}
