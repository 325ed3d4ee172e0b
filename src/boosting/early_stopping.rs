//! Early stopping on the cross-validated test metric.

use crate::core::constants::DEFAULT_EARLY_STOPPING_ROUNDS;
use crate::core::types::{IterationIndex, MetricType};

/// Configuration for early stopping behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct EarlyStoppingConfig {
    /// Number of rounds to wait for improvement before stopping
    pub patience: usize,
    /// An update must beat the best value by more than this to count
    pub min_delta: f64,
    /// Whether lower metric values are better
    pub minimize: bool,
}

impl Default for EarlyStoppingConfig {
    fn default() -> Self {
        EarlyStoppingConfig {
            patience: DEFAULT_EARLY_STOPPING_ROUNDS,
            min_delta: 0.0,
            minimize: false,
        }
    }
}

impl EarlyStoppingConfig {
    /// Configuration tracking `metric` with the given patience.
    pub fn for_metric(metric: MetricType, patience: usize) -> Self {
        EarlyStoppingConfig {
            patience,
            min_delta: 0.0,
            minimize: !metric.higher_is_better(),
        }
    }
}

/// Tracks a metric round by round and decides when to stop.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    config: EarlyStoppingConfig,
    best_metric: f64,
    best_iteration: IterationIndex,
    patience_counter: usize,
    rounds_seen: usize,
    stopped: bool,
}

impl EarlyStopping {
    /// Creates a new early stopping monitor with the given configuration.
    pub fn new(config: EarlyStoppingConfig) -> Self {
        let initial_metric = if config.minimize {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };

        EarlyStopping {
            config,
            best_metric: initial_metric,
            best_iteration: 0,
            patience_counter: 0,
            rounds_seen: 0,
            stopped: false,
        }
    }

    /// Record the metric for `iteration` (1-based). Returns whether training
    /// should stop.
    pub fn update(&mut self, metric: f64, iteration: IterationIndex) -> bool {
        if self.stopped {
            return true;
        }
        self.rounds_seen += 1;

        if self.is_improvement(metric) {
            self.best_metric = metric;
            self.best_iteration = iteration;
            self.patience_counter = 0;
        } else {
            self.patience_counter += 1;
        }

        if self.patience_counter >= self.config.patience {
            self.stopped = true;
            log::info!(
                "Early stopping triggered at iteration {} (best was {:.6} at iteration {})",
                iteration,
                self.best_metric,
                self.best_iteration
            );
        }

        self.stopped
    }

    fn is_improvement(&self, metric: f64) -> bool {
        if self.rounds_seen == 1 {
            return true;
        }

        let improvement = if self.config.minimize {
            self.best_metric - metric
        } else {
            metric - self.best_metric
        };
        improvement > self.config.min_delta
    }

    /// Returns true if early stopping has been triggered.
    pub fn should_stop(&self) -> bool {
        self.stopped
    }

    /// Returns the best metric value observed so far.
    pub fn best_metric(&self) -> f64 {
        self.best_metric
    }

    /// Returns the iteration where the best metric was observed, `0` before
    /// any update.
    pub fn best_iteration(&self) -> IterationIndex {
        self.best_iteration
    }

    /// Returns the current patience counter value.
    pub fn patience_counter(&self) -> usize {
        self.patience_counter
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &EarlyStoppingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_after_patience_without_improvement() {
        let mut stopping = EarlyStopping::new(EarlyStoppingConfig::for_metric(MetricType::Auc, 2));

        assert!(!stopping.update(0.70, 1));
        assert!(!stopping.update(0.80, 2));
        assert!(!stopping.update(0.80, 3));
        assert!(stopping.update(0.75, 4));

        assert_eq!(stopping.best_iteration(), 2);
        assert_eq!(stopping.best_metric(), 0.80);
        assert!(stopping.should_stop());
    }

    #[test]
    fn test_improvement_resets_patience() {
        let mut stopping = EarlyStopping::new(EarlyStoppingConfig::for_metric(MetricType::Auc, 2));

        stopping.update(0.5, 1);
        stopping.update(0.5, 2);
        assert_eq!(stopping.patience_counter(), 1);
        stopping.update(0.6, 3);
        assert_eq!(stopping.patience_counter(), 0);
        assert_eq!(stopping.best_iteration(), 3);
    }

    #[test]
    fn test_minimized_metric() {
        let config = EarlyStoppingConfig::for_metric(MetricType::Error, 1);
        assert!(config.minimize);

        let mut stopping = EarlyStopping::new(config);
        assert!(!stopping.update(0.3, 1));
        assert!(!stopping.update(0.2, 2));
        assert!(stopping.update(0.25, 3));
        assert_eq!(stopping.best_iteration(), 2);
    }

    #[test]
    fn test_first_round_counts_even_when_nan() {
        let mut stopping = EarlyStopping::new(EarlyStoppingConfig::default());
        stopping.update(f64::NAN, 1);
        assert_eq!(stopping.best_iteration(), 1);
    }
}
