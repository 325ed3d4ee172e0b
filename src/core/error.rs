//! Error handling and error types for the immune subtype classifier.
//!
//! Every fallible operation in the crate returns [`Result`], and failures
//! from the boosting backend, the data preparer and the worker pool are
//! propagated to the caller unchanged. There is no partial-failure
//! tolerance: one failing subtype fit or ensemble member aborts the
//! enclosing call.

use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum SubtypeError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Dataset-related errors
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Training-related errors
    #[error("Training error: {message}")]
    Training { message: String },

    /// Worker pool and thread synchronization errors
    #[error("Threading error: {message}")]
    Threading { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// CSV parsing errors
    #[cfg(feature = "csv")]
    #[error("CSV parsing error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// TOML configuration parsing errors
    #[error("TOML error: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },

    /// Internal errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Dataset-specific errors
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Empty dataset provided")]
    Empty,

    #[error("Label count mismatch: {samples} samples, {labels} labels")]
    LabelCountMismatch { samples: usize, labels: usize },

    #[error("Identifier count mismatch for {axis}: expected {expected}, got {actual}")]
    IdentifierMismatch {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Sample index {index} out of range for {length} samples")]
    SampleOutOfRange { index: usize, length: usize },

    #[error("Sample '{sample}' has no label")]
    MissingLabel { sample: String },

    #[error("Selector {selector} cannot be applied to {labels} labels")]
    SelectorMismatch {
        selector: &'static str,
        labels: &'static str,
    },
}

/// Training-specific errors
#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("Labels contain a single class: {positives} positive, {negatives} negative")]
    SingleClass { positives: usize, negatives: usize },

    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Label {value} at index {index} is outside [0, 1]")]
    InvalidLabel { index: usize, value: f32 },

    #[error("Cross-validation evaluated no boosting rounds")]
    NoBestIteration,

    #[error("Ensemble member {member} panicked: {reason}")]
    WorkerPanicked { member: usize, reason: String },
}

/// Type alias for Results using SubtypeError
pub type Result<T> = std::result::Result<T, SubtypeError>;

impl SubtypeError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SubtypeError::Config {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        SubtypeError::Dataset {
            message: message.into(),
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        SubtypeError::Training {
            message: message.into(),
        }
    }

    /// Create a threading error
    pub fn threading<S: Into<String>>(message: S) -> Self {
        SubtypeError::Threading {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        SubtypeError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        SubtypeError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        SubtypeError::Internal {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            SubtypeError::Config { .. } => "config",
            SubtypeError::Dataset { .. } => "dataset",
            SubtypeError::Training { .. } => "training",
            SubtypeError::Threading { .. } => "threading",
            SubtypeError::InvalidParameter { .. } => "invalid_parameter",
            SubtypeError::DimensionMismatch { .. } => "dimension_mismatch",
            SubtypeError::IO { .. } => "io",
            #[cfg(feature = "csv")]
            SubtypeError::Csv { .. } => "csv",
            SubtypeError::Toml { .. } => "toml",
            SubtypeError::Internal { .. } => "internal",
        }
    }
}

impl From<DatasetError> for SubtypeError {
    fn from(err: DatasetError) -> Self {
        SubtypeError::Dataset {
            message: err.to_string(),
        }
    }
}

impl From<TrainingError> for SubtypeError {
    fn from(err: TrainingError) -> Self {
        match err {
            TrainingError::WorkerPanicked { .. } => SubtypeError::Threading {
                message: err.to_string(),
            },
            _ => SubtypeError::Training {
                message: err.to_string(),
            },
        }
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::SubtypeError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::SubtypeError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! dataset_error {
    ($msg:expr) => {
        $crate::core::error::SubtypeError::dataset($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::SubtypeError::dataset(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! training_error {
    ($msg:expr) => {
        $crate::core::error::SubtypeError::training($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::SubtypeError::training(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SubtypeError::config("test configuration error");
        assert_eq!(err.category(), "config");

        let err = SubtypeError::training("test training error");
        assert_eq!(err.category(), "training");
    }

    #[test]
    fn test_error_macros() {
        let err = config_error!("test error");
        assert!(matches!(err, SubtypeError::Config { .. }));

        let err = dataset_error!("test error with param: {}", 42);
        assert!(matches!(err, SubtypeError::Dataset { .. }));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_specialized_errors() {
        let err: SubtypeError = DatasetError::Empty.into();
        assert!(matches!(err, SubtypeError::Dataset { .. }));

        let err: SubtypeError = TrainingError::SingleClass {
            positives: 0,
            negatives: 12,
        }
        .into();
        assert!(matches!(err, SubtypeError::Training { .. }));
        assert!(err.to_string().contains("single class"));

        let err: SubtypeError = TrainingError::WorkerPanicked {
            member: 3,
            reason: "boom".to_string(),
        }
        .into();
        assert_eq!(err.category(), "threading");
    }

    #[test]
    fn test_parameter_errors() {
        let err = SubtypeError::invalid_parameter("learning_rate", "-0.5", "must be positive");
        assert_eq!(err.category(), "invalid_parameter");
        assert!(err.to_string().contains("learning_rate"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: SubtypeError = io_err.into();
        assert!(matches!(err, SubtypeError::IO { .. }));
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_ensure_macro() {
        fn check(value: usize) -> Result<usize> {
            ensure!(value > 1, SubtypeError::config("value must exceed 1"));
            Ok(value)
        }
        assert!(check(2).is_ok());
        assert!(check(0).is_err());
    }
}
