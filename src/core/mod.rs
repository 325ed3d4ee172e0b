//! Core infrastructure shared by every other module.
//!
//! - [`types`]: fundamental type aliases and enumerations
//! - [`constants`]: domain constants and configuration defaults
//! - [`error`]: error handling and error types
//! - [`traits`]: the seams to the boosting engine and the data preparer
//!
//! ```rust
//! use immune_subtype_classifier::core::{
//!     constants::DEFAULT_LEARNING_RATE,
//!     error::{Result, SubtypeError},
//!     types::{MetricType, SubtypeLabel},
//! };
//!
//! let subtype: SubtypeLabel = 3;
//! assert!(MetricType::Auc.higher_is_better());
//! assert!(DEFAULT_LEARNING_RATE > 0.0);
//! # let _ = subtype;
//! ```

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::{DatasetError, Result, SubtypeError, TrainingError};
pub use traits::*;
pub use types::*;

use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Install the `env_logger` backend for the `log` facade.
///
/// The default filter is `info`; `RUST_LOG` overrides it. Calling this more
/// than once, or after another logger was installed, is harmless.
pub fn initialize_logging() {
    LOGGING_INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("info");
        // Ignore the error if another logger is already installed
        let _ = env_logger::Builder::from_env(env).try_init();
    });
}
