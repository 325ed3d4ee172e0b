//! Configuration management.
//!
//! Parameters can be built programmatically through [`BoostParamsBuilder`]
//! or loaded from a TOML file through [`TrainingConfig::load_from_file`].

pub mod core;

pub use self::core::{BoostParams, BoostParamsBuilder, EnsembleConfig, PrepConfig, TrainingConfig};
