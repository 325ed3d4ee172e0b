//! Dataset module: expression matrices, labels and data preparation.
//!
//! An [`ExpressionMatrix`] holds genes × samples expression values. A
//! [`LabelVector`] carries one subtype or score per sample. A
//! [`DataPreparer`](crate::core::traits::DataPreparer) turns both into a
//! [`PreparedData`] training set for one binary target.

pub mod labels;
pub mod loader;
pub mod matrix;
pub mod preparation;

pub use labels::{
    bin_index, cut_scores, distinct_subtypes, quantile_sorted, BreakPoints, LabelVector,
    TargetSelector,
};
pub use matrix::ExpressionMatrix;
pub use preparation::{PreparedData, QuantileBinPreparer};

#[cfg(feature = "csv")]
pub use loader::{read_expression_csv, read_score_labels, read_subtype_labels, CsvLoader};
