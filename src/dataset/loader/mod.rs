//! File loaders for expression matrices and labels.

#[cfg(feature = "csv")]
pub mod csv;

#[cfg(feature = "csv")]
pub use self::csv::{
    read_expression_csv, read_score_labels, read_subtype_labels, CsvConfig, CsvLoader,
};
