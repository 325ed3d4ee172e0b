//! CSV loading for expression matrices and sample labels.
//!
//! Expression files carry one row per gene: the first column holds the gene
//! identifier and the header names the samples. Label files carry a
//! `sample,label` pair per row and are aligned to a matrix's sample order.

use crate::core::error::{DatasetError, Result, SubtypeError};
use crate::core::types::SubtypeLabel;
use crate::dataset::labels::LabelVector;
use crate::dataset::matrix::ExpressionMatrix;
use csv::{Reader, ReaderBuilder, StringRecord};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// Tokens read as a missing value
const MISSING_TOKENS: [&str; 4] = ["", "NA", "NaN", "nan"];

/// CSV-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvConfig {
    /// Field delimiter
    pub delimiter: char,
    /// Quote character
    pub quote_char: char,
    /// Comment character
    pub comment_char: Option<char>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        CsvConfig {
            delimiter: ',',
            quote_char: '"',
            comment_char: None,
        }
    }
}

/// Reader for expression and label files
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    csv_config: CsvConfig,
}

impl CsvLoader {
    /// Create a loader for comma-separated files
    pub fn new() -> Self {
        Self::default()
    }

    /// Set delimiter character
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.csv_config.delimiter = delimiter;
        self
    }

    /// Set quote character
    pub fn with_quote_char(mut self, quote_char: char) -> Self {
        self.csv_config.quote_char = quote_char;
        self
    }

    /// Set comment character
    pub fn with_comment_char(mut self, comment_char: char) -> Self {
        self.csv_config.comment_char = Some(comment_char);
        self
    }

    fn open(&self, path: &Path) -> Result<Reader<File>> {
        if !path.is_file() {
            return Err(SubtypeError::dataset(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let file = File::open(path)?;
        Ok(ReaderBuilder::new()
            .delimiter(self.csv_config.delimiter as u8)
            .quote(self.csv_config.quote_char as u8)
            .comment(self.csv_config.comment_char.map(|c| c as u8))
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file))
    }

    /// Load a genes × samples expression matrix.
    pub fn load_expression<P: AsRef<Path>>(&self, path: P) -> Result<ExpressionMatrix> {
        let path = path.as_ref();
        log::info!("Loading expression matrix: {}", path.display());

        let mut reader = self.open(path)?;
        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(SubtypeError::dataset(
                "expression file needs a gene column and at least one sample column",
            ));
        }
        let samples: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut genes = Vec::new();
        let mut values = Vec::new();
        let mut missing = 0usize;
        for (line, result) in reader.records().enumerate() {
            let record = result?;
            if record.len() != headers.len() {
                return Err(SubtypeError::dimension_mismatch(
                    format!("{} columns", headers.len()),
                    format!("{} columns at line {}", record.len(), line + 2),
                ));
            }
            genes.push(record[0].to_string());
            for field in record.iter().skip(1) {
                let value = parse_value::<f32>(field, line + 2)?.unwrap_or_else(|| {
                    missing += 1;
                    f32::NAN
                });
                values.push(value);
            }
        }

        if genes.is_empty() {
            return Err(DatasetError::Empty.into());
        }
        if missing > 0 {
            log::warn!("{} missing expression values read as NaN", missing);
        }
        log::info!(
            "Loaded {} genes across {} samples",
            genes.len(),
            samples.len()
        );

        let values = Array2::from_shape_vec((genes.len(), samples.len()), values)
            .map_err(|e| SubtypeError::internal(e.to_string()))?;
        ExpressionMatrix::new(values, genes, samples)
    }

    /// Load integer subtype labels aligned to `samples`.
    pub fn load_subtype_labels<P: AsRef<Path>>(
        &self,
        path: P,
        samples: &[String],
    ) -> Result<LabelVector> {
        let by_sample = self.read_label_column(path.as_ref())?;
        let labels = align(&by_sample, samples, |field, line| {
            parse_value::<SubtypeLabel>(field, line)?.ok_or_else(|| {
                SubtypeError::dataset(format!("missing subtype label at line {}", line))
            })
        })?;
        Ok(LabelVector::Subtypes(labels))
    }

    /// Load continuous score labels aligned to `samples`; missing scores are
    /// read as NaN.
    pub fn load_score_labels<P: AsRef<Path>>(
        &self,
        path: P,
        samples: &[String],
    ) -> Result<LabelVector> {
        let by_sample = self.read_label_column(path.as_ref())?;
        let scores = align(&by_sample, samples, |field, line| {
            Ok(parse_value::<f64>(field, line)?.unwrap_or(f64::NAN))
        })?;
        Ok(LabelVector::Scores(scores))
    }

    /// Raw `sample -> (label field, line)` pairs.
    fn read_label_column(&self, path: &Path) -> Result<HashMap<String, (String, usize)>> {
        log::info!("Loading labels: {}", path.display());

        let mut reader = self.open(path)?;
        let mut by_sample = HashMap::new();
        for (line, result) in reader.records().enumerate() {
            let record: StringRecord = result?;
            if record.len() < 2 {
                return Err(SubtypeError::dimension_mismatch(
                    "2 columns",
                    format!("{} columns at line {}", record.len(), line + 2),
                ));
            }
            by_sample.insert(record[0].to_string(), (record[1].to_string(), line + 2));
        }
        Ok(by_sample)
    }
}

fn align<T, F>(
    by_sample: &HashMap<String, (String, usize)>,
    samples: &[String],
    parse: F,
) -> Result<Vec<T>>
where
    F: Fn(&str, usize) -> Result<T>,
{
    samples
        .iter()
        .map(|sample| match by_sample.get(sample) {
            Some((field, line)) => parse(field, *line),
            None => Err(DatasetError::MissingLabel {
                sample: sample.clone(),
            }
            .into()),
        })
        .collect()
}

/// `Ok(None)` for a missing-value token.
fn parse_value<T: FromStr>(field: &str, line: usize) -> Result<Option<T>> {
    if MISSING_TOKENS.contains(&field) {
        return Ok(None);
    }
    field.parse::<T>().map(Some).map_err(|_| {
        SubtypeError::dataset(format!("cannot parse '{}' at line {}", field, line))
    })
}

/// Load an expression matrix from a comma-separated file.
pub fn read_expression_csv<P: AsRef<Path>>(path: P) -> Result<ExpressionMatrix> {
    CsvLoader::new().load_expression(path)
}

/// Load subtype labels aligned to the matrix's samples.
pub fn read_subtype_labels<P: AsRef<Path>>(
    path: P,
    matrix: &ExpressionMatrix,
) -> Result<LabelVector> {
    CsvLoader::new().load_subtype_labels(path, matrix.samples())
}

/// Load score labels aligned to the matrix's samples.
pub fn read_score_labels<P: AsRef<Path>>(
    path: P,
    matrix: &ExpressionMatrix,
) -> Result<LabelVector> {
    CsvLoader::new().load_score_labels(path, matrix.samples())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_expression() {
        let file = write_file("gene,s1,s2,s3\nA,1.0,2.0,3.0\nB,4.0,NA,6.0\n");
        let matrix = read_expression_csv(file.path()).unwrap();

        assert_eq!(matrix.genes(), &["A", "B"]);
        assert_eq!(matrix.samples(), &["s1", "s2", "s3"]);
        assert_eq!(matrix.values()[[0, 2]], 3.0);
        assert!(matrix.values()[[1, 1]].is_nan());
    }

    #[test]
    fn test_load_expression_ragged_row() {
        let file = write_file("gene,s1,s2\nA,1.0\n");
        assert!(read_expression_csv(file.path()).is_err());
    }

    #[test]
    fn test_labels_align_to_sample_order() {
        let matrix_file = write_file("gene,s1,s2,s3\nA,1,2,3\n");
        let label_file = write_file("sample,label\ns3,6\ns1,2\ns2,4\n");
        let matrix = read_expression_csv(matrix_file.path()).unwrap();

        let labels = read_subtype_labels(label_file.path(), &matrix).unwrap();
        assert_eq!(labels, LabelVector::Subtypes(vec![2, 4, 6]));
    }

    #[test]
    fn test_missing_label_reported() {
        let matrix_file = write_file("gene,s1,s2\nA,1,2\n");
        let label_file = write_file("sample,label\ns1,1\n");
        let matrix = read_expression_csv(matrix_file.path()).unwrap();

        let err = read_subtype_labels(label_file.path(), &matrix).unwrap_err();
        assert!(err.to_string().contains("s2"));
    }

    #[test]
    fn test_score_labels_with_missing() {
        let matrix_file = write_file("gene,s1,s2\nA,1,2\n");
        let label_file = write_file("sample,score\ns1,0.25\ns2,NA\n");
        let matrix = read_expression_csv(matrix_file.path()).unwrap();

        match read_score_labels(label_file.path(), &matrix).unwrap() {
            LabelVector::Scores(scores) => {
                assert_eq!(scores[0], 0.25);
                assert!(scores[1].is_nan());
            }
            other => panic!("expected scores, got {:?}", other),
        }
    }

    #[test]
    fn test_tab_delimited() {
        let file = write_file("gene\ts1\ts2\nA\t1\t2\n");
        let matrix = CsvLoader::new()
            .with_delimiter('\t')
            .load_expression(file.path())
            .unwrap();
        assert_eq!(matrix.num_samples(), 2);
    }

    #[test]
    fn test_missing_file() {
        assert!(read_expression_csv("/nonexistent/expression.csv").is_err());
    }
}
