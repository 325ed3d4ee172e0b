//! Gene-expression matrix: genes (rows) × samples (columns).

use crate::core::error::{DatasetError, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Expression values with gene and sample identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionMatrix {
    /// Expression values (num_genes × num_samples)
    values: Array2<f32>,
    /// Gene identifiers, one per row
    genes: Vec<String>,
    /// Sample identifiers, one per column
    samples: Vec<String>,
}

impl ExpressionMatrix {
    /// Create a matrix, checking identifiers against the dimensions.
    pub fn new(values: Array2<f32>, genes: Vec<String>, samples: Vec<String>) -> Result<Self> {
        let (num_genes, num_samples) = values.dim();
        if num_genes == 0 || num_samples == 0 {
            return Err(DatasetError::Empty.into());
        }
        if genes.len() != num_genes {
            return Err(DatasetError::IdentifierMismatch {
                axis: "genes",
                expected: num_genes,
                actual: genes.len(),
            }
            .into());
        }
        if samples.len() != num_samples {
            return Err(DatasetError::IdentifierMismatch {
                axis: "samples",
                expected: num_samples,
                actual: samples.len(),
            }
            .into());
        }

        Ok(ExpressionMatrix {
            values,
            genes,
            samples,
        })
    }

    /// Create a matrix with generated identifiers `gene_1..` and `sample_1..`.
    pub fn from_values(values: Array2<f32>) -> Result<Self> {
        let (num_genes, num_samples) = values.dim();
        let genes = (1..=num_genes).map(|i| format!("gene_{}", i)).collect();
        let samples = (1..=num_samples).map(|j| format!("sample_{}", j)).collect();
        Self::new(values, genes, samples)
    }

    /// Expression values (genes × samples)
    pub fn values(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// Gene identifiers in row order
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    /// Sample identifiers in column order
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Number of genes (rows)
    pub fn num_genes(&self) -> usize {
        self.values.nrows()
    }

    /// Number of samples (columns)
    pub fn num_samples(&self) -> usize {
        self.values.ncols()
    }

    /// Expression profile of one gene across all samples
    pub fn gene_values(&self, gene: usize) -> ArrayView1<'_, f32> {
        self.values.row(gene)
    }

    /// Matrix restricted to the given sample columns, in the given order.
    pub fn select_samples(&self, indices: &[usize]) -> Result<ExpressionMatrix> {
        let length = self.num_samples();
        if let Some(&index) = indices.iter().find(|&&i| i >= length) {
            return Err(DatasetError::SampleOutOfRange { index, length }.into());
        }

        Self::new(
            self.values.select(Axis(1), indices),
            self.genes.clone(),
            indices.iter().map(|&i| self.samples[i].clone()).collect(),
        )
    }

    /// Matrix restricted to the given gene rows, in the given order.
    pub fn select_genes(&self, indices: &[usize]) -> Result<ExpressionMatrix> {
        let length = self.num_genes();
        if let Some(&index) = indices.iter().find(|&&i| i >= length) {
            return Err(DatasetError::SampleOutOfRange { index, length }.into());
        }

        Self::new(
            self.values.select(Axis(0), indices),
            indices.iter().map(|&i| self.genes[i].clone()).collect(),
            self.samples.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_matrix() -> ExpressionMatrix {
        ExpressionMatrix::from_values(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap()
    }

    #[test]
    fn test_dimensions_and_identifiers() {
        let matrix = small_matrix();
        assert_eq!(matrix.num_genes(), 2);
        assert_eq!(matrix.num_samples(), 3);
        assert_eq!(matrix.genes(), &["gene_1", "gene_2"]);
        assert_eq!(matrix.samples()[2], "sample_3");
    }

    #[test]
    fn test_identifier_mismatch_rejected() {
        let result = ExpressionMatrix::new(
            array![[1.0, 2.0]],
            vec!["g".to_string()],
            vec!["only_one".to_string()],
        );
        assert!(result.is_err());
        assert!(ExpressionMatrix::from_values(Array2::zeros((0, 3))).is_err());
    }

    #[test]
    fn test_select_samples() {
        let subset = small_matrix().select_samples(&[2, 0]).unwrap();
        assert_eq!(subset.values(), array![[3.0, 1.0], [6.0, 4.0]]);
        assert_eq!(subset.samples(), &["sample_3", "sample_1"]);
        assert_eq!(subset.genes(), &["gene_1", "gene_2"]);
    }

    #[test]
    fn test_select_genes() {
        let subset = small_matrix().select_genes(&[1]).unwrap();
        assert_eq!(subset.values(), array![[4.0, 5.0, 6.0]]);
        assert_eq!(subset.genes(), &["gene_2"]);
    }

    #[test]
    fn test_select_out_of_range() {
        assert!(small_matrix().select_samples(&[3]).is_err());
        assert!(small_matrix().select_genes(&[2]).is_err());
    }
}
