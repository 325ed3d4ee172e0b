//! One-vs-rest data preparation: binarize labels, select genes, bin values.

use crate::core::error::{DatasetError, Result, TrainingError};
use crate::core::traits::DataPreparer;
use crate::core::types::Label;
use crate::dataset::labels::{
    bin_index, quantile_sorted, BreakPoints, LabelVector, TargetSelector,
};
use crate::dataset::matrix::ExpressionMatrix;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Binned training set for one binary target.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    /// Binned features (num_samples × num_genes)
    pub features: Array2<f32>,
    /// Binary labels, `0.0` or `1.0`
    pub labels: Array1<Label>,
    /// Gene identifiers, one per feature column
    pub genes: Vec<String>,
}

impl PreparedData {
    /// Number of samples (rows)
    pub fn num_samples(&self) -> usize {
        self.features.nrows()
    }

    /// Number of features (columns)
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// `(negatives, positives)`
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&y| y > 0.5).count();
        (self.labels.len() - positives, positives)
    }
}

/// Bundled preparer: extreme-tail gene selection followed by per-sample
/// quantile binning.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantileBinPreparer;

impl QuantileBinPreparer {
    /// Create the preparer
    pub fn new() -> Self {
        QuantileBinPreparer
    }

    /// Sample indices kept for the target and their binary labels.
    fn binarize(
        labels: &LabelVector,
        selector: TargetSelector,
        tail_fraction: f64,
    ) -> Result<(Vec<usize>, Vec<Label>)> {
        match (selector, labels) {
            (TargetSelector::Subtype(subtype), LabelVector::Subtypes(values)) => {
                let binary = values
                    .iter()
                    .map(|&label| if label == subtype { 1.0 } else { 0.0 })
                    .collect();
                Ok(((0..values.len()).collect(), binary))
            }
            (TargetSelector::UpperTail, LabelVector::Scores(scores)) => {
                if let Some(position) = scores.iter().position(|s| !s.is_finite()) {
                    return Err(crate::dataset_error!(format!(
                        "score at index {} is not finite",
                        position
                    )));
                }
                let mut sorted = scores.clone();
                sorted.sort_by(f64::total_cmp);
                let low = quantile_sorted(&sorted, tail_fraction);
                let high = quantile_sorted(&sorted, 1.0 - tail_fraction);

                let mut kept = Vec::new();
                let mut binary = Vec::new();
                for (index, &score) in scores.iter().enumerate() {
                    if score >= high {
                        kept.push(index);
                        binary.push(1.0);
                    } else if score <= low {
                        kept.push(index);
                        binary.push(0.0);
                    }
                }
                Ok((kept, binary))
            }
            _ => Err(DatasetError::SelectorMismatch {
                selector: selector.kind(),
                labels: labels.kind(),
            }
            .into()),
        }
    }

    /// Genes whose positive-minus-negative mean difference lies in the lower
    /// or upper `tail_fraction / 2` of the ranking, in matrix order.
    fn select_genes(
        values: ArrayView2<'_, f32>,
        binary: &[Label],
        tail_fraction: f64,
    ) -> Vec<usize> {
        let num_genes = values.nrows();
        let per_side = ((tail_fraction / 2.0 * num_genes as f64).floor() as usize).max(1);
        if tail_fraction >= 1.0 || 2 * per_side >= num_genes {
            return (0..num_genes).collect();
        }

        let mut ranked: Vec<(f64, usize)> = values
            .rows()
            .into_iter()
            .enumerate()
            .map(|(gene, row)| (mean_difference(row, binary), gene))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut selected: Vec<usize> = ranked[..per_side]
            .iter()
            .chain(&ranked[num_genes - per_side..])
            .map(|&(_, gene)| gene)
            .collect();
        selected.sort_unstable();
        selected
    }

    /// Bin each sample's values against that sample's own quantiles.
    ///
    /// Quantiles are taken over the sample's present values only. Missing
    /// (NaN) values stay NaN in the output; tree splits send them to the
    /// right child.
    fn bin_samples(values: ArrayView2<'_, f32>, breaks: &BreakPoints) -> Array2<f32> {
        // values: genes × samples; output: samples × genes
        let (num_genes, num_samples) = values.dim();
        let mut binned = Array2::<f32>::zeros((num_samples, num_genes));

        for (sample, column) in values.columns().into_iter().enumerate() {
            let mut sorted: Vec<f64> = column
                .iter()
                .filter(|v| !v.is_nan())
                .map(|&v| v as f64)
                .collect();
            sorted.sort_by(f64::total_cmp);
            let cuts = breaks.interior_quantiles(&sorted);

            for (gene, &value) in column.iter().enumerate() {
                binned[[sample, gene]] = if value.is_nan() {
                    f32::NAN
                } else {
                    bin_index(value as f64, &cuts) as f32
                };
            }
        }

        binned
    }
}

fn mean_difference(row: ArrayView1<'_, f32>, binary: &[Label]) -> f64 {
    let (mut pos_sum, mut pos_n, mut neg_sum, mut neg_n) = (0.0, 0usize, 0.0, 0usize);
    for (&value, &label) in row.iter().zip(binary) {
        if value.is_nan() {
            continue;
        }
        if label > 0.5 {
            pos_sum += value as f64;
            pos_n += 1;
        } else {
            neg_sum += value as f64;
            neg_n += 1;
        }
    }
    pos_sum / pos_n.max(1) as f64 - neg_sum / neg_n.max(1) as f64
}

impl DataPreparer for QuantileBinPreparer {
    fn prepare(
        &self,
        matrix: &ExpressionMatrix,
        labels: &LabelVector,
        selector: TargetSelector,
        tail_fraction: f64,
        breaks: &BreakPoints,
    ) -> Result<PreparedData> {
        if labels.len() != matrix.num_samples() {
            return Err(DatasetError::LabelCountMismatch {
                samples: matrix.num_samples(),
                labels: labels.len(),
            }
            .into());
        }
        crate::ensure!(
            tail_fraction > 0.0 && tail_fraction <= 1.0,
            crate::core::error::SubtypeError::invalid_parameter(
                "tail_fraction",
                tail_fraction.to_string(),
                "must be in range (0.0, 1.0]",
            )
        );
        breaks.validate()?;

        let (kept, binary) = Self::binarize(labels, selector, tail_fraction)?;
        let positives = binary.iter().filter(|&&y| y > 0.5).count();
        let negatives = binary.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(TrainingError::SingleClass {
                positives,
                negatives,
            }
            .into());
        }

        let trimmed = if kept.len() == matrix.num_samples() {
            matrix.clone()
        } else {
            matrix.select_samples(&kept)?
        };

        let genes = match selector {
            TargetSelector::Subtype(_) => {
                let selected = Self::select_genes(trimmed.values(), &binary, tail_fraction);
                trimmed.select_genes(&selected)?
            }
            TargetSelector::UpperTail => trimmed,
        };

        let features = Self::bin_samples(genes.values(), breaks);

        Ok(PreparedData {
            features,
            labels: Array1::from(binary),
            genes: genes.genes().to_vec(),
        })
    }
}
