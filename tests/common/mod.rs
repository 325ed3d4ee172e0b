//! Common test utilities for immune subtype integration tests.

#![allow(dead_code)]

use immune_subtype_classifier::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use std::fs;
use std::path::Path;

/// Number of genes in the synthetic cohort
pub const NUM_GENES: usize = 100;

/// Number of samples in the synthetic cohort
pub const NUM_SAMPLES: usize = 40;

/// Genes carrying the signal of each subtype
pub const SIGNATURE_GENES: usize = 5;

/// Subtype labels for the synthetic cohort: classes of 7, 7, 7, 7, 6 and 6
/// samples, interleaved so that subtype 1 appears first.
pub fn create_subtype_labels() -> Vec<SubtypeLabel> {
    (0..NUM_SAMPLES)
        .map(|i| (i % 6) as SubtypeLabel + 1)
        .collect()
}

/// Genes × samples expression matrix with Gaussian-like noise and a block of
/// [`SIGNATURE_GENES`] raised genes per subtype.
pub fn create_expression_values(labels: &[SubtypeLabel]) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut values = Array2::zeros((NUM_GENES, labels.len()));

    for gene in 0..NUM_GENES {
        for (sample, &label) in labels.iter().enumerate() {
            let noise: f32 = (0..4).map(|_| rng.gen_range(-1.0f32..1.0)).sum();
            let signature = (label as usize - 1) * SIGNATURE_GENES;
            let signal = if (signature..signature + SIGNATURE_GENES).contains(&gene) {
                4.0
            } else {
                0.0
            };
            values[[gene, sample]] = 5.0 + noise + signal;
        }
    }

    values
}

/// The synthetic 100 × 40 cohort with named genes and samples.
pub fn create_cohort() -> (ExpressionMatrix, Vec<SubtypeLabel>) {
    let labels = create_subtype_labels();
    let values = create_expression_values(&labels);
    let genes = (0..NUM_GENES).map(|g| format!("GENE{:03}", g)).collect();
    let samples = (0..NUM_SAMPLES).map(|s| format!("TCGA-{:02}", s)).collect();
    let matrix = ExpressionMatrix::new(values, genes, samples).expect("valid cohort");
    (matrix, labels)
}

/// Small, fast hyperparameters for integration tests.
pub fn create_test_params() -> BoostParams {
    BoostParamsBuilder::new()
        .num_rounds(20)
        .num_threads(2)
        .num_folds(5)
        .build()
        .expect("valid parameters")
}

/// Binary dataset: samples × features with a threshold on the first feature.
pub fn create_binary_data(num_samples: usize, num_features: usize) -> (Array2<f32>, Array1<Label>) {
    let mut rng = StdRng::seed_from_u64(123);
    let mut features = Array2::zeros((num_samples, num_features));
    for i in 0..num_samples {
        for j in 0..num_features {
            features[[i, j]] = rng.gen_range(-3.0..3.0);
        }
    }
    let labels = features
        .column(0)
        .iter()
        .map(|&v| if v > 0.0 { 1.0 } else { 0.0 })
        .collect();
    (features, labels)
}

/// Write the cohort as an expression CSV and a subtype label CSV.
pub fn write_cohort_csv(dir: &Path, matrix: &ExpressionMatrix, labels: &[SubtypeLabel]) {
    let mut expression = String::from("gene");
    for sample in matrix.samples() {
        expression.push(',');
        expression.push_str(sample);
    }
    expression.push('\n');
    for (g, gene) in matrix.genes().iter().enumerate() {
        expression.push_str(gene);
        for value in matrix.gene_values(g) {
            expression.push_str(&format!(",{}", value));
        }
        expression.push('\n');
    }
    fs::write(dir.join("expression.csv"), expression).expect("write expression csv");

    // Label rows deliberately out of sample order
    let mut rows = String::from("sample,subtype\n");
    for (sample, label) in matrix.samples().iter().zip(labels).rev() {
        rows.push_str(&format!("{},{}\n", sample, label));
    }
    fs::write(dir.join("subtypes.csv"), rows).expect("write label csv");
}
