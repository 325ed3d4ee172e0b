//! One cross-validated classifier per immune subtype.

use crate::core::constants::IMMUNE_SUBTYPE_COUNT;
use crate::core::error::{DatasetError, Result};
use crate::core::traits::{BoostingBackend, DataPreparer};
use crate::core::types::SubtypeLabel;
use crate::dataset::{distinct_subtypes, ExpressionMatrix, LabelVector, TargetSelector};
use crate::training::single::{ModelTrainer, TrainedModel};

/// Trained models keyed by subtype label, in label order of first
/// appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtypeModels<M> {
    entries: Vec<(SubtypeLabel, TrainedModel<M>)>,
}

impl<M> SubtypeModels<M> {
    /// Model trained for `subtype`
    pub fn get(&self, subtype: SubtypeLabel) -> Option<&TrainedModel<M>> {
        self.entries
            .iter()
            .find(|(label, _)| *label == subtype)
            .map(|(_, model)| model)
    }

    /// Subtype labels in order
    pub fn labels(&self) -> Vec<SubtypeLabel> {
        self.entries.iter().map(|(label, _)| *label).collect()
    }

    /// Number of subtypes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no subtype was trained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(subtype, model)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (SubtypeLabel, &TrainedModel<M>)> {
        self.entries.iter().map(|(label, model)| (*label, model))
    }
}

/// Distinct subtypes in first-encountered order, warning when the count
/// differs from [`IMMUNE_SUBTYPE_COUNT`].
pub fn observed_subtypes(labels: &[SubtypeLabel]) -> Vec<SubtypeLabel> {
    let subtypes = distinct_subtypes(labels);
    if subtypes.len() != IMMUNE_SUBTYPE_COUNT {
        log::warn!(
            "Found {} distinct subtypes, expected {}; training one model per observed subtype",
            subtypes.len(),
            IMMUNE_SUBTYPE_COUNT
        );
    }
    subtypes
}

impl<B: BoostingBackend, P: DataPreparer> ModelTrainer<B, P> {
    /// Train one cross-validated model per distinct subtype in `labels`.
    ///
    /// `labels` holds one subtype per matrix sample.
    pub fn fit_subtypes(
        &self,
        matrix: &ExpressionMatrix,
        labels: &[SubtypeLabel],
    ) -> Result<SubtypeModels<B::Model>> {
        let subtypes = observed_subtypes(labels);
        self.fit_subtypes_for(matrix, labels, &subtypes)
    }

    /// Train one cross-validated model per entry of `subtypes`, in that
    /// order. Any failure aborts the whole collection.
    pub fn fit_subtypes_for(
        &self,
        matrix: &ExpressionMatrix,
        labels: &[SubtypeLabel],
        subtypes: &[SubtypeLabel],
    ) -> Result<SubtypeModels<B::Model>> {
        if labels.len() != matrix.num_samples() {
            return Err(DatasetError::LabelCountMismatch {
                samples: matrix.num_samples(),
                labels: labels.len(),
            }
            .into());
        }

        let label_vector = LabelVector::Subtypes(labels.to_vec());
        let mut entries = Vec::with_capacity(subtypes.len());
        for &subtype in subtypes {
            log::info!("Subtype {}: processing data...", subtype);
            let prepared = self.preparer.prepare(
                matrix,
                &label_vector,
                TargetSelector::Subtype(subtype),
                self.prep.tail_fraction,
                &self.prep.breaks,
            )?;
            log::info!(
                "   training on {} samples and {} features",
                prepared.num_samples(),
                prepared.num_features()
            );

            let trained = self.cv_fit_one(
                prepared.features.view(),
                prepared.labels.view(),
                &self.prep.breaks,
                &prepared.genes,
            )?;
            entries.push((subtype, trained));
        }

        Ok(SubtypeModels { entries })
    }
}
