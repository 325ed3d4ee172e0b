//! Ensembles of per-subtype model collections.
//!
//! Each ensemble member is trained on its own random subset of samples.
//! Subsets are drawn up front from one seeded generator, stratified by
//! subtype so every member sees every subtype, turned into [`MemberTask`]
//! descriptors and dispatched on a [`WorkerPool`]; members are returned in
//! task order.

use crate::config::EnsembleConfig;
use crate::core::error::{DatasetError, Result, TrainingError};
use crate::core::traits::{BoostingBackend, DataPreparer};
use crate::core::types::SubtypeLabel;
use crate::dataset::{distinct_subtypes, ExpressionMatrix};
use crate::training::pool::WorkerPool;
use crate::training::single::ModelTrainer;
use crate::training::subtype::{observed_subtypes, SubtypeModels};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Work description for one ensemble member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTask {
    /// Position of the member in the ensemble
    pub index: usize,
    /// Ascending sample (column) indices the member trains on
    pub sample_indices: Vec<usize>,
}

/// Ordered per-subtype model collections, one per member.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble<M> {
    members: Vec<SubtypeModels<M>>,
    member_samples: Vec<Vec<usize>>,
}

impl<M> Ensemble<M> {
    /// Per-subtype collections in member order
    pub fn members(&self) -> &[SubtypeModels<M>] {
        &self.members
    }

    /// Number of members
    pub fn num_members(&self) -> usize {
        self.members.len()
    }

    /// Whether the ensemble has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sample indices member `index` was trained on
    pub fn member_samples(&self, index: usize) -> Option<&[usize]> {
        self.member_samples.get(index).map(Vec::as_slice)
    }

    /// Iterate over the members in order
    pub fn iter(&self) -> std::slice::Iter<'_, SubtypeModels<M>> {
        self.members.iter()
    }
}

impl<'a, M> IntoIterator for &'a Ensemble<M> {
    type Item = &'a SubtypeModels<M>;
    type IntoIter = std::slice::Iter<'a, SubtypeModels<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Trains ensembles with a [`ModelTrainer`].
#[derive(Debug, Clone)]
pub struct EnsembleTrainer<B, P> {
    trainer: ModelTrainer<B, P>,
    config: EnsembleConfig,
}

impl<B: BoostingBackend, P: DataPreparer> EnsembleTrainer<B, P> {
    /// Create an ensemble trainer; validates `config`.
    pub fn new(trainer: ModelTrainer<B, P>, config: EnsembleConfig) -> Result<Self> {
        config.validate()?;
        Ok(EnsembleTrainer { trainer, config })
    }

    /// Ensemble settings
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Per-member trainer
    pub fn trainer(&self) -> &ModelTrainer<B, P> {
        &self.trainer
    }

    /// Draw one sample subset per member, sequentially from the seeded
    /// generator.
    ///
    /// Each subset holds `member_sample_size(labels.len())` samples with at
    /// least one sample of every subtype in `labels`; the remaining slots are
    /// shared out in proportion to each subtype's size.
    pub fn draw_tasks(&self, labels: &[SubtypeLabel]) -> Result<Vec<MemberTask>> {
        let total_samples = labels.len();
        let sample_size = self.config.member_sample_size(total_samples);
        let strata = subtype_strata(labels);
        let required = strata.len().max(1);
        if sample_size < required || sample_size > total_samples {
            return Err(TrainingError::InsufficientData {
                required,
                actual: sample_size,
            }
            .into());
        }

        let quotas = stratum_quotas(&strata, sample_size);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut tasks = Vec::with_capacity(self.config.num_members);
        for index in 0..self.config.num_members {
            let mut sample_indices = Vec::with_capacity(sample_size);
            for (stratum, &quota) in strata.iter().zip(&quotas) {
                let picked = rand::seq::index::sample(&mut rng, stratum.len(), quota);
                sample_indices.extend(picked.into_iter().map(|i| stratum[i]));
            }
            sample_indices.sort_unstable();
            tasks.push(MemberTask {
                index,
                sample_indices,
            });
        }
        Ok(tasks)
    }

    /// Train every member on its subset and collect the results in member
    /// order. One failing member fails the whole call.
    pub fn fit(
        &self,
        matrix: &ExpressionMatrix,
        labels: &[SubtypeLabel],
    ) -> Result<Ensemble<B::Model>> {
        if labels.len() != matrix.num_samples() {
            return Err(DatasetError::LabelCountMismatch {
                samples: matrix.num_samples(),
                labels: labels.len(),
            }
            .into());
        }

        let subtypes = observed_subtypes(labels);
        let tasks = self.draw_tasks(labels)?;
        let member_samples: Vec<Vec<usize>> =
            tasks.iter().map(|task| task.sample_indices.clone()).collect();

        log::info!(
            "Training {} ensemble members on {} of {} samples with {} workers",
            tasks.len(),
            self.config.member_sample_size(matrix.num_samples()),
            matrix.num_samples(),
            self.config.num_workers
        );

        let pool = WorkerPool::new(self.config.num_workers)?;
        let members = pool.run(tasks, |task| {
            log::info!("Ensemble member {}: starting", task.index + 1);
            let member_matrix = matrix.select_samples(&task.sample_indices)?;
            let member_labels: Vec<SubtypeLabel> =
                task.sample_indices.iter().map(|&i| labels[i]).collect();
            self.trainer
                .fit_subtypes_for(&member_matrix, &member_labels, &subtypes)
        })?;

        Ok(Ensemble {
            members,
            member_samples,
        })
    }
}

/// Sample positions of each subtype, subtypes in first-seen order.
fn subtype_strata(labels: &[SubtypeLabel]) -> Vec<Vec<usize>> {
    distinct_subtypes(labels)
        .into_iter()
        .map(|subtype| {
            labels
                .iter()
                .enumerate()
                .filter(|&(_, &label)| label == subtype)
                .map(|(position, _)| position)
                .collect()
        })
        .collect()
}

/// Per-stratum draw sizes summing to `sample_size`.
///
/// Every stratum gets one sample; the slots left over are split in
/// proportion to what each stratum has beyond that one, with leftover slots
/// going to the largest remainders (earlier strata win ties). Requires
/// `strata.len() <= sample_size <= total samples`.
fn stratum_quotas(strata: &[Vec<usize>], sample_size: usize) -> Vec<usize> {
    let spare_total: usize = strata.iter().map(|stratum| stratum.len() - 1).sum();
    let extra = sample_size - strata.len();
    if spare_total == 0 {
        return vec![1; strata.len()];
    }

    let mut quotas = Vec::with_capacity(strata.len());
    let mut remainders = Vec::with_capacity(strata.len());
    for (position, stratum) in strata.iter().enumerate() {
        let share = extra * (stratum.len() - 1);
        quotas.push(1 + share / spare_total);
        remainders.push((share % spare_total, position));
    }

    let assigned: usize = quotas.iter().sum();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, position) in remainders.iter().take(sample_size - assigned) {
        quotas[position] += 1;
    }
    quotas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boosting::GradientBooster;
    use crate::config::{BoostParams, PrepConfig};
    use crate::dataset::QuantileBinPreparer;

    fn ensemble_trainer(
        num_members: usize,
        sample_fraction: f64,
        seed: u64,
    ) -> EnsembleTrainer<GradientBooster, QuantileBinPreparer> {
        let trainer = ModelTrainer::new(BoostParams::default(), PrepConfig::default()).unwrap();
        EnsembleTrainer::new(
            trainer,
            EnsembleConfig {
                num_members,
                sample_fraction,
                num_workers: 2,
                seed,
            },
        )
        .unwrap()
    }

    fn cycling_labels(n: usize) -> Vec<SubtypeLabel> {
        (0..n).map(|i| (i % 6 + 1) as SubtypeLabel).collect()
    }

    fn skewed_labels() -> Vec<SubtypeLabel> {
        let mut labels = vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5];
        labels.extend(std::iter::repeat(6).take(30));
        labels
    }

    #[test]
    fn test_draw_tasks_sizes_and_order() {
        let tasks = ensemble_trainer(3, 0.7, 42)
            .draw_tasks(&cycling_labels(40))
            .unwrap();

        assert_eq!(tasks.len(), 3);
        for (i, task) in tasks.iter().enumerate() {
            assert_eq!(task.index, i);
            assert_eq!(task.sample_indices.len(), 28);
            assert!(task.sample_indices.windows(2).all(|w| w[0] < w[1]));
            assert!(task.sample_indices.iter().all(|&s| s < 40));
        }
    }

    #[test]
    fn test_draw_tasks_reproducible_for_seed() {
        let labels = cycling_labels(30);
        let first = ensemble_trainer(2, 0.5, 9).draw_tasks(&labels).unwrap();
        let second = ensemble_trainer(2, 0.5, 9).draw_tasks(&labels).unwrap();
        let other = ensemble_trainer(2, 0.5, 10).draw_tasks(&labels).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_draw_tasks_rejects_empty_subset() {
        assert!(ensemble_trainer(1, 0.1, 1).draw_tasks(&cycling_labels(5)).is_err());
    }

    #[test]
    fn test_draw_tasks_rejects_fewer_slots_than_subtypes() {
        // 12 samples at 0.4 leave 4 slots for 6 subtypes
        let err = ensemble_trainer(1, 0.4, 1)
            .draw_tasks(&cycling_labels(12))
            .unwrap_err();
        assert_eq!(err.category(), "training");
    }

    #[test]
    fn test_every_member_sees_every_subtype() {
        let labels = skewed_labels();
        for seed in 0..50 {
            for task in ensemble_trainer(3, 0.7, seed).draw_tasks(&labels).unwrap() {
                assert_eq!(task.sample_indices.len(), 28);
                let member: Vec<SubtypeLabel> =
                    task.sample_indices.iter().map(|&i| labels[i]).collect();
                let mut seen = distinct_subtypes(&member);
                seen.sort_unstable();
                assert_eq!(seen, vec![1, 2, 3, 4, 5, 6], "seed {}", seed);
            }
        }
    }

    #[test]
    fn test_stratum_quotas_proportional() {
        let balanced = subtype_strata(&cycling_labels(40));
        assert_eq!(stratum_quotas(&balanced, 28), vec![5, 5, 5, 5, 4, 4]);

        let skewed = subtype_strata(&skewed_labels());
        assert_eq!(stratum_quotas(&skewed, 28), vec![2, 2, 2, 1, 1, 20]);

        let singletons = subtype_strata(&[3, 1, 2]);
        assert_eq!(stratum_quotas(&singletons, 3), vec![1, 1, 1]);
    }

    #[test]
    fn test_full_fraction_keeps_every_sample() {
        let tasks = ensemble_trainer(2, 1.0, 3)
            .draw_tasks(&cycling_labels(6))
            .unwrap();
        for task in tasks {
            assert_eq!(task.sample_indices, vec![0, 1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let trainer = ModelTrainer::new(BoostParams::default(), PrepConfig::default()).unwrap();
        let config = EnsembleConfig {
            num_workers: 0,
            ..EnsembleConfig::default()
        };
        assert!(EnsembleTrainer::new(trainer, config).is_err());
    }
}
