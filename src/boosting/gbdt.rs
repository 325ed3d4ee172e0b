//! Gradient boosted decision trees with a binary logistic objective.

use crate::boosting::cross_validation::{self, CrossValidationConfig, CrossValidationResult};
use crate::boosting::objective::BinaryLogistic;
use crate::boosting::tree::{GainParams, Tree, TreeGrower};
use crate::config::BoostParams;
use crate::core::constants::CLASSIFICATION_THRESHOLD;
use crate::core::error::{DatasetError, Result, SubtypeError};
use crate::core::traits::BoostingBackend;
use crate::core::types::{Label, Score};
use crate::metrics_eval::binary_error;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// A fitted boosted classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedModel {
    trees: Vec<Tree>,
    base_margin: Score,
    training_errors: Vec<f64>,
}

impl BoostedModel {
    fn new(base_margin: Score) -> Self {
        BoostedModel {
            trees: Vec::new(),
            base_margin,
            training_errors: Vec::new(),
        }
    }

    /// Number of boosting rounds performed
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Fitted trees in boosting order
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Training error recorded after each round
    pub fn training_errors(&self) -> &[f64] {
        &self.training_errors
    }

    /// Training error after the last round
    pub fn final_training_error(&self) -> Option<f64> {
        self.training_errors.last().copied()
    }

    /// Raw margins, one per sample row.
    pub fn predict_margin(&self, features: ArrayView2<'_, f32>) -> Array1<Score> {
        features
            .rows()
            .into_iter()
            .map(|row| {
                self.trees
                    .iter()
                    .fold(self.base_margin, |margin, tree| margin + tree.predict_row(row))
            })
            .collect()
    }

    /// Positive-class probabilities, one per sample row.
    pub fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Array1<Score> {
        self.predict_margin(features).mapv_into(BinaryLogistic::sigmoid)
    }

    /// Predicted `0.0`/`1.0` classes, one per sample row.
    pub fn predict_class(&self, features: ArrayView2<'_, f32>) -> Array1<Label> {
        self.predict_proba(features)
            .iter()
            .map(|&p| if p > CLASSIFICATION_THRESHOLD { 1.0 } else { 0.0 })
            .collect()
    }
}

/// Round-by-round boosting over one training set.
#[derive(Debug)]
pub(crate) struct BoosterState<'f, 'l> {
    features: ArrayView2<'f, f32>,
    labels: ArrayView1<'l, Label>,
    gain: GainParams,
    rows: Vec<usize>,
    margins: Vec<Score>,
    gradients: Vec<f64>,
    hessians: Vec<f64>,
    model: BoostedModel,
}

impl<'f, 'l> BoosterState<'f, 'l> {
    pub(crate) fn new(
        features: ArrayView2<'f, f32>,
        labels: ArrayView1<'l, Label>,
        params: &BoostParams,
    ) -> Self {
        let n = labels.len();
        let base_margin = BinaryLogistic.base_margin();
        BoosterState {
            features,
            labels,
            gain: GainParams::from_params(params),
            rows: (0..n).collect(),
            margins: vec![base_margin; n],
            gradients: vec![0.0; n],
            hessians: vec![0.0; n],
            model: BoostedModel::new(base_margin),
        }
    }

    /// Fit one more tree and return it.
    pub(crate) fn boost_round(&mut self) -> &Tree {
        BinaryLogistic.compute_gradients(
            &self.margins,
            self.labels,
            &mut self.gradients,
            &mut self.hessians,
        );

        let grower = TreeGrower::new(self.features, &self.gain);
        let tree = grower.grow(&self.gradients, &self.hessians, &self.rows);
        for (margin, row) in self.margins.iter_mut().zip(self.features.rows()) {
            *margin += tree.predict_row(row);
        }

        let error = binary_error(self.probabilities().view(), self.labels);
        self.model.training_errors.push(error);
        self.model.trees.push(tree);
        &self.model.trees[self.model.trees.len() - 1]
    }

    /// Current training-set probabilities
    pub(crate) fn probabilities(&self) -> Array1<Score> {
        self.margins
            .iter()
            .map(|&m| BinaryLogistic::sigmoid(m))
            .collect()
    }

    pub(crate) fn labels(&self) -> ArrayView1<'l, Label> {
        self.labels
    }

    pub(crate) fn into_model(self) -> BoostedModel {
        self.model
    }
}

/// Run `job` inside a dedicated rayon pool of `num_threads` threads.
pub(crate) fn run_in_pool<T, F>(num_threads: usize, job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send,
    T: Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| SubtypeError::threading(format!("Failed to create thread pool: {}", e)))?;
    pool.install(job)
}

/// Check shapes and labels shared by `fit` and `cross_validate`.
pub(crate) fn check_inputs(
    features: ArrayView2<'_, f32>,
    labels: ArrayView1<'_, Label>,
) -> Result<()> {
    if features.nrows() == 0 || features.ncols() == 0 {
        return Err(DatasetError::Empty.into());
    }
    if features.nrows() != labels.len() {
        return Err(SubtypeError::dimension_mismatch(
            format!("{} rows", features.nrows()),
            format!("{} labels", labels.len()),
        ));
    }
    BinaryLogistic.check_labels(labels)
}

/// Bundled boosting backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientBooster;

impl GradientBooster {
    /// Create the backend
    pub fn new() -> Self {
        GradientBooster
    }
}

impl BoostingBackend for GradientBooster {
    type Model = BoostedModel;

    fn fit(
        &self,
        features: ArrayView2<'_, f32>,
        labels: ArrayView1<'_, Label>,
        params: &BoostParams,
    ) -> Result<BoostedModel> {
        params.validate()?;
        check_inputs(features, labels)?;

        run_in_pool(params.num_threads, || {
            let mut state = BoosterState::new(features, labels, params);
            for round in 1..=params.num_rounds {
                state.boost_round();
                if let Some(error) = state.model.final_training_error() {
                    log::debug!("[{}] train-error:{:.6}", round, error);
                }
            }
            Ok(state.into_model())
        })
    }

    fn cross_validate(
        &self,
        features: ArrayView2<'_, f32>,
        labels: ArrayView1<'_, Label>,
        params: &BoostParams,
        cv: &CrossValidationConfig,
    ) -> Result<CrossValidationResult> {
        params.validate()?;
        check_inputs(features, labels)?;

        run_in_pool(params.num_threads, || {
            cross_validation::run(features, labels, params, cv)
        })
    }

    fn name(&self) -> &'static str {
        "gbtree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn small_params(num_rounds: usize) -> BoostParams {
        BoostParams {
            num_rounds,
            num_threads: 2,
            min_child_weight: 0.0,
            ..BoostParams::default()
        }
    }

    fn separable() -> (Array2<f32>, Array1<Label>) {
        let features = array![
            [1.0f32, 3.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [2.0, 3.0],
            [3.0, 1.0],
            [4.0, 2.0],
            [3.0, 3.0],
            [4.0, 1.0]
        ];
        let labels = array![0.0f32, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (features, labels)
    }

    #[test]
    fn test_fit_separable_data() {
        let (features, labels) = separable();
        let model = GradientBooster
            .fit(features.view(), labels.view(), &small_params(5))
            .unwrap();

        assert_eq!(model.num_trees(), 5);
        assert_eq!(model.training_errors().len(), 5);
        assert_eq!(model.final_training_error(), Some(0.0));
        assert_eq!(model.predict_class(features.view()), labels);
    }

    #[test]
    fn test_probabilities_in_unit_interval() {
        let (features, labels) = separable();
        let model = GradientBooster
            .fit(features.view(), labels.view(), &small_params(3))
            .unwrap();
        let probabilities = model.predict_proba(features.view());
        assert!(probabilities.iter().all(|&p| p > 0.0 && p < 1.0));
        assert!(probabilities[7] > probabilities[0]);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (features, labels) = separable();
        let params = small_params(4);
        let first = GradientBooster
            .fit(features.view(), labels.view(), &params)
            .unwrap();
        let second = GradientBooster
            .fit(features.view(), labels.view(), &params)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_bad_labels_and_shapes() {
        let (features, _) = separable();
        let bad_labels = Array1::from_elem(8, 2.0f32);
        assert!(GradientBooster
            .fit(features.view(), bad_labels.view(), &small_params(1))
            .is_err());

        let short_labels = array![0.0f32, 1.0];
        let err = GradientBooster
            .fit(features.view(), short_labels.view(), &small_params(1))
            .unwrap_err();
        assert_eq!(err.category(), "dimension_mismatch");
        assert!(err.to_string().contains("expected 8 rows, got 2 labels"));
    }

    #[test]
    fn test_booster_state_over_independently_owned_views() {
        let (_, labels) = separable();
        let params = small_params(2);
        let model = {
            let (features, _) = separable();
            let mut state = BoosterState::new(features.view(), labels.view(), &params);
            state.boost_round();
            state.boost_round();
            state.into_model()
        };
        assert_eq!(model.num_trees(), 2);
        assert_eq!(model.training_errors().len(), 2);
    }

    #[test]
    fn test_untrained_model_predicts_base_score() {
        let model = BoostedModel::new(BinaryLogistic.base_margin());
        let features = array![[1.0f32], [2.0]];
        assert_eq!(model.predict_proba(features.view()).to_vec(), vec![0.5, 0.5]);
        assert_eq!(model.predict_class(features.view()).to_vec(), vec![0.0, 0.0]);
    }
}
