//! Regression trees fitted to gradient statistics.
//!
//! Trees grow depth-wise with exact greedy splits: for every node, every
//! feature is scanned in sorted order and the boundary between two distinct
//! consecutive values with the highest gain wins.
//!
//! ```text
//! gain = ½ [G_L²/(H_L + λ) + G_R²/(H_R + λ) − G²/(H + λ)]
//! leaf = −η · G/(H + λ)
//! ```

use crate::config::BoostParams;
use crate::core::types::{FeatureIndex, NodeIndex, Score};
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

/// One node of a fitted tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Samples with `feature <= threshold` go left, all others go right
    Split {
        feature: FeatureIndex,
        threshold: f32,
        left: NodeIndex,
        right: NodeIndex,
        gain: f64,
    },
    /// Terminal node contributing `value` to the margin
    Leaf { value: Score },
}

/// A fitted regression tree stored as a flat node vector; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    /// Tree consisting of a single leaf
    pub fn leaf(value: Score) -> Self {
        Tree {
            nodes: vec![TreeNode::Leaf { value }],
        }
    }

    /// All nodes, root first
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Number of leaves
    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf, `0` for a single leaf
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[TreeNode], index: NodeIndex) -> usize {
            match &nodes[index] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
            }
        }
        depth_of(&self.nodes, 0)
    }

    /// Margin contribution for one sample row.
    pub fn predict_row(&self, row: ArrayView1<'_, f32>) -> Score {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Regularization and shape constraints for tree growth.
#[derive(Debug, Clone, PartialEq)]
pub struct GainParams {
    /// L2 regularization on leaf values
    pub lambda: f64,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
    /// A split must gain strictly more than this
    pub min_split_gain: f64,
    /// Shrinkage applied to leaf values
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
}

impl GainParams {
    /// Tree parameters carried by a hyperparameter record
    pub fn from_params(params: &BoostParams) -> Self {
        GainParams {
            lambda: params.lambda,
            min_child_weight: params.min_child_weight,
            min_split_gain: params.min_split_gain,
            learning_rate: params.learning_rate,
            max_depth: params.max_depth,
        }
    }

    #[inline]
    fn score(&self, gradient: f64, hessian: f64) -> f64 {
        let denominator = hessian + self.lambda;
        if denominator > 0.0 {
            gradient * gradient / denominator
        } else {
            0.0
        }
    }

    /// Split gain from child and parent sums
    #[inline]
    pub fn compute_gain(
        &self,
        grad_left: f64,
        hess_left: f64,
        grad_right: f64,
        hess_right: f64,
    ) -> f64 {
        0.5 * (self.score(grad_left, hess_left) + self.score(grad_right, hess_right)
            - self.score(grad_left + grad_right, hess_left + hess_right))
    }

    /// Shrunken leaf value
    #[inline]
    pub fn leaf_value(&self, gradient: f64, hessian: f64) -> Score {
        let denominator = hessian + self.lambda;
        if denominator > 0.0 {
            -self.learning_rate * gradient / denominator
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: FeatureIndex,
    threshold: f32,
    gain: f64,
}

/// Grows one tree over a samples × features matrix.
#[derive(Debug)]
pub struct TreeGrower<'a, 'p> {
    features: ArrayView2<'a, f32>,
    params: &'p GainParams,
}

impl<'a, 'p> TreeGrower<'a, 'p> {
    /// Create a grower over `features`
    pub fn new(features: ArrayView2<'a, f32>, params: &'p GainParams) -> Self {
        TreeGrower { features, params }
    }

    /// Fit a tree to the gradient statistics of `rows`.
    pub fn grow(&self, gradients: &[f64], hessians: &[f64], rows: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(gradients, hessians, rows.to_vec(), 0, &mut nodes);
        Tree { nodes }
    }

    fn build_node(
        &self,
        gradients: &[f64],
        hessians: &[f64],
        rows: Vec<usize>,
        depth: usize,
        nodes: &mut Vec<TreeNode>,
    ) -> NodeIndex {
        let (sum_grad, sum_hess) = rows.iter().fold((0.0, 0.0), |(g, h), &i| {
            (g + gradients[i], h + hessians[i])
        });
        let index = nodes.len();
        nodes.push(TreeNode::Leaf {
            value: self.params.leaf_value(sum_grad, sum_hess),
        });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return index;
        }
        let Some(split) = self.find_best_split(gradients, hessians, &rows) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&i| self.features[[i, split.feature]] <= split.threshold);

        let left = self.build_node(gradients, hessians, left_rows, depth + 1, nodes);
        let right = self.build_node(gradients, hessians, right_rows, depth + 1, nodes);
        nodes[index] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            gain: split.gain,
        };
        index
    }

    /// Best split over all features; ties go to the lowest feature index.
    fn find_best_split(
        &self,
        gradients: &[f64],
        hessians: &[f64],
        rows: &[usize],
    ) -> Option<SplitCandidate> {
        let per_feature: Vec<Option<SplitCandidate>> = (0..self.features.ncols())
            .into_par_iter()
            .map(|feature| self.best_split_for_feature(feature, gradients, hessians, rows))
            .collect();

        let mut best: Option<SplitCandidate> = None;
        for candidate in per_feature.into_iter().flatten() {
            if best.map_or(true, |current| candidate.gain > current.gain) {
                best = Some(candidate);
            }
        }
        best
    }

    fn best_split_for_feature(
        &self,
        feature: FeatureIndex,
        gradients: &[f64],
        hessians: &[f64],
        rows: &[usize],
    ) -> Option<SplitCandidate> {
        let column = self.features.column(feature);
        let mut sorted = rows.to_vec();
        sorted.sort_by(|&a, &b| column[a].total_cmp(&column[b]).then(a.cmp(&b)));

        let (total_grad, total_hess) = sorted.iter().fold((0.0, 0.0), |(g, h), &i| {
            (g + gradients[i], h + hessians[i])
        });

        let mut best: Option<SplitCandidate> = None;
        let mut grad_left = 0.0;
        let mut hess_left = 0.0;
        for pair in sorted.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            grad_left += gradients[current];
            hess_left += hessians[current];

            let (value, next_value) = (column[current], column[next]);
            if value.is_nan() || next_value.is_nan() || value == next_value {
                continue;
            }

            let grad_right = total_grad - grad_left;
            let hess_right = total_hess - hess_left;
            if hess_left < self.params.min_child_weight
                || hess_right < self.params.min_child_weight
            {
                continue;
            }

            let gain = self
                .params
                .compute_gain(grad_left, hess_left, grad_right, hess_right);
            if gain <= self.params.min_split_gain {
                continue;
            }
            if best.map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: midpoint(value, next_value),
                    gain,
                });
            }
        }

        best
    }
}

/// Midpoint of two ascending values that still separates them.
fn midpoint(low: f32, high: f32) -> f32 {
    let mid = ((low as f64 + high as f64) / 2.0) as f32;
    if mid < high {
        mid
    } else {
        low
    }
}
