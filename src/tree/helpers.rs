//! Helper functions for tree building.
//!
//! Trees are grown over index subsets of the training matrix, so no
//! feature data is copied while splitting.

use super::{Leaf, Node, TreeNode};
use crate::primitives::Matrix;
use rand::rngs::StdRng;

/// Gini impurity of a label set.
///
/// Formula: Gini = 1 - `Σ(p_i²)` where `p_i` is the proportion of class i
#[must_use]
pub fn gini_impurity(labels: &[usize]) -> f32 {
    if labels.is_empty() {
        return 0.0;
    }
    let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        counts[label] += 1;
    }
    gini_from_counts(&counts, labels.len())
}

/// Weighted Gini impurity of a binary split.
#[must_use]
pub fn gini_split(left_labels: &[usize], right_labels: &[usize]) -> f32 {
    let n_left = left_labels.len() as f32;
    let n_right = right_labels.len() as f32;
    let n_total = n_left + n_right;

    if n_total == 0.0 {
        return 0.0;
    }

    (n_left / n_total) * gini_impurity(left_labels)
        + (n_right / n_total) * gini_impurity(right_labels)
}

pub(super) fn gini_from_counts(counts: &[usize], total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f32;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f32 / n;
            p * p
        })
        .sum::<f32>()
}

/// Majority class of a count vector; ties go to the lowest class.
pub(super) fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

/// Best threshold for one feature as `(threshold, gain)`.
///
/// Candidates are midpoints between consecutive distinct values. The scan
/// keeps running class counts on both sides, so a feature costs one sort.
pub(super) fn find_best_split_for_feature(
    x: &Matrix<f32>,
    y: &[usize],
    indices: &[usize],
    feature_idx: usize,
    parent_counts: &[usize],
) -> Option<(f32, f32)> {
    let n = indices.len();
    if n < 2 {
        return None;
    }

    let mut pairs: Vec<(f32, usize)> = indices
        .iter()
        .map(|&i| (x.get(i, feature_idx), y[i]))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let parent_impurity = gini_from_counts(parent_counts, n);
    let mut left = vec![0usize; parent_counts.len()];
    let mut right = parent_counts.to_vec();
    let mut best: Option<(f32, f32)> = None;

    for k in 0..n - 1 {
        let (value, label) = pairs[k];
        left[label] += 1;
        right[label] -= 1;

        let next = pairs[k + 1].0;
        if next <= value {
            continue;
        }

        let n_left = k + 1;
        let n_right = n - n_left;
        let weighted = (n_left as f32 * gini_from_counts(&left, n_left)
            + n_right as f32 * gini_from_counts(&right, n_right))
            / n as f32;
        let gain = parent_impurity - weighted;

        if gain > best.map_or(0.0, |(_, g)| g) {
            best = Some(((value + next) / 2.0, gain));
        }
    }

    best
}

/// Parameters shared by every node of one tree.
pub(super) struct TreeBuilder<'a> {
    pub x: &'a Matrix<f32>,
    pub y: &'a [usize],
    pub n_classes: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: Option<usize>,
    pub rng: Option<StdRng>,
}

impl TreeBuilder<'_> {
    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }

    /// Features considered at one node, ascending.
    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.n_cols();
        match (self.max_features, self.rng.as_mut()) {
            (Some(k), Some(rng)) if k < n_features => {
                let mut features = rand::seq::index::sample(rng, n_features, k).into_vec();
                features.sort_unstable();
                features
            }
            _ => (0..n_features).collect(),
        }
    }

    fn leaf(counts: Vec<usize>, n_samples: usize) -> TreeNode {
        TreeNode::Leaf(Leaf {
            class_label: majority_class(&counts),
            n_samples,
            class_counts: counts,
        })
    }

    /// Grows the subtree for `indices`.
    pub fn build(&mut self, indices: &[usize], depth: usize) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(indices);

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let at_max_depth = self.max_depth.is_some_and(|d| depth >= d);
        if pure || at_max_depth || n_samples < self.min_samples_split {
            return Self::leaf(counts, n_samples);
        }

        let mut best: Option<(usize, f32, f32)> = None;
        for feature_idx in self.candidate_features() {
            if let Some((threshold, gain)) =
                find_best_split_for_feature(self.x, self.y, indices, feature_idx, &counts)
            {
                if gain > best.map_or(0.0, |(_, _, g)| g) {
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        let Some((feature_idx, threshold, _gain)) = best else {
            return Self::leaf(counts, n_samples);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x.get(i, feature_idx) <= threshold);
        if left_indices.is_empty() || right_indices.is_empty() {
            return Self::leaf(counts, n_samples);
        }

        let left = self.build(&left_indices, depth + 1);
        let right = self.build(&right_indices, depth + 1);

        TreeNode::Node(Node {
            feature_idx,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}
