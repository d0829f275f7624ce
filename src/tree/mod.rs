//! Decision tree classifiers.
//!
//! This module implements:
//! - CART (Classification and Regression Trees) using Gini impurity
//! - Random Forest ensemble classifier, the default estimator of an
//!   active learning run
//!
//! # Example
//!
//! ```
//! use aprender_active::prelude::*;
//!
//! // Training data (simple 2D binary classification)
//! let x = Matrix::from_vec(4, 2, vec![
//!     0.0, 0.0,  // class 0
//!     0.0, 1.0,  // class 0
//!     1.0, 0.0,  // class 1
//!     1.0, 1.0,  // class 1
//! ]).unwrap();
//! let y = vec![0, 0, 1, 1];
//!
//! let mut forest = RandomForestClassifier::new(10).with_random_state(42);
//! forest.fit(&x, &y).unwrap();
//!
//! let proba = forest.predict_proba(&x).unwrap();
//! assert_eq!(proba.shape(), (4, 2));
//! ```

mod helpers;

pub use helpers::{gini_impurity, gini_split};

use crate::error::{ActiveLearningError, Result};
use crate::primitives::Matrix;
use crate::selection::rng_from_state;
use crate::traits::Classifier;
use helpers::TreeBuilder;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Internal node in a decision tree.
///
/// Contains a split condition (feature and threshold) and pointers to
/// left and right subtrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Index of the feature to split on
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f32,
    /// Left subtree (samples where feature <= threshold)
    pub left: Box<TreeNode>,
    /// Right subtree (samples where feature > threshold)
    pub right: Box<TreeNode>,
}

/// Leaf node in a decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaf {
    /// Predicted class label for this leaf
    pub class_label: usize,
    /// Number of training samples in this leaf
    pub n_samples: usize,
    /// Training samples per class in this leaf
    pub class_counts: Vec<usize>,
}

/// A node in a decision tree (either internal node or leaf).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal decision node with split condition
    Node(Node),
    /// Leaf node with class prediction
    Leaf(Leaf),
}

impl TreeNode {
    /// Returns the depth of the tree rooted at this node.
    ///
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    /// Leaf reached by a sample.
    fn leaf_for(&self, sample: &[f32]) -> &Leaf {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf,
                TreeNode::Node(internal) => {
                    node = if sample[internal.feature_idx] <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }
}

fn validate_training_data(x: &Matrix<f32>, y: &[usize]) -> Result<()> {
    if x.n_rows() != y.len() {
        return Err(ActiveLearningError::dimension_mismatch(
            "labels",
            x.n_rows(),
            y.len(),
        ));
    }
    if y.is_empty() {
        return Err(ActiveLearningError::EmptyInput(
            "cannot fit with zero samples".to_string(),
        ));
    }
    Ok(())
}

fn n_classes_of(y: &[usize]) -> usize {
    y.iter().max().map_or(0, |&m| m + 1)
}

/// Argmax of each probability row; ties go to the lowest class.
fn argmax_rows(proba: &Matrix<f32>) -> Vec<usize> {
    proba
        .rows()
        .map(|row| {
            let mut best = 0;
            for (class, &p) in row.iter().enumerate() {
                if p > row[best] {
                    best = class;
                }
            }
            best
        })
        .collect()
}

/// Decision tree classifier using the CART algorithm.
///
/// Uses Gini impurity for splitting criterion and builds trees recursively.
/// Probability estimates are the class proportions of the leaf a sample
/// falls into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    tree: Option<TreeNode>,
    max_depth: Option<usize>,
    min_samples_split: usize,
    max_features: Option<usize>,
    random_state: Option<u64>,
    n_features: Option<usize>,
    n_classes: usize,
}

impl DecisionTreeClassifier {
    /// Creates a new decision tree classifier with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            random_state: None,
            n_features: None,
            n_classes: 0,
        }
    }

    /// Sets the maximum depth of the tree (root has depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the minimum number of samples required to split a node.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split.max(2);
        self
    }

    /// Considers only `max_features` randomly chosen features per split.
    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Sets the random state used for feature subsampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Fitted tree, if any.
    #[must_use]
    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    /// Number of class columns in `predict_proba` output.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn fit_with_classes(&mut self, x: &Matrix<f32>, y: &[usize], n_classes: usize) -> Result<()> {
        validate_training_data(x, y)?;

        let rng = self.max_features.map(|_| rng_from_state(self.random_state));
        let mut builder = TreeBuilder {
            x,
            y,
            n_classes,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self.max_features,
            rng,
        };
        let indices: Vec<usize> = (0..y.len()).collect();

        self.tree = Some(builder.build(&indices, 0));
        self.n_features = Some(x.n_cols());
        self.n_classes = n_classes;
        Ok(())
    }

    fn fitted_tree(&self, x: &Matrix<f32>) -> Result<&TreeNode> {
        let tree = self.tree.as_ref().ok_or(ActiveLearningError::NotFitted {
            what: "DecisionTreeClassifier",
        })?;
        if let Some(expected) = self.n_features {
            if x.n_cols() != expected {
                return Err(ActiveLearningError::dimension_mismatch(
                    "features",
                    expected,
                    x.n_cols(),
                ));
            }
        }
        Ok(tree)
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for DecisionTreeClassifier {
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        self.fit_with_classes(x, y, n_classes_of(y))
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        let tree = self.fitted_tree(x)?;
        Ok(x.rows().map(|row| tree.leaf_for(row).class_label).collect())
    }

    fn predict_proba(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let tree = self.fitted_tree(x)?;
        let mut proba = Matrix::zeros(x.n_rows(), self.n_classes);
        for (i, row) in x.rows().enumerate() {
            let leaf = tree.leaf_for(row);
            for (class, &count) in leaf.class_counts.iter().enumerate() {
                proba.set(i, class, count as f32 / leaf.n_samples as f32);
            }
        }
        Ok(proba)
    }

    fn supports_probabilities(&self) -> bool {
        true
    }
}

/// Random Forest classifier.
///
/// Combines multiple decision trees trained on bootstrap samples
/// with random feature selection to reduce overfitting and improve accuracy.
/// `predict_proba` returns the share of trees voting for each class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    n_estimators: usize,
    max_depth: Option<usize>,
    max_features: Option<usize>,
    random_state: Option<u64>,
    n_classes: usize,
}

impl RandomForestClassifier {
    /// Creates a new Random Forest classifier with `n_estimators` trees.
    ///
    /// Each split considers `sqrt(n_features)` features unless
    /// [`with_max_features`](Self::with_max_features) says otherwise.
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: None,
            random_state: None,
            n_classes: 0,
        }
    }

    /// Sets the maximum depth for each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the number of features considered per split.
    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Sets the random state for reproducibility.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Number of fitted trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn ensure_fitted(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ActiveLearningError::NotFitted {
                what: "RandomForestClassifier",
            });
        }
        Ok(())
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Creates a bootstrap sample (random sample with replacement).
///
/// Returns indices of samples to include in the bootstrap sample.
fn bootstrap_sample(n_samples: usize, rng: &mut StdRng) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    (0..n_samples).map(|_| dist.sample(rng)).collect()
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "n_estimators",
                0,
                "at least 1 tree",
            ));
        }
        validate_training_data(x, y)?;

        let n_samples = y.len();
        let n_classes = n_classes_of(y);
        let max_features = self
            .max_features
            .unwrap_or_else(|| ((x.n_cols() as f32).sqrt().round() as usize).max(1));
        let mut rng = rng_from_state(self.random_state);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let bootstrap_indices = bootstrap_sample(n_samples, &mut rng);
            let bootstrap_x = x.select_rows(&bootstrap_indices);
            let bootstrap_y: Vec<usize> = bootstrap_indices.iter().map(|&i| y[i]).collect();

            let mut tree = DecisionTreeClassifier::new()
                .with_max_features(max_features)
                .with_random_state(rng.gen());
            if let Some(max_depth) = self.max_depth {
                tree = tree.with_max_depth(max_depth);
            }
            tree.fit_with_classes(&bootstrap_x, &bootstrap_y, n_classes)?;
            trees.push(tree);
        }

        self.trees = trees;
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        Ok(argmax_rows(&self.predict_proba(x)?))
    }

    fn predict_proba(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        self.ensure_fitted()?;
        let n_samples = x.n_rows();
        let mut votes = Matrix::zeros(n_samples, self.n_classes);

        // One pass per tree over all samples
        for tree in &self.trees {
            for (i, class) in tree.predict(x)?.into_iter().enumerate() {
                votes.set(i, class, votes.get(i, class) + 1.0);
            }
        }

        let n_trees = self.trees.len() as f32;
        for v in votes.as_mut_slice() {
            *v /= n_trees;
        }
        Ok(votes)
    }

    fn supports_probabilities(&self) -> bool {
        true
    }
}
