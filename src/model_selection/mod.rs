//! Train/test splitting utilities.
//!
//! Active learning runs hold out a stratified evaluation set before the
//! simulation starts; everything else becomes the unlabeled pool.

use crate::error::{ActiveLearningError, Result};
use crate::primitives::Matrix;
use crate::selection::rng_from_state;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// Result of a train/test split.
///
/// Index vectors refer to rows of the original data and are sorted
/// ascending, so row `i` of `x_train` is original row `train_indices[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    /// Training features.
    pub x_train: Matrix<f32>,
    /// Test features.
    pub x_test: Matrix<f32>,
    /// Training labels.
    pub y_train: Vec<usize>,
    /// Test labels.
    pub y_test: Vec<usize>,
    /// Original row of every training sample.
    pub train_indices: Vec<usize>,
    /// Original row of every test sample.
    pub test_indices: Vec<usize>,
}

/// Groups sample indices by class label, classes in ascending order.
fn class_indices(y: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        groups.entry(label).or_default().push(i);
    }
    groups
}

/// Number of test members for a class of `count` samples.
fn class_test_size(count: usize, test_size: f32) -> usize {
    let n_test = (count as f32 * test_size).round() as usize;
    n_test.clamp(1, count - 1)
}

/// Splits data into train and test sets, preserving class proportions.
///
/// Every class contributes `round(test_size * count)` samples to the test
/// set, clamped so that each side keeps at least one member.
///
/// # Errors
///
/// - [`ActiveLearningError::InvalidHyperparameter`] if `test_size` is not
///   in `(0, 1)`.
/// - [`ActiveLearningError::DimensionMismatch`] if `x` and `y` disagree.
/// - [`ActiveLearningError::EmptyInput`] if there are no samples.
/// - [`ActiveLearningError::StratifiedSplitInfeasible`] if some class has
///   fewer than two members.
///
/// # Examples
///
/// ```
/// use aprender_active::model_selection::stratified_train_test_split;
/// use aprender_active::primitives::Matrix;
///
/// let x = Matrix::from_vec(10, 1, (0..10).map(|i| i as f32).collect()).unwrap();
/// let y = vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
///
/// let split = stratified_train_test_split(&x, &y, 0.2, Some(42)).unwrap();
/// assert_eq!(split.y_test.iter().filter(|&&c| c == 0).count(), 1);
/// assert_eq!(split.y_test.iter().filter(|&&c| c == 1).count(), 1);
/// assert_eq!(split.x_train.n_rows(), 8);
/// ```
pub fn stratified_train_test_split(
    x: &Matrix<f32>,
    y: &[usize],
    test_size: f32,
    random_state: Option<u64>,
) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ActiveLearningError::invalid_hyperparameter(
            "test_size",
            test_size,
            "a fraction in (0, 1)",
        ));
    }
    if x.n_rows() != y.len() {
        return Err(ActiveLearningError::dimension_mismatch(
            "labels",
            x.n_rows(),
            y.len(),
        ));
    }
    if y.is_empty() {
        return Err(ActiveLearningError::EmptyInput(
            "cannot split a dataset with no samples".to_string(),
        ));
    }

    let mut rng = rng_from_state(random_state);
    let mut train_indices = Vec::with_capacity(y.len());
    let mut test_indices = Vec::new();

    for (class, mut members) in class_indices(y) {
        if members.len() < 2 {
            return Err(ActiveLearningError::StratifiedSplitInfeasible {
                class,
                members: members.len(),
                reason: "each class needs a member on both sides of the split".to_string(),
            });
        }
        members.shuffle(&mut rng);
        let n_test = class_test_size(members.len(), test_size);
        test_indices.extend_from_slice(&members[..n_test]);
        train_indices.extend_from_slice(&members[n_test..]);
    }

    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok(TrainTestSplit {
        x_train: x.select_rows(&train_indices),
        x_test: x.select_rows(&test_indices),
        y_train: train_indices.iter().map(|&i| y[i]).collect(),
        y_test: test_indices.iter().map(|&i| y[i]).collect(),
        train_indices,
        test_indices,
    })
}
