//! Collaborator traits for estimators and clusterers.
//!
//! The simulation never inspects a model's internals: it only needs to
//! build a fresh instance, train it on the labeled subset, and ask it for
//! predictions or class-probability estimates.

use crate::error::{ActiveLearningError, Result};
use crate::primitives::Matrix;
use std::fmt::Debug;

/// Supervised classifier used inside the active learning loop.
///
/// # Examples
///
/// ```
/// use aprender_active::prelude::*;
///
/// let x = Matrix::from_vec(4, 1, vec![0.0, 0.1, 1.0, 1.1]).unwrap();
/// let y = vec![0, 0, 1, 1];
///
/// let mut model = DecisionTreeClassifier::new();
/// model.fit(&x, &y).unwrap();
/// assert_eq!(model.predict(&x).unwrap(), y);
/// ```
pub trait Classifier: Debug + Send + Sync {
    /// Fits the model to labeled data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (dimension mismatch, empty data, etc.).
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()>;

    /// Predicts class labels for input data.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted.
    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>>;

    /// Predicts class-probability estimates, one row per sample.
    ///
    /// # Errors
    ///
    /// The default implementation reports the capability as unsupported.
    fn predict_proba(&self, _x: &Matrix<f32>) -> Result<Matrix<f32>> {
        Err(ActiveLearningError::Unsupported(format!(
            "{self:?} does not provide predict_proba"
        )))
    }

    /// Whether `predict_proba` is implemented.
    fn supports_probabilities(&self) -> bool {
        false
    }
}

/// Produces fresh, untrained classifiers from a fixed configuration.
///
/// Implemented for any `Fn() -> Box<dyn Classifier>` closure.
pub trait ClassifierFactory: Send + Sync {
    /// Builds a new untrained classifier.
    fn build(&self) -> Box<dyn Classifier>;
}

impl<F> ClassifierFactory for F
where
    F: Fn() -> Box<dyn Classifier> + Send + Sync,
{
    fn build(&self) -> Box<dyn Classifier> {
        self()
    }
}

/// Soft cluster membership produced by a fitted clusterer.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterMembership {
    /// Per-cluster membership probabilities (rows sum to one).
    Probabilities(Matrix<f32>),
    /// Per-cluster distances (smaller means closer to the centroid).
    Distances(Matrix<f32>),
}

/// Unsupervised clustering model used for cluster-based seeding.
pub trait Clusterer: Debug + Send + Sync {
    /// Fits the clusterer to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (empty data, too few samples, etc.).
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()>;

    /// Soft membership of every sample in every cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the clusterer is not fitted.
    fn membership(&self, x: &Matrix<f32>) -> Result<ClusterMembership>;
}

/// Produces fresh, unfitted clusterers.
pub trait ClustererFactory: Send + Sync {
    /// Builds a new unfitted clusterer.
    fn build(&self) -> Box<dyn Clusterer>;
}

impl<F> ClustererFactory for F
where
    F: Fn() -> Box<dyn Clusterer> + Send + Sync,
{
    fn build(&self) -> Box<dyn Clusterer> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Classifier that always predicts the first label it saw.
    #[derive(Debug, Default)]
    struct ConstantClassifier {
        label: Option<usize>,
    }

    impl Classifier for ConstantClassifier {
        fn fit(&mut self, _x: &Matrix<f32>, y: &[usize]) -> Result<()> {
            self.label = Some(*y.first().ok_or("empty labels")?);
            Ok(())
        }

        fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
            let label = self.label.ok_or(ActiveLearningError::NotFitted {
                what: "ConstantClassifier",
            })?;
            Ok(vec![label; x.n_rows()])
        }
    }

    #[test]
    fn test_default_predict_proba_is_unsupported() {
        let mut model = ConstantClassifier::default();
        let x = Matrix::from_vec(2, 1, vec![0.0, 1.0]).expect("2x1 matrix");
        model.fit(&x, &[3, 4]).expect("fit succeeds");

        assert!(!model.supports_probabilities());
        let err = model.predict_proba(&x).unwrap_err();
        assert!(matches!(err, ActiveLearningError::Unsupported(_)));
        assert!(err.to_string().contains("ConstantClassifier"));
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let model = ConstantClassifier::default();
        let x = Matrix::from_vec(1, 1, vec![0.0]).expect("1x1 matrix");
        assert!(model.predict(&x).is_err());
    }

    #[test]
    fn test_closure_factory_builds_fresh_instances() {
        let factory = || Box::new(ConstantClassifier::default()) as Box<dyn Classifier>;
        let x = Matrix::from_vec(1, 1, vec![0.0]).expect("1x1 matrix");

        let mut first = ClassifierFactory::build(&factory);
        first.fit(&x, &[7]).expect("fit succeeds");

        let second = ClassifierFactory::build(&factory);
        assert!(second.predict(&x).is_err(), "factory output must be untrained");
        assert_eq!(first.predict(&x).expect("fitted"), vec![7]);
    }
}
