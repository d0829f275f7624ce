//! Named scorers for evaluating active learning runs.
//!
//! A [`Scorer`] is either a *hold-out* scorer, applied to a trained
//! classifier and labeled evaluation data after every round, or a
//! *learning-curve* scorer, applied to the whole history of test scores
//! and data-utilization fractions once a run has finished.
//!
//! # Example
//!
//! ```
//! use aprender_active::scoring::ScorerRegistry;
//!
//! let mut scorers = ScorerRegistry::with_defaults();
//! let key = scorers.register_dur(0.9);
//! assert_eq!(key, "dur_90");
//!
//! let dur = scorers.get("dur_90").unwrap();
//! let value = dur
//!     .score_curve(&[0.5, 0.6, 0.9, 0.95], &[0.2, 0.4, 0.6, 0.8])
//!     .unwrap();
//! assert!((value - 0.6).abs() < 1e-6);
//! ```

use crate::error::{ActiveLearningError, Result};
use crate::metrics::{
    accuracy, area_under_learning_curve, data_utilization_rate, f1_score, geometric_mean_score,
    Average,
};
use crate::primitives::Matrix;
use crate::registry::Registry;
use crate::traits::Classifier;
use std::fmt;
use std::sync::Arc;

/// Scores a trained classifier on labeled evaluation data.
pub type HoldoutFn = dyn Fn(&dyn Classifier, &Matrix<f32>, &[usize]) -> Result<f32> + Send + Sync;

/// Scores a learning curve given test scores and data-utilization fractions.
pub type LearningCurveFn = dyn Fn(&[f32], &[f32]) -> f32 + Send + Sync;

/// A named evaluation function.
#[derive(Clone)]
pub enum Scorer {
    /// Per-iteration scorer over a held-out set.
    Holdout(Arc<HoldoutFn>),
    /// Whole-run scorer over the learning curve.
    LearningCurve(Arc<LearningCurveFn>),
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Holdout(_) => f.write_str("Scorer::Holdout(..)"),
            Self::LearningCurve(_) => f.write_str("Scorer::LearningCurve(..)"),
        }
    }
}

impl Scorer {
    /// Wraps an arbitrary hold-out scoring function.
    #[must_use]
    pub fn holdout<F>(f: F) -> Self
    where
        F: Fn(&dyn Classifier, &Matrix<f32>, &[usize]) -> Result<f32> + Send + Sync + 'static,
    {
        Self::Holdout(Arc::new(f))
    }

    /// Hold-out scorer that predicts `x` and compares against `y` with
    /// `metric(y_pred, y_true)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use aprender_active::metrics::accuracy;
    /// use aprender_active::scoring::Scorer;
    ///
    /// let scorer = Scorer::from_predictions(accuracy);
    /// assert!(scorer.is_holdout());
    /// ```
    #[must_use]
    pub fn from_predictions<F>(metric: F) -> Self
    where
        F: Fn(&[usize], &[usize]) -> f32 + Send + Sync + 'static,
    {
        Self::holdout(move |model, x, y| {
            if x.n_rows() != y.len() {
                return Err(ActiveLearningError::dimension_mismatch(
                    "evaluation labels",
                    x.n_rows(),
                    y.len(),
                ));
            }
            if y.is_empty() {
                return Err(ActiveLearningError::EmptyInput(
                    "evaluation set has no samples".to_string(),
                ));
            }
            let y_pred = model.predict(x)?;
            Ok(metric(&y_pred, y))
        })
    }

    /// Wraps a learning-curve scoring function.
    #[must_use]
    pub fn learning_curve<F>(f: F) -> Self
    where
        F: Fn(&[f32], &[f32]) -> f32 + Send + Sync + 'static,
    {
        Self::LearningCurve(Arc::new(f))
    }

    /// Whether this scorer evaluates a trained classifier.
    #[must_use]
    pub fn is_holdout(&self) -> bool {
        matches!(self, Self::Holdout(_))
    }

    /// Scores a trained classifier.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveLearningError::Unsupported`] for learning-curve
    /// scorers, or whatever the underlying function reports.
    pub fn score_model(&self, model: &dyn Classifier, x: &Matrix<f32>, y: &[usize]) -> Result<f32> {
        match self {
            Self::Holdout(f) => f(model, x, y),
            Self::LearningCurve(_) => Err(ActiveLearningError::Unsupported(
                "learning-curve scorer cannot score a single classifier".to_string(),
            )),
        }
    }

    /// Scores a learning curve.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveLearningError::Unsupported`] for hold-out scorers and
    /// a dimension mismatch if the sequences differ in length.
    pub fn score_curve(&self, test_scores: &[f32], data_utilization: &[f32]) -> Result<f32> {
        match self {
            Self::LearningCurve(f) => {
                if test_scores.len() != data_utilization.len() {
                    return Err(ActiveLearningError::dimension_mismatch(
                        "data utilization entries",
                        test_scores.len(),
                        data_utilization.len(),
                    ));
                }
                Ok(f(test_scores, data_utilization))
            }
            Self::Holdout(_) => Err(ActiveLearningError::Unsupported(
                "hold-out scorer needs a classifier, not a learning curve".to_string(),
            )),
        }
    }
}

/// Registry of named scorers.
pub type ScorerRegistry = Registry<Scorer>;

/// Registry key for a data-utilization-rate scorer, e.g. `dur_90`.
#[must_use]
pub fn dur_key(threshold: f32) -> String {
    format!("dur_{}", (threshold * 100.0).round() as i64)
}

impl Registry<Scorer> {
    /// Registry with `accuracy`, `f1_macro`, `geometric_mean_score_macro`
    /// and `area_under_learning_curve`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new("scorer");
        registry.register("accuracy", Scorer::from_predictions(accuracy));
        registry.register(
            "f1_macro",
            Scorer::from_predictions(|y_pred, y_true| f1_score(y_pred, y_true, Average::Macro)),
        );
        registry.register(
            "geometric_mean_score_macro",
            Scorer::from_predictions(|y_pred, y_true| {
                geometric_mean_score(y_pred, y_true, Average::Macro)
            }),
        );
        registry.register(
            "area_under_learning_curve",
            Scorer::learning_curve(area_under_learning_curve),
        );
        registry
    }

    /// Registers a data-utilization-rate scorer for `threshold` and returns
    /// its key. The scorer yields `NaN` when the threshold is never reached.
    pub fn register_dur(&mut self, threshold: f32) -> String {
        let key = dur_key(threshold);
        self.register(
            key.clone(),
            Scorer::learning_curve(move |scores, utilization| {
                data_utilization_rate(scores, utilization, threshold).unwrap_or(f32::NAN)
            }),
        );
        key
    }

    /// Registers one data-utilization-rate scorer per threshold.
    #[must_use]
    pub fn with_dur_sweep(mut self, thresholds: impl IntoIterator<Item = f32>) -> Self {
        for threshold in thresholds {
            self.register_dur(threshold);
        }
        self
    }
}

/// Evaluation metric choice: a registry name or a scorer object.
#[derive(Debug, Clone)]
pub enum MetricSpec {
    /// Resolved through a [`ScorerRegistry`].
    Named(String),
    /// Used directly, bypassing the registry.
    Custom(Scorer),
}

impl MetricSpec {
    /// Metric looked up by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Resolves the metric.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveLearningError::UnknownName`] for unregistered names.
    pub fn resolve(&self, registry: &ScorerRegistry) -> Result<Scorer> {
        match self {
            Self::Named(name) => registry.get(name).cloned(),
            Self::Custom(scorer) => Ok(scorer.clone()),
        }
    }
}

impl Default for MetricSpec {
    fn default() -> Self {
        Self::named("accuracy")
    }
}

impl From<&str> for MetricSpec {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<Scorer> for MetricSpec {
    fn from(scorer: Scorer) -> Self {
        Self::Custom(scorer)
    }
}
