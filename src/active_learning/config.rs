//! Configuration of an active learning simulation.

use crate::error::{ActiveLearningError, Result};
use crate::initialization::SeedInitializer;
use crate::scoring::MetricSpec;
use crate::selection::SelectionStrategy;
use crate::traits::{Classifier, ClassifierFactory};
use crate::tree::RandomForestClassifier;
use std::fmt;
use std::sync::Arc;

/// Trees in the default Random Forest estimator.
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Simulation settings.
///
/// # Examples
///
/// ```
/// use aprender_active::active_learning::ActiveLearnerConfig;
///
/// let config = ActiveLearnerConfig::new()
///     .with_selection_strategy("breaking_ties")
///     .with_n_initial(10)
///     .with_increment(5)
///     .with_max_iter(Some(20))
///     .with_random_state(42);
///
/// assert_eq!(config.n_initial(), 10);
/// assert_eq!(config.max_iter(), Some(20));
/// ```
#[derive(Clone)]
pub struct ActiveLearnerConfig {
    classifier: Option<Arc<dyn ClassifierFactory>>,
    max_iter: Option<usize>,
    selection_strategy: SelectionStrategy,
    n_initial: usize,
    increment: usize,
    test_size: f32,
    random_state: Option<u64>,
    save_classifiers: bool,
    save_test_scores: bool,
    auto_load: bool,
    evaluation_metric: MetricSpec,
    initializer: SeedInitializer,
}

impl fmt::Debug for ActiveLearnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveLearnerConfig")
            .field("custom_classifier", &self.classifier.is_some())
            .field("max_iter", &self.max_iter)
            .field("selection_strategy", &self.selection_strategy)
            .field("n_initial", &self.n_initial)
            .field("increment", &self.increment)
            .field("test_size", &self.test_size)
            .field("random_state", &self.random_state)
            .field("save_classifiers", &self.save_classifiers)
            .field("save_test_scores", &self.save_test_scores)
            .field("auto_load", &self.auto_load)
            .field("evaluation_metric", &self.evaluation_metric)
            .field("initializer", &self.initializer)
            .finish()
    }
}

impl Default for ActiveLearnerConfig {
    fn default() -> Self {
        Self {
            classifier: None,
            max_iter: Some(1000),
            selection_strategy: SelectionStrategy::default(),
            n_initial: 100,
            increment: 50,
            test_size: 0.1,
            random_state: None,
            save_classifiers: false,
            save_test_scores: true,
            auto_load: true,
            evaluation_metric: MetricSpec::default(),
            initializer: SeedInitializer::default(),
        }
    }
}

impl ActiveLearnerConfig {
    /// Configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the factory producing a fresh classifier every round.
    ///
    /// Without one, a seeded Random Forest is used.
    #[must_use]
    pub fn with_classifier(mut self, factory: impl ClassifierFactory + 'static) -> Self {
        self.classifier = Some(Arc::new(factory));
        self
    }

    /// Caps the number of rounds; `None` runs until the pool is exhausted.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: Option<usize>) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the query strategy, by name or as an object.
    #[must_use]
    pub fn with_selection_strategy(mut self, strategy: impl Into<SelectionStrategy>) -> Self {
        self.selection_strategy = strategy.into();
        self
    }

    /// Sets the seed-set size.
    #[must_use]
    pub fn with_n_initial(mut self, n_initial: usize) -> Self {
        self.n_initial = n_initial;
        self
    }

    /// Sets the batch size of every later round.
    #[must_use]
    pub fn with_increment(mut self, increment: usize) -> Self {
        self.increment = increment;
        self
    }

    /// Sets the held-out fraction used when `auto_load` is on.
    #[must_use]
    pub fn with_test_size(mut self, test_size: f32) -> Self {
        self.test_size = test_size;
        self
    }

    /// Sets the seed threaded through the split, the seed set and every
    /// strategy call.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Keeps every round's classifier in the history.
    #[must_use]
    pub fn with_save_classifiers(mut self, save: bool) -> Self {
        self.save_classifiers = save;
        self
    }

    /// Keeps every round's held-out score in the history.
    #[must_use]
    pub fn with_save_test_scores(mut self, save: bool) -> Self {
        self.save_test_scores = save;
        self
    }

    /// Holds out a stratified test set and predicts with the best-scoring
    /// classifier instead of the last one.
    #[must_use]
    pub fn with_auto_load(mut self, auto_load: bool) -> Self {
        self.auto_load = auto_load;
        self
    }

    /// Sets the per-round evaluation metric, by name or as a scorer.
    #[must_use]
    pub fn with_evaluation_metric(mut self, metric: impl Into<MetricSpec>) -> Self {
        self.evaluation_metric = metric.into();
        self
    }

    /// Sets how the seed set is chosen.
    #[must_use]
    pub fn with_initializer(mut self, initializer: SeedInitializer) -> Self {
        self.initializer = initializer;
        self
    }

    /// Round cap.
    #[must_use]
    pub fn max_iter(&self) -> Option<usize> {
        self.max_iter
    }

    /// Query strategy choice.
    #[must_use]
    pub fn selection_strategy(&self) -> &SelectionStrategy {
        &self.selection_strategy
    }

    /// Seed-set size.
    #[must_use]
    pub fn n_initial(&self) -> usize {
        self.n_initial
    }

    /// Batch size of later rounds.
    #[must_use]
    pub fn increment(&self) -> usize {
        self.increment
    }

    /// Held-out fraction.
    #[must_use]
    pub fn test_size(&self) -> f32 {
        self.test_size
    }

    /// Shared random seed.
    #[must_use]
    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }

    /// Whether classifier snapshots are kept.
    #[must_use]
    pub fn save_classifiers(&self) -> bool {
        self.save_classifiers
    }

    /// Whether held-out scores are kept.
    #[must_use]
    pub fn save_test_scores(&self) -> bool {
        self.save_test_scores
    }

    /// Whether a held-out set is used to pick the best classifier.
    #[must_use]
    pub fn auto_load(&self) -> bool {
        self.auto_load
    }

    /// Evaluation metric choice.
    #[must_use]
    pub fn evaluation_metric(&self) -> &MetricSpec {
        &self.evaluation_metric
    }

    /// Seed-set selection.
    #[must_use]
    pub fn initializer(&self) -> &SeedInitializer {
        &self.initializer
    }

    /// Classifier factory in effect.
    pub(crate) fn classifier_factory(&self) -> Arc<dyn ClassifierFactory> {
        if let Some(factory) = &self.classifier {
            return Arc::clone(factory);
        }
        let random_state = self.random_state;
        Arc::new(move || {
            let mut forest = RandomForestClassifier::new(DEFAULT_N_ESTIMATORS);
            if let Some(seed) = random_state {
                forest = forest.with_random_state(seed);
            }
            Box::new(forest) as Box<dyn Classifier>
        })
    }

    /// Checks the numeric settings.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveLearningError::InvalidHyperparameter`] for a zero
    /// round cap or increment, a seed set smaller than two, or a held-out
    /// fraction outside `(0, 1)` while `auto_load` is on.
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == Some(0) {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "max_iter",
                0,
                "at least 1 or unbounded",
            ));
        }
        if self.increment == 0 {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "increment",
                0,
                "at least 1",
            ));
        }
        if self.n_initial < 2 {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "n_initial",
                self.n_initial,
                "at least 2",
            ));
        }
        if self.auto_load && !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "test_size",
                self.test_size,
                "a fraction in (0, 1)",
            ));
        }
        Ok(())
    }
}
