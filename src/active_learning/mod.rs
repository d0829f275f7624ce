//! Pool-based active learning simulation.
//!
//! A fully labeled dataset is treated as an unlabeled pool. Each round the
//! configured query strategy picks a batch of pool examples, their labels
//! are revealed, a fresh classifier is trained on everything labeled so far
//! and scored on a held-out set. The run stops when the round cap is hit or
//! the pool is exhausted.
//!
//! # Example
//!
//! ```
//! use aprender_active::prelude::*;
//!
//! let x = Matrix::from_vec(40, 1, (0..40).map(|i| i as f32).collect()).unwrap();
//! let y: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();
//!
//! let strategies = StrategyRegistry::with_defaults();
//! let scorers = ScorerRegistry::with_defaults();
//! let config = ActiveLearnerConfig::new()
//!     .with_classifier(|| Box::new(DecisionTreeClassifier::new()) as Box<dyn Classifier>)
//!     .with_n_initial(4)
//!     .with_increment(4)
//!     .with_max_iter(Some(5))
//!     .with_random_state(0);
//!
//! let mut learner = ActiveLearner::new(config, &strategies, &scorers).unwrap();
//! learner.fit(&x, &y).unwrap();
//!
//! let history = learner.history().unwrap();
//! assert_eq!(history.labeled_counts(), vec![4, 8, 12, 16, 20]);
//! assert_eq!(learner.predict(&x).unwrap().len(), 40);
//! ```

mod config;
mod history;

pub use config::{ActiveLearnerConfig, DEFAULT_N_ESTIMATORS};
pub use history::{BestModel, IterationRecord, LearningHistory};

use crate::error::{ActiveLearningError, Result};
use crate::model_selection::stratified_train_test_split;
use crate::primitives::Matrix;
use crate::scoring::{Scorer, ScorerRegistry};
use crate::selection::{QueryRequest, QueryStrategy, StrategyRegistry};
use crate::traits::{Classifier, ClassifierFactory, Clusterer};
use crate::uncertainty::clamp_zero_probabilities;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Held-out evaluation data.
#[derive(Debug, Clone)]
struct HeldOut {
    x: Matrix<f32>,
    y: Vec<usize>,
    indices: Vec<usize>,
}

/// Everything produced by a completed `fit`.
#[derive(Debug)]
struct FittedState {
    labeled: Vec<bool>,
    history: LearningHistory,
    best: Option<BestModel>,
    active: Arc<dyn Classifier>,
    clusterer: Option<Box<dyn Clusterer>>,
    held_out: Option<HeldOut>,
    pool_indices: Vec<usize>,
}

/// Active learning simulation controller.
///
/// Strategy and metric names are resolved when the learner is built, so
/// a misspelled name fails before any training happens.
pub struct ActiveLearner {
    config: ActiveLearnerConfig,
    strategy: Arc<dyn QueryStrategy>,
    metric: Scorer,
    classifier: Arc<dyn ClassifierFactory>,
    state: Option<FittedState>,
}

impl fmt::Debug for ActiveLearner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveLearner")
            .field("config", &self.config)
            .field("strategy", &self.strategy.name())
            .field("fitted", &self.state.is_some())
            .finish()
    }
}

/// Sorted indices where `mask` is unset.
fn unlabeled_ids(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &labeled)| (!labeled).then_some(i))
        .collect()
}

/// Sorted indices where `mask` is set.
fn labeled_ids(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &labeled)| labeled.then_some(i))
        .collect()
}

/// Marks `batch` as labeled and returns how many examples were new.
///
/// Every index must be in range and unlabeled before this round; repeats
/// within the batch are labeled once.
fn mark_labeled(mask: &mut [bool], batch: &[usize]) -> Result<usize> {
    let before = mask.to_vec();
    let mut added = 0;
    for &id in batch {
        if id >= mask.len() {
            return Err(ActiveLearningError::ContractViolation(format!(
                "index {id} is outside the pool of {} examples",
                mask.len()
            )));
        }
        if before[id] {
            return Err(ActiveLearningError::ContractViolation(format!(
                "index {id} was already labeled"
            )));
        }
        if !mask[id] {
            mask[id] = true;
            added += 1;
        }
    }
    if added == 0 {
        return Err(ActiveLearningError::ContractViolation(
            "query returned an empty batch".to_string(),
        ));
    }
    Ok(added)
}

impl ActiveLearner {
    /// Builds a learner, resolving names against the registries.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown names, invalid numeric
    /// settings, a learning-curve scorer used as the per-round metric, or
    /// a probability-based strategy paired with a classifier that cannot
    /// estimate probabilities.
    pub fn new(
        config: ActiveLearnerConfig,
        strategies: &StrategyRegistry,
        scorers: &ScorerRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let strategy = config.selection_strategy().resolve(strategies)?;
        let metric = config.evaluation_metric().resolve(scorers)?;
        if !metric.is_holdout() {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "evaluation_metric",
                format!("{:?}", config.evaluation_metric()),
                "a scorer over a trained classifier, not a learning curve",
            ));
        }

        let classifier = config.classifier_factory();
        if strategy.requires_probabilities() && !classifier.build().supports_probabilities() {
            return Err(ActiveLearningError::Unsupported(format!(
                "strategy '{}' needs predict_proba, which the classifier does not provide",
                strategy.name()
            )));
        }

        Ok(Self {
            config,
            strategy,
            metric,
            classifier,
            state: None,
        })
    }

    /// Runs the simulation on `x`/`y`, replacing any previous results.
    ///
    /// Query batches after the first are capped at the number of unlabeled
    /// examples. The seed batch is not: an `n_initial` larger than the pool
    /// (the examples left after the held-out split) is rejected up front.
    ///
    /// # Errors
    ///
    /// Data errors (label count mismatch, fewer than two classes, an
    /// infeasible stratified split, a seed set larger than the pool) are
    /// reported before the first round. Any failure inside a round aborts
    /// the run and leaves the learner unfitted.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        self.state = None;

        if x.n_rows() != y.len() {
            return Err(ActiveLearningError::dimension_mismatch(
                "labels",
                x.n_rows(),
                y.len(),
            ));
        }
        if y.is_empty() {
            return Err(ActiveLearningError::EmptyInput(
                "cannot simulate on an empty pool".to_string(),
            ));
        }
        let n_classes = y.iter().collect::<BTreeSet<_>>().len();
        if n_classes < 2 {
            return Err(ActiveLearningError::InsufficientClasses { found: n_classes });
        }

        let random_state = self.config.random_state();
        let (pool_x, pool_y, pool_indices, held_out) = if self.config.auto_load() {
            let split =
                stratified_train_test_split(x, y, self.config.test_size(), random_state)?;
            let held_out = HeldOut {
                x: split.x_test,
                y: split.y_test,
                indices: split.test_indices,
            };
            (split.x_train, split.y_train, split.train_indices, Some(held_out))
        } else {
            (x.clone(), y.to_vec(), (0..y.len()).collect(), None)
        };

        let pool_size = pool_y.len();
        if self.config.n_initial() > pool_size {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "n_initial",
                self.config.n_initial(),
                &format!("at most the pool size ({pool_size})"),
            ));
        }

        tracing::info!(
            pool_size,
            held_out = held_out.as_ref().map_or(0, |h| h.y.len()),
            strategy = self.strategy.name(),
            n_initial = self.config.n_initial(),
            increment = self.config.increment(),
            "starting active learning simulation"
        );

        let mut labeled = vec![false; pool_size];
        let mut history = LearningHistory::default();
        let mut best: Option<BestModel> = None;
        let mut clusterer = None;
        let mut last: Option<Arc<dyn Classifier>> = None;
        let mut probabilities: Option<Matrix<f32>> = None;
        let mut iteration = 0;

        loop {
            if self.config.max_iter().is_some_and(|cap| iteration >= cap) {
                break;
            }

            let unlabeled = unlabeled_ids(&labeled);
            let batch = if iteration == 0 {
                let seed = self.config.initializer().initialize(
                    &pool_x,
                    &pool_y,
                    self.config.n_initial(),
                    random_state,
                )?;
                clusterer = seed.clusterer;
                seed.ids
            } else {
                let increment = self.config.increment().min(unlabeled.len());
                let mut request =
                    QueryRequest::new(&unlabeled, increment).with_random_state(random_state);
                if let Some(p) = probabilities.as_ref() {
                    request = request.with_probabilities(p);
                }
                self.strategy.select(&request)?
            };
            mark_labeled(&mut labeled, &batch)?;

            let train_ids = labeled_ids(&labeled);
            let train_y: Vec<usize> = train_ids.iter().map(|&i| pool_y[i]).collect();
            let mut model = self.classifier.build();
            model.fit(&pool_x.select_rows(&train_ids), &train_y)?;
            let model: Arc<dyn Classifier> = Arc::from(model);

            let n_labeled = train_ids.len();
            let labeled_fraction = n_labeled as f32 / pool_size as f32;

            let score = match held_out.as_ref() {
                Some(h) => Some(self.metric.score_model(model.as_ref(), &h.x, &h.y)?),
                None => None,
            };
            if let Some(score) = score {
                if BestModel::offer(&mut best, score, iteration, &model) {
                    tracing::debug!(iteration, score, "new best classifier");
                }
            }

            tracing::debug!(
                iteration,
                n_labeled,
                labeled_fraction,
                score = score.unwrap_or(f32::NAN),
                "iteration complete"
            );

            history.push(IterationRecord {
                iteration,
                n_labeled,
                labeled_fraction,
                selected: batch,
                test_score: score.filter(|_| self.config.save_test_scores()),
                classifier: self
                    .config
                    .save_classifiers()
                    .then(|| Arc::clone(&model)),
            });
            iteration += 1;

            let remaining = unlabeled_ids(&labeled);
            probabilities = if remaining.is_empty() || !model.supports_probabilities() {
                None
            } else {
                let mut p = model.predict_proba(&pool_x.select_rows(&remaining))?;
                clamp_zero_probabilities(&mut p);
                Some(p)
            };
            last = Some(model);

            if remaining.is_empty() {
                break;
            }
        }

        let last = last.ok_or_else(|| {
            ActiveLearningError::Other("simulation finished without training".to_string())
        })?;
        let active = match (&best, self.config.auto_load()) {
            (Some(b), true) => Arc::clone(&b.classifier),
            _ => Arc::clone(&last),
        };

        tracing::info!(
            iterations = history.len(),
            n_labeled = labeled.iter().filter(|&&l| l).count(),
            best_score = best.as_ref().map_or(f32::NAN, |b| b.score),
            best_iteration = best.as_ref().map(|b| b.iteration),
            "active learning simulation finished"
        );

        self.state = Some(FittedState {
            labeled,
            history,
            best,
            active,
            clusterer,
            held_out,
            pool_indices,
        });
        Ok(())
    }

    fn fitted(&self) -> Result<&FittedState> {
        self.state.as_ref().ok_or(ActiveLearningError::NotFitted {
            what: "ActiveLearner",
        })
    }

    /// Predicts with the best classifier (`auto_load`) or the last one.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveLearningError::NotFitted`] before `fit`.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        self.fitted()?.active.predict(x)
    }

    /// Re-scores every saved snapshot on `x`/`y` with the evaluation metric
    /// and makes the highest-scoring one active. Returns its iteration;
    /// ties keep the earliest.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveLearningError::NotFitted`] before `fit` and
    /// [`ActiveLearningError::NoSavedClassifiers`] unless `save_classifiers`
    /// was on.
    pub fn load_best_classifier(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<usize> {
        let state = self.fitted()?;
        let mut chosen: Option<(usize, f32, Arc<dyn Classifier>)> = None;
        for (iteration, classifier) in state.history.classifiers() {
            let score = self.metric.score_model(classifier.as_ref(), x, y)?;
            if chosen.as_ref().map_or(true, |(_, best, _)| score > *best) {
                chosen = Some((iteration, score, Arc::clone(classifier)));
            }
        }
        let (iteration, score, classifier) =
            chosen.ok_or(ActiveLearningError::NoSavedClassifiers)?;

        tracing::info!(iteration, score, "loaded best saved classifier");
        if let Some(state) = self.state.as_mut() {
            state.active = classifier;
        }
        Ok(iteration)
    }

    /// Applies `scorer` to the finished run.
    ///
    /// Hold-out scorers evaluate the active classifier on the held-out
    /// set; learning-curve scorers consume the saved test scores.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveLearningError::NotFitted`] before `fit`, or
    /// [`ActiveLearningError::Unsupported`] when the run kept no held-out
    /// set or no test scores.
    pub fn evaluate(&self, scorer: &Scorer) -> Result<f32> {
        let state = self.fitted()?;
        match scorer {
            Scorer::Holdout(_) => {
                let h = state.held_out.as_ref().ok_or_else(|| {
                    ActiveLearningError::Unsupported(
                        "no held-out set, enable auto_load".to_string(),
                    )
                })?;
                scorer.score_model(state.active.as_ref(), &h.x, &h.y)
            }
            Scorer::LearningCurve(_) => {
                let (scores, utilization) = state.history.learning_curve();
                if scores.is_empty() {
                    return Err(ActiveLearningError::Unsupported(
                        "no test scores were saved, enable auto_load and save_test_scores"
                            .to_string(),
                    ));
                }
                scorer.score_curve(&scores, &utilization)
            }
        }
    }

    /// Resolves `name` in `scorers` and applies it with [`evaluate`](Self::evaluate).
    ///
    /// # Errors
    ///
    /// Unknown names plus everything `evaluate` reports.
    pub fn evaluate_named(&self, name: &str, scorers: &ScorerRegistry) -> Result<f32> {
        self.evaluate(scorers.get(name)?)
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ActiveLearnerConfig {
        &self.config
    }

    /// Resolved query strategy.
    #[must_use]
    pub fn strategy(&self) -> &dyn QueryStrategy {
        self.strategy.as_ref()
    }

    /// Whether `fit` has completed.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Final label mask over the pool.
    #[must_use]
    pub fn labeled_mask(&self) -> Option<&[bool]> {
        self.state.as_ref().map(|s| s.labeled.as_slice())
    }

    /// Per-iteration records.
    #[must_use]
    pub fn history(&self) -> Option<&LearningHistory> {
        self.state.as_ref().map(|s| &s.history)
    }

    /// Best held-out score seen during `fit`.
    #[must_use]
    pub fn best(&self) -> Option<&BestModel> {
        self.state.as_ref().and_then(|s| s.best.as_ref())
    }

    /// Classifier used by [`predict`](Self::predict).
    #[must_use]
    pub fn classifier(&self) -> Option<&dyn Classifier> {
        self.state.as_ref().map(|s| s.active.as_ref())
    }

    /// Clusterer fitted by cluster-based seeding.
    #[must_use]
    pub fn clusterer(&self) -> Option<&dyn Clusterer> {
        self.state.as_ref().and_then(|s| s.clusterer.as_deref())
    }

    /// Original row of every pool position.
    #[must_use]
    pub fn pool_indices(&self) -> Option<&[usize]> {
        self.state.as_ref().map(|s| s.pool_indices.as_slice())
    }

    /// Original rows of the held-out set, when one was used.
    #[must_use]
    pub fn test_indices(&self) -> Option<&[usize]> {
        self.state
            .as_ref()
            .and_then(|s| s.held_out.as_ref())
            .map(|h| h.indices.as_slice())
    }
}

/// Runs one independent simulation per seed in parallel.
///
/// Runs share only the read-only registries; results are returned in
/// `seeds` order.
///
/// # Errors
///
/// Returns the first error any run reports.
pub fn simulate_seeds(
    config: &ActiveLearnerConfig,
    strategies: &StrategyRegistry,
    scorers: &ScorerRegistry,
    x: &Matrix<f32>,
    y: &[usize],
    seeds: &[u64],
) -> Result<Vec<ActiveLearner>> {
    seeds
        .par_iter()
        .map(|&seed| {
            let config = config.clone().with_random_state(seed);
            let mut learner = ActiveLearner::new(config, strategies, scorers)?;
            learner.fit(x, y)?;
            Ok(learner)
        })
        .collect()
}

#[cfg(test)]
mod tests;
