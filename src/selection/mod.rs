//! Query strategies for pool-based active learning.
//!
//! A query strategy picks the next batch of pool indices to label. Two
//! families are built in:
//!
//! - **Random sampling**: uniform draw without replacement.
//! - **Uncertainty sampling**: rank examples by an
//!   [`UncertaintyFunction`] and take the most uncertain ones.
//!
//! # Example
//!
//! ```
//! use aprender_active::primitives::Matrix;
//! use aprender_active::selection::{QueryRequest, StrategyRegistry};
//!
//! let registry = StrategyRegistry::with_defaults();
//! let entropy = registry.get("entropy").unwrap();
//!
//! let probabilities = Matrix::from_vec(3, 2, vec![
//!     0.9, 0.1,
//!     0.5, 0.5,
//!     0.7, 0.3,
//! ]).unwrap();
//! let unlabeled = [4, 7, 9];
//! let request = QueryRequest::new(&unlabeled, 2).with_probabilities(&probabilities);
//!
//! assert_eq!(entropy.select(&request).unwrap(), vec![7, 9]);
//! ```

use crate::error::{ActiveLearningError, Result};
use crate::primitives::Matrix;
use crate::registry::Registry;
use crate::uncertainty::UncertaintyFunction;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt::Debug;
use std::sync::Arc;

/// Builds the RNG for one seeded operation.
pub(crate) fn rng_from_state(random_state: Option<u64>) -> StdRng {
    match random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Inputs handed to a query strategy for one round.
///
/// Row `i` of `probabilities` belongs to pool index `unlabeled_ids[i]`.
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    /// Class-probability estimates for the unlabeled examples, if any.
    pub probabilities: Option<&'a Matrix<f32>>,
    /// Pool indices not yet labeled, in ascending order.
    pub unlabeled_ids: &'a [usize],
    /// Requested batch size.
    pub increment: usize,
    /// Seed shared by every random decision of the run.
    pub random_state: Option<u64>,
}

impl<'a> QueryRequest<'a> {
    /// Creates a request without probabilities or seed.
    #[must_use]
    pub fn new(unlabeled_ids: &'a [usize], increment: usize) -> Self {
        Self {
            probabilities: None,
            unlabeled_ids,
            increment,
            random_state: None,
        }
    }

    /// Attaches probability estimates.
    #[must_use]
    pub fn with_probabilities(mut self, probabilities: &'a Matrix<f32>) -> Self {
        self.probabilities = Some(probabilities);
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_random_state(mut self, random_state: Option<u64>) -> Self {
        self.random_state = random_state;
        self
    }

    /// Number of indices the strategy must return.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.increment.min(self.unlabeled_ids.len())
    }
}

/// Selects the next batch of pool indices to label.
///
/// Implementations must return `min(increment, unlabeled_ids.len())`
/// distinct indices taken from `unlabeled_ids`.
pub trait QueryStrategy: Debug + Send + Sync {
    /// Strategy name used in logs.
    fn name(&self) -> &str;

    /// Whether the strategy reads `probabilities`.
    fn requires_probabilities(&self) -> bool {
        false
    }

    /// Picks the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is inconsistent (e.g. the
    /// probability matrix does not match `unlabeled_ids`).
    fn select(&self, request: &QueryRequest<'_>) -> Result<Vec<usize>>;
}

/// Uniform sampling without replacement.
///
/// # Examples
///
/// ```
/// use aprender_active::selection::random_selection;
///
/// let pool: Vec<usize> = (0..10).collect();
/// let a = random_selection(&pool, 3, Some(0));
/// let b = random_selection(&pool, 3, Some(0));
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 3);
/// ```
#[must_use]
pub fn random_selection(
    unlabeled_ids: &[usize],
    increment: usize,
    random_state: Option<u64>,
) -> Vec<usize> {
    let n = increment.min(unlabeled_ids.len());
    let mut rng = rng_from_state(random_state);
    unlabeled_ids
        .choose_multiple(&mut rng, n)
        .copied()
        .collect()
}

/// Orders positions by descending score; equal scores keep ascending `ids`.
pub(crate) fn rank_descending(scores: &[f32], ids: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .total_cmp(&scores[a])
            .then_with(|| ids[a].cmp(&ids[b]))
    });
    order
}

/// Takes the `increment` most uncertain examples.
///
/// # Errors
///
/// Returns an error if `probabilities` does not have one row per
/// unlabeled index.
pub fn uncertainty_selection(
    probabilities: &Matrix<f32>,
    unlabeled_ids: &[usize],
    increment: usize,
    function: UncertaintyFunction,
) -> Result<Vec<usize>> {
    if probabilities.n_rows() != unlabeled_ids.len() {
        return Err(ActiveLearningError::dimension_mismatch(
            "probability rows",
            unlabeled_ids.len(),
            probabilities.n_rows(),
        ));
    }
    let scores = function.score(probabilities);
    let n = increment.min(unlabeled_ids.len());
    Ok(rank_descending(&scores, unlabeled_ids)
        .into_iter()
        .take(n)
        .map(|pos| unlabeled_ids[pos])
        .collect())
}

/// Random baseline strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampling;

impl QueryStrategy for RandomSampling {
    fn name(&self) -> &str {
        "random"
    }

    fn select(&self, request: &QueryRequest<'_>) -> Result<Vec<usize>> {
        Ok(random_selection(
            request.unlabeled_ids,
            request.increment,
            request.random_state,
        ))
    }
}

/// Uncertainty sampling with a fixed uncertainty function.
#[derive(Debug, Clone, Copy)]
pub struct UncertaintySampling {
    function: UncertaintyFunction,
}

impl UncertaintySampling {
    /// Creates an uncertainty strategy.
    #[must_use]
    pub fn new(function: UncertaintyFunction) -> Self {
        Self { function }
    }

    /// The uncertainty function in use.
    #[must_use]
    pub fn function(&self) -> UncertaintyFunction {
        self.function
    }
}

impl QueryStrategy for UncertaintySampling {
    fn name(&self) -> &str {
        self.function.name()
    }

    fn requires_probabilities(&self) -> bool {
        true
    }

    fn select(&self, request: &QueryRequest<'_>) -> Result<Vec<usize>> {
        match request.probabilities {
            Some(probabilities) => uncertainty_selection(
                probabilities,
                request.unlabeled_ids,
                request.increment,
                self.function,
            ),
            None => {
                tracing::warn!(
                    strategy = self.name(),
                    "no probability estimates available, falling back to random sampling"
                );
                Ok(random_selection(
                    request.unlabeled_ids,
                    request.increment,
                    request.random_state,
                ))
            }
        }
    }
}

/// Registry of named query strategies.
pub type StrategyRegistry = Registry<Arc<dyn QueryStrategy>>;

impl Registry<Arc<dyn QueryStrategy>> {
    /// Registry with the built-in strategies: `random`, `entropy`,
    /// `breaking_ties`, `margin` (alias of `breaking_ties`) and
    /// `least_confident`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new("selection strategy");
        registry.register("random", Arc::new(RandomSampling) as Arc<dyn QueryStrategy>);
        for function in [
            UncertaintyFunction::Entropy,
            UncertaintyFunction::BreakingTies,
            UncertaintyFunction::LeastConfident,
        ] {
            registry.register(function.name(), Arc::new(UncertaintySampling::new(function)));
        }
        registry.register(
            "margin",
            Arc::new(UncertaintySampling::new(UncertaintyFunction::BreakingTies)),
        );
        registry
    }
}

/// Strategy choice: a registry name or a strategy object.
#[derive(Debug, Clone)]
pub enum SelectionStrategy {
    /// Resolved through a [`StrategyRegistry`].
    Named(String),
    /// Used directly, bypassing the registry.
    Custom(Arc<dyn QueryStrategy>),
}

impl SelectionStrategy {
    /// Strategy looked up by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Strategy supplied directly.
    #[must_use]
    pub fn custom(strategy: impl QueryStrategy + 'static) -> Self {
        Self::Custom(Arc::new(strategy))
    }

    /// Resolves the strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveLearningError::UnknownName`] for unregistered names.
    pub fn resolve(&self, registry: &StrategyRegistry) -> Result<Arc<dyn QueryStrategy>> {
        match self {
            Self::Named(name) => registry.get(name).cloned(),
            Self::Custom(strategy) => Ok(Arc::clone(strategy)),
        }
    }
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        Self::named("entropy")
    }
}

impl From<&str> for SelectionStrategy {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}
