//! Seed-set selection for active learning runs.
//!
//! Before the first round a small set of pool examples is labeled. It can
//! be drawn at random or chosen from the structure a clusterer finds in the
//! pool:
//!
//! - **edge**: examples with the most ambiguous cluster membership
//! - **centroid**: examples that sit firmly inside one cluster
//! - **hybrid**: a random draw (with replacement) from both sets
//!
//! Whatever the method, the seed always spans at least two classes.

use crate::cluster::KMeans;
use crate::error::{ActiveLearningError, Result};
use crate::primitives::Matrix;
use crate::selection::{rank_descending, rng_from_state};
use crate::traits::{ClusterMembership, Clusterer, ClustererFactory};
use crate::uncertainty::{clamp_zero_probabilities, distances_to_probabilities, UncertaintyFunction};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// How the seed set is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InitMethod {
    /// Uniform draw without replacement.
    #[default]
    Random,
    /// Highest cluster-membership uncertainty.
    Edge,
    /// Lowest cluster-membership uncertainty.
    Centroid,
    /// Random mix of the edge and centroid sets.
    Hybrid,
}

impl InitMethod {
    /// Method name as used in experiment configurations.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Edge => "edge",
            Self::Centroid => "centroid",
            Self::Hybrid => "hybrid",
        }
    }

    /// Whether the method needs a clusterer.
    #[must_use]
    pub fn is_cluster_based(self) -> bool {
        !matches!(self, Self::Random)
    }
}

impl std::str::FromStr for InitMethod {
    type Err = ActiveLearningError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(Self::Random),
            "edge" => Ok(Self::Edge),
            "centroid" => Ok(Self::Centroid),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(ActiveLearningError::UnknownName {
                kind: "initialization method",
                name: other.to_string(),
                available: ["centroid", "edge", "hybrid", "random"]
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            }),
        }
    }
}

/// Seed indices plus the clusterer fitted to choose them.
#[derive(Debug)]
pub struct SeedSelection {
    /// Fitted clusterer, for cluster-based methods.
    pub clusterer: Option<Box<dyn Clusterer>>,
    /// Pool indices to label first. `hybrid` may repeat an index.
    pub ids: Vec<usize>,
}

/// Seed-set selection configuration.
///
/// # Examples
///
/// ```
/// use aprender_active::initialization::{InitMethod, SeedInitializer};
/// use aprender_active::primitives::Matrix;
///
/// let x = Matrix::from_vec(6, 1, vec![0.0, 0.1, 0.2, 5.0, 5.1, 5.2]).unwrap();
/// let y = vec![0, 0, 0, 1, 1, 1];
///
/// let seed = SeedInitializer::new(InitMethod::Random)
///     .initialize(&x, &y, 2, Some(0))
///     .unwrap();
/// assert_eq!(seed.ids.len(), 2);
/// assert_ne!(y[seed.ids[0]], y[seed.ids[1]]);
/// ```
#[derive(Clone, Default)]
pub struct SeedInitializer {
    method: InitMethod,
    clusterer: Option<Arc<dyn ClustererFactory>>,
    uncertainty: UncertaintyFunction,
}

impl fmt::Debug for SeedInitializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedInitializer")
            .field("method", &self.method)
            .field("custom_clusterer", &self.clusterer.is_some())
            .field("uncertainty", &self.uncertainty)
            .finish()
    }
}

impl SeedInitializer {
    /// Initializer using `method`.
    ///
    /// Cluster-based methods fall back to K-Means with one cluster per
    /// class present in the pool unless a clusterer is supplied.
    #[must_use]
    pub fn new(method: InitMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Edge selection with the given clusterer.
    #[must_use]
    pub fn clustered(factory: impl ClustererFactory + 'static) -> Self {
        Self::new(InitMethod::Edge).with_clusterer(factory)
    }

    /// Sets the clusterer factory.
    #[must_use]
    pub fn with_clusterer(mut self, factory: impl ClustererFactory + 'static) -> Self {
        self.clusterer = Some(Arc::new(factory));
        self
    }

    /// Sets the selection method.
    #[must_use]
    pub fn with_method(mut self, method: InitMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the uncertainty function applied to cluster memberships.
    #[must_use]
    pub fn with_uncertainty(mut self, uncertainty: UncertaintyFunction) -> Self {
        self.uncertainty = uncertainty;
        self
    }

    /// Selection method.
    #[must_use]
    pub fn method(&self) -> InitMethod {
        self.method
    }

    /// Chooses `n_initial` pool indices to label first.
    ///
    /// # Errors
    ///
    /// - [`ActiveLearningError::InvalidHyperparameter`] if `n_initial` is
    ///   below 2 or exceeds the pool.
    /// - [`ActiveLearningError::InsufficientClasses`] if `y` has one class.
    /// - Dimension and clusterer errors.
    pub fn initialize(
        &self,
        x: &Matrix<f32>,
        y: &[usize],
        n_initial: usize,
        random_state: Option<u64>,
    ) -> Result<SeedSelection> {
        if x.n_rows() != y.len() {
            return Err(ActiveLearningError::dimension_mismatch(
                "labels",
                x.n_rows(),
                y.len(),
            ));
        }
        if n_initial < 2 {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "n_initial",
                n_initial,
                "at least 2 so the seed can span two classes",
            ));
        }
        if n_initial > y.len() {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "n_initial",
                n_initial,
                &format!("at most the pool size ({})", y.len()),
            ));
        }
        let classes: BTreeSet<usize> = y.iter().copied().collect();
        if classes.len() < 2 {
            return Err(ActiveLearningError::InsufficientClasses {
                found: classes.len(),
            });
        }

        let mut rng = rng_from_state(random_state);
        let pool: Vec<usize> = (0..y.len()).collect();

        let (clusterer, mut ids) = if self.method.is_cluster_based() {
            let mut clusterer = match &self.clusterer {
                Some(factory) => factory.build(),
                None => {
                    // two centroids make every distance row [1, 0] after conversion
                    let k = classes.len().max(3).min(y.len());
                    let mut kmeans = KMeans::new(k);
                    if let Some(seed) = random_state {
                        kmeans = kmeans.with_random_state(seed);
                    }
                    Box::new(kmeans)
                }
            };
            clusterer.fit(x)?;
            let uncertainty = self.membership_uncertainty(clusterer.as_ref(), x)?;
            let ids = self.cluster_selection(&uncertainty, &pool, n_initial, &mut rng);
            (Some(clusterer), ids)
        } else {
            let ids = pool.choose_multiple(&mut rng, n_initial).copied().collect();
            (None, ids)
        };

        ensure_two_classes(&mut ids, y, &mut rng);
        tracing::debug!(
            method = self.method.name(),
            n_initial = ids.len(),
            "seed set selected"
        );
        Ok(SeedSelection { clusterer, ids })
    }

    fn membership_uncertainty(&self, clusterer: &dyn Clusterer, x: &Matrix<f32>) -> Result<Vec<f32>> {
        let mut probabilities = match clusterer.membership(x)? {
            ClusterMembership::Probabilities(p) => p,
            ClusterMembership::Distances(d) => distances_to_probabilities(&d),
        };
        if probabilities.n_rows() != x.n_rows() {
            return Err(ActiveLearningError::dimension_mismatch(
                "membership rows",
                x.n_rows(),
                probabilities.n_rows(),
            ));
        }
        clamp_zero_probabilities(&mut probabilities);
        Ok(self.uncertainty.score(&probabilities))
    }

    fn cluster_selection(
        &self,
        uncertainty: &[f32],
        pool: &[usize],
        n_initial: usize,
        rng: &mut StdRng,
    ) -> Vec<usize> {
        let edge = || -> Vec<usize> {
            rank_descending(uncertainty, pool)
                .into_iter()
                .take(n_initial)
                .collect()
        };
        let centroid = || -> Vec<usize> {
            let negated: Vec<f32> = uncertainty.iter().map(|u| -u).collect();
            rank_descending(&negated, pool)
                .into_iter()
                .take(n_initial)
                .collect()
        };

        match self.method {
            InitMethod::Edge => edge(),
            InitMethod::Centroid => centroid(),
            InitMethod::Hybrid => {
                let candidates: Vec<usize> = edge().into_iter().chain(centroid()).collect();
                (0..n_initial)
                    .map(|_| candidates[rng.gen_range(0..candidates.len())])
                    .collect()
            }
            InitMethod::Random => pool.choose_multiple(rng, n_initial).copied().collect(),
        }
    }
}

/// Replaces the last seed with a member of another class when the seed
/// holds a single class. `y` must contain at least two classes.
fn ensure_two_classes(ids: &mut [usize], y: &[usize], rng: &mut StdRng) {
    let Some(&first) = ids.first() else {
        return;
    };
    let first_class = y[first];
    if ids.iter().any(|&i| y[i] != first_class) {
        return;
    }
    let others: Vec<usize> = (0..y.len()).filter(|&i| y[i] != first_class).collect();
    if let (Some(last), Some(&replacement)) = (ids.last_mut(), others.choose(rng)) {
        *last = replacement;
    }
}
