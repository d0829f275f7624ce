//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use aprender_active::prelude::*;
//! ```

pub use crate::active_learning::{simulate_seeds, ActiveLearner, ActiveLearnerConfig};
pub use crate::cluster::KMeans;
pub use crate::error::ActiveLearningError;
pub use crate::initialization::{InitMethod, SeedInitializer};
pub use crate::metrics::{
    accuracy, area_under_learning_curve, data_utilization_rate, f1_score, geometric_mean_score,
    Average,
};
pub use crate::primitives::Matrix;
pub use crate::scoring::{MetricSpec, Scorer, ScorerRegistry};
pub use crate::selection::{QueryRequest, QueryStrategy, SelectionStrategy, StrategyRegistry};
pub use crate::traits::{Classifier, ClassifierFactory, Clusterer, ClustererFactory};
pub use crate::tree::{DecisionTreeClassifier, RandomForestClassifier};
pub use crate::uncertainty::UncertaintyFunction;
