//! Aprender Active: pool-based active learning simulation in pure Rust.
//!
//! A fully labeled dataset is treated as an unlabeled pool. The simulator
//! repeatedly queries the most informative examples, retrains a classifier
//! on everything labeled so far and tracks held-out performance against the
//! fraction of data used, so query strategies can be compared on equal,
//! reproducible terms.
//!
//! # Quick Start
//!
//! ```
//! use aprender_active::prelude::*;
//!
//! // Two well-separated groups on a line
//! let x = Matrix::from_vec(60, 1, (0..60).map(|i| i as f32).collect()).unwrap();
//! let y: Vec<usize> = (0..60).map(|i| usize::from(i >= 30)).collect();
//!
//! let strategies = StrategyRegistry::with_defaults();
//! let scorers = ScorerRegistry::with_defaults().with_dur_sweep([0.9]);
//!
//! let config = ActiveLearnerConfig::new()
//!     .with_classifier(|| Box::new(DecisionTreeClassifier::new()) as Box<dyn Classifier>)
//!     .with_selection_strategy("entropy")
//!     .with_n_initial(6)
//!     .with_increment(6)
//!     .with_max_iter(Some(4))
//!     .with_random_state(42);
//!
//! let mut learner = ActiveLearner::new(config, &strategies, &scorers).unwrap();
//! learner.fit(&x, &y).unwrap();
//!
//! let aulc = learner.evaluate_named("area_under_learning_curve", &scorers).unwrap();
//! assert!(aulc >= 0.0);
//! assert_eq!(learner.history().unwrap().len(), 4);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Matrix type
//! - [`traits`]: Classifier and clusterer collaborator traits
//! - [`uncertainty`]: Uncertainty functions over probability rows
//! - [`selection`]: Query strategies and their registry
//! - [`initialization`]: Seed-set selection (random, edge, centroid, hybrid)
//! - [`metrics`]: Classification and learning-curve metrics
//! - [`scoring`]: Named scorers and their registry
//! - [`model_selection`]: Stratified train/test splitting
//! - [`tree`]: Decision tree and Random Forest classifiers
//! - [`cluster`]: K-Means clustering
//! - [`active_learning`]: The simulation controller

pub mod active_learning;
pub mod cluster;
pub mod error;
pub mod initialization;
pub mod metrics;
pub mod model_selection;
pub mod prelude;
pub mod primitives;
pub mod registry;
pub mod scoring;
pub mod selection;
pub mod traits;
pub mod tree;
pub mod uncertainty;

pub use error::{ActiveLearningError, Result};
pub use primitives::Matrix;
pub use traits::{Classifier, ClassifierFactory, Clusterer, ClustererFactory};
