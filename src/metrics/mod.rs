//! Evaluation metrics for active learning runs.
//!
//! Includes classification metrics (accuracy, F1-score, geometric mean of
//! sensitivity and specificity) used to score each round's classifier on
//! held-out data, and learning-curve metrics (data utilization rate, area
//! under the learning curve) that summarize a whole run.

pub mod classification;
pub mod learning_curve;

pub use classification::{accuracy, f1_score, geometric_mean_score, Average};
pub use learning_curve::{area_under_learning_curve, data_utilization_rate};
