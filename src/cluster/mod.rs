//! Clustering algorithms.
//!
//! Clusterers are used to pick the seed set of an active learning run
//! (see [`crate::initialization`]).

mod kmeans;

pub use kmeans::KMeans;
