//! K-Means clustering algorithm.
//!
//! Uses Lloyd's algorithm with farthest-point (deterministic k-means++)
//! initialization.

use crate::error::{ActiveLearningError, Result};
use crate::primitives::Matrix;
use crate::traits::{ClusterMembership, Clusterer};
use serde::{Deserialize, Serialize};

/// K-Means clustering algorithm.
///
/// # Algorithm
///
/// 1. Seed the first centroid from `random_state`, then repeatedly add the
///    sample farthest from every centroid chosen so far
/// 2. Assign each sample to nearest centroid
/// 3. Update centroids as mean of assigned samples
/// 4. Repeat until convergence or max iterations
///
/// # Examples
///
/// ```
/// use aprender_active::cluster::KMeans;
/// use aprender_active::traits::Clusterer;
/// use aprender_active::primitives::Matrix;
///
/// let data = Matrix::from_vec(6, 2, vec![
///     1.0, 2.0,
///     1.5, 1.8,
///     5.0, 8.0,
///     8.0, 8.0,
///     1.0, 0.6,
///     9.0, 11.0,
/// ]).unwrap();
///
/// let mut kmeans = KMeans::new(2);
/// kmeans.fit(&data).unwrap();
///
/// let distances = kmeans.transform(&data).unwrap();
/// assert_eq!(distances.shape(), (6, 2));
/// ```
///
/// # Performance
///
/// - Time complexity: O(nkdi) where n=samples, k=clusters, d=features, i=iterations
/// - Space complexity: O(nk)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    n_clusters: usize,
    max_iter: usize,
    tol: f32,
    random_state: Option<u64>,
    centroids: Option<Matrix<f32>>,
    labels: Option<Vec<usize>>,
    inertia: f32,
    n_iter: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(8)
    }
}

impl KMeans {
    /// Creates a new K-Means with the specified number of clusters.
    #[must_use]
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 300,
            tol: 1e-4,
            random_state: None,
            centroids: None,
            labels: None,
            inertia: 0.0,
            n_iter: 0,
        }
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Number of clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Cluster centroids, once fitted.
    #[must_use]
    pub fn centroids(&self) -> Option<&Matrix<f32>> {
        self.centroids.as_ref()
    }

    /// Cluster of every training sample, once fitted.
    #[must_use]
    pub fn labels(&self) -> Option<&[usize]> {
        self.labels.as_deref()
    }

    /// Returns the inertia (within-cluster sum of squares).
    #[must_use]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Returns the number of iterations run.
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.centroids.is_some()
    }

    fn fit_centroids(&mut self, x: &Matrix<f32>) -> Result<()> {
        let n_samples = x.n_rows();
        if self.n_clusters == 0 {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "n_clusters",
                0,
                "at least 1 cluster",
            ));
        }
        if n_samples == 0 {
            return Err(ActiveLearningError::EmptyInput(
                "cannot cluster zero samples".to_string(),
            ));
        }
        if n_samples < self.n_clusters {
            return Err(ActiveLearningError::invalid_hyperparameter(
                "n_clusters",
                self.n_clusters,
                &format!("at most the number of samples ({n_samples})"),
            ));
        }

        let mut centroids = self.farthest_point_init(x);
        let mut labels = self.assign_labels(x, &centroids);
        self.n_iter = 0;

        for iter in 0..self.max_iter {
            let new_centroids = self.update_centroids(x, &labels, &centroids);
            let converged = self.centroids_converged(&centroids, &new_centroids);
            centroids = new_centroids;
            labels = self.assign_labels(x, &centroids);
            self.n_iter = iter + 1;
            if converged {
                break;
            }
        }

        self.inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &k)| x.row_distance_squared(i, centroids.row(k)))
            .sum();
        self.labels = Some(labels);
        self.centroids = Some(centroids);
        Ok(())
    }

    /// Euclidean distance from every sample to every centroid.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the feature count
    /// differs from the training data.
    pub fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let centroids = self.fitted_centroids(x)?;
        let mut distances = Matrix::zeros(x.n_rows(), self.n_clusters);
        for i in 0..x.n_rows() {
            for k in 0..self.n_clusters {
                distances.set(i, k, x.row_distance_squared(i, centroids.row(k)).sqrt());
            }
        }
        Ok(distances)
    }

    /// Nearest cluster of every sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the feature count
    /// differs from the training data.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        let centroids = self.fitted_centroids(x)?;
        Ok(self.assign_labels(x, centroids))
    }

    fn fitted_centroids(&self, x: &Matrix<f32>) -> Result<&Matrix<f32>> {
        let centroids = self
            .centroids
            .as_ref()
            .ok_or(ActiveLearningError::NotFitted { what: "KMeans" })?;
        if x.n_cols() != centroids.n_cols() {
            return Err(ActiveLearningError::dimension_mismatch(
                "features",
                centroids.n_cols(),
                x.n_cols(),
            ));
        }
        Ok(centroids)
    }

    /// Picks the first centroid from the seed, then the farthest samples.
    fn farthest_point_init(&self, x: &Matrix<f32>) -> Matrix<f32> {
        let n_samples = x.n_rows();
        let seed = self.random_state.unwrap_or(42);
        let mut chosen = vec![(seed % n_samples as u64) as usize];
        let mut min_distances: Vec<f32> = (0..n_samples)
            .map(|i| x.row_distance_squared(i, x.row(chosen[0])))
            .collect();

        while chosen.len() < self.n_clusters {
            let mut max_idx = 0;
            for (i, &dist) in min_distances.iter().enumerate() {
                if dist > min_distances[max_idx] {
                    max_idx = i;
                }
            }
            chosen.push(max_idx);
            for (i, min_dist) in min_distances.iter_mut().enumerate() {
                *min_dist = min_dist.min(x.row_distance_squared(i, x.row(max_idx)));
            }
        }

        x.select_rows(&chosen)
    }

    /// Assigns each sample to the nearest centroid.
    fn assign_labels(&self, x: &Matrix<f32>, centroids: &Matrix<f32>) -> Vec<usize> {
        (0..x.n_rows())
            .map(|i| {
                let mut min_dist = f32::INFINITY;
                let mut min_cluster = 0;
                for k in 0..self.n_clusters {
                    let dist = x.row_distance_squared(i, centroids.row(k));
                    if dist < min_dist {
                        min_dist = dist;
                        min_cluster = k;
                    }
                }
                min_cluster
            })
            .collect()
    }

    /// Updates centroids as the mean of assigned samples; an empty cluster
    /// keeps its previous centroid.
    fn update_centroids(
        &self,
        x: &Matrix<f32>,
        labels: &[usize],
        previous: &Matrix<f32>,
    ) -> Matrix<f32> {
        let n_features = x.n_cols();
        let mut sums = Matrix::zeros(self.n_clusters, n_features);
        let mut counts = vec![0usize; self.n_clusters];

        for (i, &label) in labels.iter().enumerate() {
            counts[label] += 1;
            for (j, &v) in x.row(i).iter().enumerate() {
                sums.set(label, j, sums.get(label, j) + v);
            }
        }

        for (k, &count) in counts.iter().enumerate() {
            for j in 0..n_features {
                let value = if count > 0 {
                    sums.get(k, j) / count as f32
                } else {
                    previous.get(k, j)
                };
                sums.set(k, j, value);
            }
        }
        sums
    }

    /// Checks if centroids have converged.
    fn centroids_converged(&self, old: &Matrix<f32>, new: &Matrix<f32>) -> bool {
        (0..old.n_rows()).all(|k| new.row_distance_squared(k, old.row(k)) <= self.tol * self.tol)
    }
}

impl Clusterer for KMeans {
    /// Fits the model to data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty, has fewer samples than
    /// clusters, or `n_clusters` is zero.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        self.fit_centroids(x)
    }

    fn membership(&self, x: &Matrix<f32>) -> Result<ClusterMembership> {
        self.transform(x).map(ClusterMembership::Distances)
    }
}
