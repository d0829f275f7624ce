//! Per-iteration bookkeeping of a simulation run.

use crate::traits::Classifier;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one simulation round.
///
/// Indices refer to positions in the pool, i.e. the data left after the
/// held-out split (see [`ActiveLearner::pool_indices`](super::ActiveLearner::pool_indices)).
#[derive(Debug, Clone, Serialize)]
pub struct IterationRecord {
    /// Zero-based round number; round 0 labels the seed set.
    pub iteration: usize,
    /// Labeled examples after this round.
    pub n_labeled: usize,
    /// `n_labeled` divided by the pool size.
    pub labeled_fraction: f32,
    /// Pool indices labeled in this round, in selection order.
    pub selected: Vec<usize>,
    /// Held-out score, when scores are computed and saved.
    pub test_score: Option<f32>,
    /// Classifier trained in this round, when snapshots are saved.
    #[serde(skip)]
    pub classifier: Option<Arc<dyn Classifier>>,
}

/// Append-only sequence of iteration records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LearningHistory {
    records: Vec<IterationRecord>,
}

impl LearningHistory {
    pub(crate) fn push(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    /// All records in iteration order.
    #[must_use]
    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    /// Number of completed iterations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no iteration has completed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    /// Labeled count after every iteration.
    #[must_use]
    pub fn labeled_counts(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.n_labeled).collect()
    }

    /// Labeled fraction after every iteration.
    #[must_use]
    pub fn data_utilization(&self) -> Vec<f32> {
        self.records.iter().map(|r| r.labeled_fraction).collect()
    }

    /// Saved test scores, skipping unscored iterations.
    #[must_use]
    pub fn test_scores(&self) -> Vec<f32> {
        self.records.iter().filter_map(|r| r.test_score).collect()
    }

    /// Parallel `(test_scores, data_utilization)` sequences over scored
    /// iterations, ready for learning-curve scorers.
    #[must_use]
    pub fn learning_curve(&self) -> (Vec<f32>, Vec<f32>) {
        self.records
            .iter()
            .filter_map(|r| r.test_score.map(|s| (s, r.labeled_fraction)))
            .unzip()
    }

    /// Saved classifier snapshots with their iteration.
    pub fn classifiers(&self) -> impl Iterator<Item = (usize, &Arc<dyn Classifier>)> + '_ {
        self.records
            .iter()
            .filter_map(|r| r.classifier.as_ref().map(|c| (r.iteration, c)))
    }
}

/// Highest-scoring classifier seen so far.
#[derive(Debug, Clone, Serialize)]
pub struct BestModel {
    /// Its held-out score.
    pub score: f32,
    /// Iteration that produced it.
    pub iteration: usize,
    /// The trained classifier.
    #[serde(skip)]
    pub classifier: Arc<dyn Classifier>,
}

impl BestModel {
    /// Replaces `best` when `score` is strictly higher, or when nothing has
    /// been recorded yet. NaN scores never win.
    pub(crate) fn offer(
        best: &mut Option<BestModel>,
        score: f32,
        iteration: usize,
        classifier: &Arc<dyn Classifier>,
    ) -> bool {
        if score.is_nan() || best.as_ref().is_some_and(|b| score <= b.score) {
            return false;
        }
        *best = Some(BestModel {
            score,
            iteration,
            classifier: Arc::clone(classifier),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DecisionTreeClassifier;

    fn record(iteration: usize, n_labeled: usize, score: Option<f32>) -> IterationRecord {
        IterationRecord {
            iteration,
            n_labeled,
            labeled_fraction: n_labeled as f32 / 10.0,
            selected: vec![iteration],
            test_score: score,
            classifier: None,
        }
    }

    #[test]
    fn test_learning_curve_skips_unscored() {
        let mut history = LearningHistory::default();
        history.push(record(0, 2, Some(0.5)));
        history.push(record(1, 4, None));
        history.push(record(2, 6, Some(0.7)));

        assert_eq!(history.len(), 3);
        assert_eq!(history.labeled_counts(), vec![2, 4, 6]);
        assert_eq!(history.test_scores(), vec![0.5, 0.7]);
        let (scores, utilization) = history.learning_curve();
        assert_eq!(scores, vec![0.5, 0.7]);
        assert_eq!(utilization, vec![0.2, 0.6]);
        assert_eq!(history.classifiers().count(), 0);
    }

    #[test]
    fn test_best_model_strictly_greater_wins() {
        let model: Arc<dyn Classifier> = Arc::new(DecisionTreeClassifier::new());
        let mut best = None;
        assert!(BestModel::offer(&mut best, 0.0, 0, &model));
        assert!(BestModel::offer(&mut best, 0.6, 1, &model));
        assert!(!BestModel::offer(&mut best, 0.6, 2, &model));
        assert!(!BestModel::offer(&mut best, f32::NAN, 3, &model));
        assert!(!BestModel::offer(&mut best, 0.5, 4, &model));

        let best = best.expect("recorded");
        assert_eq!(best.iteration, 1);
        assert!((best.score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_history_serializes_without_snapshots() {
        let mut history = LearningHistory::default();
        let mut r = record(0, 2, Some(0.5));
        r.classifier = Some(Arc::new(DecisionTreeClassifier::new()));
        history.push(r);

        let json = serde_json::to_string(&history).expect("serializes");
        assert!(json.contains("\"n_labeled\":2"));
        assert!(!json.contains("classifier"));
    }
}
