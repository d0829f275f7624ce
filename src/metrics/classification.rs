//! Classification metrics for evaluating classifier performance.
//!
//! Provides accuracy, F1-score and the geometric mean of sensitivity and
//! specificity for multi-class classification tasks.

/// Averaging strategy for multi-class metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Average {
    /// Calculate metrics for each label, return unweighted mean.
    Macro,
    /// Calculate metrics globally by counting total TP, FP, FN.
    Micro,
    /// Weighted mean by support (number of true instances per label).
    Weighted,
}

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use aprender_active::metrics::classification::accuracy;
///
/// let y_true = vec![0, 1, 2, 0, 1, 2];
/// let y_pred = vec![0, 2, 1, 0, 0, 1];
/// let acc = accuracy(&y_pred, &y_true);
/// assert!((acc - 0.333333).abs() < 0.001);
/// ```
#[must_use]
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();

    correct as f32 / y_true.len() as f32
}

/// Per-class confusion counts.
struct ClassCounts {
    tp: Vec<usize>,
    fp: Vec<usize>,
    fn_counts: Vec<usize>,
    support: Vec<usize>,
    total: usize,
}

impl ClassCounts {
    fn new(y_pred: &[usize], y_true: &[usize]) -> Self {
        let n_classes = y_true
            .iter()
            .chain(y_pred.iter())
            .max()
            .map_or(0, |&m| m + 1);

        let mut tp = vec![0usize; n_classes];
        let mut fp = vec![0usize; n_classes];
        let mut fn_counts = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];

        for (&true_label, &pred_label) in y_true.iter().zip(y_pred.iter()) {
            support[true_label] += 1;

            if true_label == pred_label {
                tp[true_label] += 1;
            } else {
                fp[pred_label] += 1;
                fn_counts[true_label] += 1;
            }
        }

        Self {
            tp,
            fp,
            fn_counts,
            support,
            total: y_true.len(),
        }
    }

    fn n_classes(&self) -> usize {
        self.tp.len()
    }

    /// Classes that occur in either the truth or the predictions.
    fn present(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.n_classes())
            .filter(|&i| self.support[i] + self.fp[i] > 0)
    }

    fn sensitivity(&self, class: usize) -> f32 {
        ratio(self.tp[class], self.tp[class] + self.fn_counts[class])
    }

    fn specificity(&self, class: usize) -> f32 {
        let negatives = self.total - self.support[class];
        let true_negatives = negatives - self.fp[class];
        ratio(true_negatives, negatives)
    }

    fn f1(&self, class: usize) -> f32 {
        class_f1(self.tp[class], self.fp[class], self.fn_counts[class])
    }

    /// Averages a per-class quantity over the classes that occur.
    fn average(&self, average: Average, per_class: impl Fn(usize) -> f32) -> f32 {
        match average {
            Average::Macro | Average::Micro => {
                let values: Vec<f32> = self.present().map(per_class).collect();
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f32>() / values.len() as f32
                }
            }
            Average::Weighted => {
                if self.total == 0 {
                    return 0.0;
                }
                self.present()
                    .map(|i| per_class(i) * self.support[i] as f32 / self.total as f32)
                    .sum()
            }
        }
    }
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

/// Compute F1 score from precision and recall.
fn f1_from_prec_rec(precision: f32, recall: f32) -> f32 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Compute F1 score for a single class.
fn class_f1(tp: usize, fp: usize, fn_count: usize) -> f32 {
    f1_from_prec_rec(ratio(tp, tp + fp), ratio(tp, tp + fn_count))
}

/// Compute F1 score (harmonic mean of precision and recall).
///
/// Classes absent from both `y_true` and `y_pred` are ignored when
/// averaging, so sparse label spaces do not drag the macro mean down.
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use aprender_active::metrics::classification::{f1_score, Average};
///
/// let y_true = vec![0, 1, 2, 0, 1, 2];
/// let y_pred = vec![0, 2, 1, 0, 0, 1];
/// let f1 = f1_score(&y_pred, &y_true, Average::Macro);
/// assert!(f1 >= 0.0 && f1 <= 1.0);
/// ```
#[must_use]
pub fn f1_score(y_pred: &[usize], y_true: &[usize], average: Average) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let counts = ClassCounts::new(y_pred, y_true);
    match average {
        Average::Micro => {
            let total_tp: usize = counts.tp.iter().sum();
            let total_fp: usize = counts.fp.iter().sum();
            let total_fn: usize = counts.fn_counts.iter().sum();
            class_f1(total_tp, total_fp, total_fn)
        }
        Average::Macro | Average::Weighted => counts.average(average, |i| counts.f1(i)),
    }
}

/// Compute the geometric mean score.
///
/// For each class the geometric mean of its sensitivity (recall) and
/// specificity is computed, one-vs-rest, then averaged. `Micro` pools the
/// per-class sensitivities and returns their geometric mean, the
/// multi-class definition used for imbalanced learning.
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use aprender_active::metrics::classification::{geometric_mean_score, Average};
///
/// let y_true = vec![0, 0, 1, 1];
/// let y_pred = vec![0, 0, 1, 1];
/// assert!((geometric_mean_score(&y_pred, &y_true, Average::Macro) - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn geometric_mean_score(y_pred: &[usize], y_true: &[usize], average: Average) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let counts = ClassCounts::new(y_pred, y_true);
    match average {
        Average::Micro => {
            let sensitivities: Vec<f32> = (0..counts.n_classes())
                .filter(|&i| counts.support[i] > 0)
                .map(|i| counts.sensitivity(i))
                .collect();
            if sensitivities.is_empty() {
                return 0.0;
            }
            let product: f32 = sensitivities.iter().product();
            product.powf(1.0 / sensitivities.len() as f32)
        }
        Average::Macro | Average::Weighted => counts.average(average, |i| {
            (counts.sensitivity(i) * counts.specificity(i)).sqrt()
        }),
    }
}


#[cfg(test)]
#[path = "tests_classification_contract.rs"]
mod tests_classification_contract;
