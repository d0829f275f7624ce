//! Uncertainty functions over class-probability distributions.
//!
//! Each function maps one probability row to a scalar where larger means
//! "more informative to label". Exact zeros are clamped to
//! [`PROBABILITY_EPSILON`] before scoring so logarithms and ratios stay
//! finite.

use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};

/// Value substituted for exact-zero probabilities.
pub const PROBABILITY_EPSILON: f32 = 1e-10;

/// Replaces every exact-zero probability with [`PROBABILITY_EPSILON`].
///
/// # Examples
///
/// ```
/// use aprender_active::primitives::Matrix;
/// use aprender_active::uncertainty::{clamp_zero_probabilities, PROBABILITY_EPSILON};
///
/// let mut p = Matrix::from_vec(1, 2, vec![1.0, 0.0]).unwrap();
/// clamp_zero_probabilities(&mut p);
/// assert_eq!(p.get(0, 1), PROBABILITY_EPSILON);
/// ```
pub fn clamp_zero_probabilities(probabilities: &mut Matrix<f32>) {
    for p in probabilities.as_mut_slice() {
        if *p == 0.0 {
            *p = PROBABILITY_EPSILON;
        }
    }
}

fn clamped(p: f32) -> f32 {
    if p == 0.0 {
        PROBABILITY_EPSILON
    } else {
        p
    }
}

/// Shannon entropy `-Σ p ln p` of one probability row.
#[must_use]
pub fn entropy(probabilities: &[f32]) -> f32 {
    probabilities
        .iter()
        .map(|&p| {
            let p = clamped(p);
            -p * p.ln()
        })
        .sum()
}

/// Breaking-ties uncertainty: the negated gap between the two largest
/// probabilities. A single-class row has a gap equal to its only value.
#[must_use]
pub fn breaking_ties(probabilities: &[f32]) -> f32 {
    let mut first = f32::NEG_INFINITY;
    let mut second = 0.0_f32;
    let mut seen = 0usize;
    for &p in probabilities {
        let p = clamped(p);
        if p > first {
            if seen > 0 {
                second = first;
            }
            first = p;
        } else if seen == 1 || p > second {
            second = p;
        }
        seen += 1;
    }
    if seen == 0 {
        return 0.0;
    }
    -(first - second)
}

/// Least-confidence uncertainty: `1 - max p`.
#[must_use]
pub fn least_confident(probabilities: &[f32]) -> f32 {
    let max = probabilities
        .iter()
        .map(|&p| clamped(p))
        .fold(0.0_f32, f32::max);
    1.0 - max
}

/// Named uncertainty function applied row-wise to a probability matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UncertaintyFunction {
    /// Shannon entropy.
    Entropy,
    /// Negated margin between the two most likely classes.
    BreakingTies,
    /// One minus the top class probability.
    LeastConfident,
}

impl UncertaintyFunction {
    /// Registry name of the function.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Entropy => "entropy",
            Self::BreakingTies => "breaking_ties",
            Self::LeastConfident => "least_confident",
        }
    }

    /// Scores a single probability row.
    #[must_use]
    pub fn score_row(self, probabilities: &[f32]) -> f32 {
        match self {
            Self::Entropy => entropy(probabilities),
            Self::BreakingTies => breaking_ties(probabilities),
            Self::LeastConfident => least_confident(probabilities),
        }
    }

    /// Scores every row of a probability matrix.
    #[must_use]
    pub fn score(self, probabilities: &Matrix<f32>) -> Vec<f32> {
        probabilities.rows().map(|row| self.score_row(row)).collect()
    }
}

impl Default for UncertaintyFunction {
    fn default() -> Self {
        Self::Entropy
    }
}

/// Converts cluster distances into pseudo-probabilities.
///
/// Each distance becomes `1 - d / max(row)` so the closest centroid gets
/// the largest weight, then rows are normalized to sum to one. Rows with no
/// spread (all distances equal, or a single cluster) become uniform.
///
/// # Examples
///
/// ```
/// use aprender_active::primitives::Matrix;
/// use aprender_active::uncertainty::distances_to_probabilities;
///
/// let d = Matrix::from_vec(1, 3, vec![1.0, 2.0, 4.0]).unwrap();
/// let p = distances_to_probabilities(&d);
/// assert!(p.get(0, 0) > p.get(0, 1));
/// assert!((p.row(0).iter().sum::<f32>() - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn distances_to_probabilities(distances: &Matrix<f32>) -> Matrix<f32> {
    let (n_rows, n_cols) = distances.shape();
    let mut out = Matrix::zeros(n_rows, n_cols);
    if n_cols == 0 {
        return out;
    }
    let uniform = 1.0 / n_cols as f32;

    for (i, row) in distances.rows().enumerate() {
        let max = row.iter().copied().fold(0.0_f32, f32::max);
        let inverted: Vec<f32> = if max > 0.0 {
            row.iter().map(|d| 1.0 - d / max).collect()
        } else {
            vec![0.0; n_cols]
        };
        let total: f32 = inverted.iter().sum();
        for (j, w) in inverted.iter().enumerate() {
            let p = if total > 0.0 { w / total } else { uniform };
            out.set(i, j, p);
        }
    }
    out
}
