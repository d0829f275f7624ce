//! Learning-curve metrics for active learning runs.
//!
//! Both metrics consume the per-iteration history of a simulation: the
//! test score after each round and the fraction of the pool labeled at
//! that point.

/// Fraction of the pool needed to reach `threshold` of the best score.
///
/// Returns the data-utilization value of the first iteration whose score
/// is at least `threshold * max(test_scores)`, or `None` if the history is
/// empty or no iteration qualifies.
///
/// # Panics
///
/// Panics if the two sequences have different lengths.
///
/// # Examples
///
/// ```
/// use aprender_active::metrics::learning_curve::data_utilization_rate;
///
/// let scores = [0.5, 0.6, 0.9, 0.95];
/// let utilization = [0.2, 0.4, 0.6, 0.8];
/// // target = 0.9 * 0.95 = 0.855, first reached at 0.6
/// assert_eq!(data_utilization_rate(&scores, &utilization, 0.9), Some(0.6));
/// ```
#[must_use]
pub fn data_utilization_rate(
    test_scores: &[f32],
    data_utilization: &[f32],
    threshold: f32,
) -> Option<f32> {
    assert_eq!(
        test_scores.len(),
        data_utilization.len(),
        "Score and utilization sequences must have same length"
    );

    let best = test_scores.iter().copied().reduce(f32::max)?;
    let target = threshold * best;
    test_scores
        .iter()
        .position(|&score| score >= target)
        .map(|i| data_utilization[i])
}

/// Trapezoidal area under the score-versus-utilization curve.
///
/// A history with fewer than two points has zero area.
///
/// # Panics
///
/// Panics if the two sequences have different lengths.
///
/// # Examples
///
/// ```
/// use aprender_active::metrics::learning_curve::area_under_learning_curve;
///
/// let area = area_under_learning_curve(&[0.5, 1.0], &[0.0, 1.0]);
/// assert!((area - 0.75).abs() < 1e-6);
/// ```
#[must_use]
pub fn area_under_learning_curve(test_scores: &[f32], data_utilization: &[f32]) -> f32 {
    assert_eq!(
        test_scores.len(),
        data_utilization.len(),
        "Score and utilization sequences must have same length"
    );

    data_utilization
        .windows(2)
        .zip(test_scores.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
        .sum()
}
