// =========================================================================
// Classification metric contracts
//
// Bounds and perfect-prediction identities for the holdout scorers used by
// the active learning loop (accuracy, macro F1, macro geometric mean).
// =========================================================================

use super::*;
use proptest::prelude::*;

fn labels(n: usize, seed: u32, offset: u32, n_classes: u32) -> Vec<usize> {
    (0..n)
        .map(|i| ((i as u32 * 7 + seed + offset) % n_classes) as usize)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Every metric stays in [0, 1] for arbitrary label vectors.
    #[test]
    fn prop_metrics_bounded(
        seed in 0..1000u32,
        offset in 0..3u32,
        n in 5..=30usize,
    ) {
        let y_true = labels(n, seed, 0, 3);
        let y_pred = labels(n, seed, offset, 3);

        for average in [Average::Macro, Average::Micro, Average::Weighted] {
            let f1 = f1_score(&y_pred, &y_true, average);
            let gm = geometric_mean_score(&y_pred, &y_true, average);
            prop_assert!((0.0..=1.0 + 1e-6).contains(&f1), "f1={} for {:?}", f1, average);
            prop_assert!((0.0..=1.0 + 1e-6).contains(&gm), "gmean={} for {:?}", gm, average);
        }
        let acc = accuracy(&y_pred, &y_true);
        prop_assert!((0.0..=1.0).contains(&acc));
    }

    /// Perfect predictions score 1.0 on every metric.
    #[test]
    fn prop_perfect_predictions_score_one(
        seed in 0..500u32,
        n in 5..=30usize,
    ) {
        let y = labels(n, seed, 0, 3);
        prop_assert!((accuracy(&y, &y) - 1.0).abs() < 1e-6);
        prop_assert!((f1_score(&y, &y, Average::Macro) - 1.0).abs() < 1e-5);
        prop_assert!((geometric_mean_score(&y, &y, Average::Macro) - 1.0).abs() < 1e-5);
    }
}
