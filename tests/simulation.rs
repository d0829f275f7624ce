//! End-to-end tests of the active learning simulation.

use aprender_active::prelude::*;
use aprender_active::active_learning::IterationRecord;
use std::collections::HashSet;

/// Two separable groups of `n_per_class` points each on a small grid.
fn two_blobs(n_per_class: usize) -> (Matrix<f32>, Vec<usize>) {
    let mut data = Vec::with_capacity(n_per_class * 4);
    let mut labels = Vec::with_capacity(n_per_class * 2);
    for class in 0..2 {
        let base = class as f32 * 5.0;
        for i in 0..n_per_class {
            data.push(base + (i % 5) as f32 * 0.3);
            data.push(base + (i / 5) as f32 * 0.3);
            labels.push(class);
        }
    }
    let x = Matrix::from_vec(n_per_class * 2, 2, data).expect("blob matrix");
    (x, labels)
}

fn tree() -> Box<dyn Classifier> {
    Box::new(DecisionTreeClassifier::new())
}

fn small_forest() -> Box<dyn Classifier> {
    Box::new(RandomForestClassifier::new(10).with_random_state(7))
}

fn registries() -> (StrategyRegistry, ScorerRegistry) {
    (
        StrategyRegistry::with_defaults(),
        ScorerRegistry::with_defaults().with_dur_sweep((0..8).map(|i| 0.60 + 0.05 * i as f32)),
    )
}

fn run(config: ActiveLearnerConfig, x: &Matrix<f32>, y: &[usize]) -> ActiveLearner {
    let (strategies, scorers) = registries();
    let mut learner = ActiveLearner::new(config, &strategies, &scorers).expect("valid config");
    learner.fit(x, y).expect("simulation succeeds");
    learner
}

fn batches(records: &[IterationRecord]) -> Vec<Vec<usize>> {
    records.iter().map(|r| r.selected.clone()).collect()
}

#[test]
fn test_pool_exhaustion_stops_before_round_cap() {
    let (x, y) = two_blobs(10);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_auto_load(false)
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(Some(5))
        .with_random_state(0);
    let learner = run(config, &x, &y);

    let history = learner.history().expect("fitted");
    assert_eq!(history.len(), 5);
    assert_eq!(history.labeled_counts(), vec![4, 8, 12, 16, 20]);
    assert!(learner.labeled_mask().expect("fitted").iter().all(|&l| l));
}

#[test]
fn test_round_cap_stops_partially_labeled_pool() {
    let (x, y) = two_blobs(10);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_auto_load(false)
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(Some(4))
        .with_random_state(0);
    let learner = run(config, &x, &y);

    let history = learner.history().expect("fitted");
    assert_eq!(history.len(), 4);
    assert_eq!(history.last().expect("records").n_labeled, 16);
    let labeled = learner.labeled_mask().expect("fitted");
    assert_eq!(labeled.iter().filter(|&&l| l).count(), 16);
}

#[test]
fn test_unbounded_run_labels_whole_pool_with_capped_last_batch() {
    let (x, y) = two_blobs(15);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_auto_load(false)
        .with_n_initial(5)
        .with_increment(7)
        .with_max_iter(None)
        .with_random_state(3);
    let learner = run(config, &x, &y);

    let history = learner.history().expect("fitted");
    assert_eq!(history.labeled_counts(), vec![5, 12, 19, 26, 30]);
    assert_eq!(history.last().expect("records").selected.len(), 4);
}

#[test]
fn test_labeled_count_strictly_increases_and_batches_are_disjoint() {
    let (x, y) = two_blobs(25);
    let config = ActiveLearnerConfig::new()
        .with_classifier(small_forest)
        .with_selection_strategy("breaking_ties")
        .with_n_initial(6)
        .with_increment(5)
        .with_max_iter(Some(6))
        .with_random_state(11);
    let learner = run(config, &x, &y);

    let history = learner.history().expect("fitted");
    let counts = history.labeled_counts();
    assert!(counts.windows(2).all(|w| w[0] < w[1]), "{counts:?}");

    let mut seen = HashSet::new();
    for record in history.records() {
        for &id in &record.selected {
            assert!(seen.insert(id), "index {id} selected twice");
        }
    }
}

#[test]
fn test_seed_set_spans_two_classes() {
    let (x, y) = two_blobs(20);
    for seed in 0..5 {
        let config = ActiveLearnerConfig::new()
            .with_classifier(tree)
            .with_n_initial(2)
            .with_increment(2)
            .with_max_iter(Some(1))
            .with_random_state(seed);
        let learner = run(config, &x, &y);

        let pool = learner.pool_indices().expect("fitted");
        let first = &learner.history().expect("fitted").records()[0];
        let classes: HashSet<usize> = first.selected.iter().map(|&p| y[pool[p]]).collect();
        assert_eq!(classes.len(), 2, "random_state={seed}");
    }
}

#[test]
fn test_random_strategy_is_reproducible() {
    let (x, y) = two_blobs(20);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_selection_strategy("random")
        .with_n_initial(4)
        .with_increment(3)
        .with_max_iter(Some(6))
        .with_random_state(0);

    let a = run(config.clone(), &x, &y);
    let b = run(config, &x, &y);
    assert_eq!(
        batches(a.history().expect("fitted").records()),
        batches(b.history().expect("fitted").records())
    );
    assert_eq!(a.labeled_mask(), b.labeled_mask());
}

#[test]
fn test_seeded_default_forest_runs_are_identical() {
    let (x, y) = two_blobs(15);
    let config = ActiveLearnerConfig::new()
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(Some(3))
        .with_random_state(5);

    let a = run(config.clone(), &x, &y);
    let b = run(config, &x, &y);
    assert_eq!(a.labeled_mask(), b.labeled_mask());
    assert_eq!(
        a.best().map(|m| m.iteration),
        b.best().map(|m| m.iteration)
    );
    assert_eq!(
        a.history().expect("fitted").test_scores(),
        b.history().expect("fitted").test_scores()
    );
    assert_eq!(a.test_indices(), b.test_indices());
}

#[test]
fn test_held_out_rows_never_enter_the_pool() {
    let (x, y) = two_blobs(20);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(None)
        .with_test_size(0.25)
        .with_random_state(2);
    let learner = run(config, &x, &y);

    let pool: HashSet<usize> = learner.pool_indices().expect("fitted").iter().copied().collect();
    let test: HashSet<usize> = learner.test_indices().expect("held out").iter().copied().collect();
    assert!(pool.is_disjoint(&test));
    assert_eq!(pool.len() + test.len(), 40);
    assert_eq!(test.len(), 10);
    assert_eq!(learner.labeled_mask().expect("fitted").len(), 30);
}

#[test]
fn test_best_score_dominates_every_iteration() {
    let (x, y) = two_blobs(25);
    let config = ActiveLearnerConfig::new()
        .with_classifier(small_forest)
        .with_evaluation_metric("f1_macro")
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(Some(8))
        .with_random_state(9);
    let learner = run(config, &x, &y);

    let best = learner.best().expect("scores recorded");
    let history = learner.history().expect("fitted");
    for record in history.records() {
        let score = record.test_score.expect("scores saved by default");
        assert!(best.score >= score);
    }
    assert_eq!(
        history.records()[best.iteration].test_score,
        Some(best.score)
    );
    // first maximum wins
    let first_max = history
        .records()
        .iter()
        .position(|r| r.test_score == Some(best.score))
        .expect("best is recorded");
    assert_eq!(first_max, best.iteration);
}

#[test]
fn test_data_utilization_within_unit_interval_and_non_decreasing() {
    let (x, y) = two_blobs(20);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_n_initial(3)
        .with_increment(5)
        .with_max_iter(None)
        .with_random_state(4);
    let learner = run(config, &x, &y);

    let utilization = learner.history().expect("fitted").data_utilization();
    assert!(utilization.iter().all(|&u| u > 0.0 && u <= 1.0));
    assert!(utilization.windows(2).all(|w| w[0] <= w[1]));
    assert!((utilization.last().copied().expect("records") - 1.0).abs() < 1e-6);
}

#[test]
fn test_without_auto_load_predict_uses_last_classifier() {
    let (x, y) = two_blobs(15);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_auto_load(false)
        .with_save_classifiers(true)
        .with_n_initial(4)
        .with_increment(2)
        .with_max_iter(Some(5))
        .with_random_state(1);
    let learner = run(config, &x, &y);

    assert!(learner.best().is_none());
    assert!(learner.test_indices().is_none());
    let history = learner.history().expect("fitted");
    assert!(history.test_scores().is_empty());

    let last = history
        .last()
        .and_then(|r| r.classifier.as_ref())
        .expect("snapshot saved");
    assert_eq!(
        learner.predict(&x).expect("fitted"),
        last.predict(&x).expect("snapshot fitted")
    );
}

#[test]
fn test_load_best_classifier_rescores_snapshots() {
    let (x, y) = two_blobs(20);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_save_classifiers(true)
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(Some(5))
        .with_random_state(6);
    let (strategies, scorers) = registries();
    let mut learner = ActiveLearner::new(config, &strategies, &scorers).expect("valid config");
    learner.fit(&x, &y).expect("simulation succeeds");

    let iteration = learner.load_best_classifier(&x, &y).expect("snapshots saved");
    let history = learner.history().expect("fitted");
    assert_eq!(history.classifiers().count(), 5);
    assert!(iteration < 5);

    let chosen = history.records()[iteration]
        .classifier
        .as_ref()
        .expect("snapshot saved");
    let chosen_accuracy = accuracy(&chosen.predict(&x).expect("fitted"), &y);
    for (_, snapshot) in history.classifiers() {
        let acc = accuracy(&snapshot.predict(&x).expect("fitted"), &y);
        assert!(chosen_accuracy >= acc);
    }
    assert_eq!(
        learner.predict(&x).expect("fitted"),
        chosen.predict(&x).expect("fitted")
    );
}

#[test]
fn test_load_best_classifier_requires_snapshots() {
    let (x, y) = two_blobs(10);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(Some(2))
        .with_random_state(0);
    let (strategies, scorers) = registries();
    let mut learner = ActiveLearner::new(config, &strategies, &scorers).expect("valid config");
    learner.fit(&x, &y).expect("simulation succeeds");

    let err = learner.load_best_classifier(&x, &y).unwrap_err();
    assert!(matches!(err, ActiveLearningError::NoSavedClassifiers));
    assert!(err.is_configuration_error());
}

#[test]
fn test_learning_curve_scorers_evaluate_history() {
    let (x, y) = two_blobs(25);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_n_initial(4)
        .with_increment(6)
        .with_max_iter(None)
        .with_random_state(8);
    let (strategies, scorers) = registries();
    let mut learner = ActiveLearner::new(config, &strategies, &scorers).expect("valid config");
    learner.fit(&x, &y).expect("simulation succeeds");

    let (scores, utilization) = learner.history().expect("fitted").learning_curve();
    let aulc = learner
        .evaluate_named("area_under_learning_curve", &scorers)
        .expect("curve recorded");
    assert!((aulc - area_under_learning_curve(&scores, &utilization)).abs() < 1e-6);

    let dur = learner.evaluate_named("dur_90", &scorers).expect("curve recorded");
    assert_eq!(Some(dur), data_utilization_rate(&scores, &utilization, 0.9));

    let acc = learner.evaluate_named("accuracy", &scorers).expect("held out kept");
    assert!((0.0..=1.0).contains(&acc));
}

#[test]
fn test_learning_curve_scorer_needs_saved_scores() {
    let (x, y) = two_blobs(10);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_save_test_scores(false)
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(Some(2))
        .with_random_state(0);
    let (strategies, scorers) = registries();
    let mut learner = ActiveLearner::new(config, &strategies, &scorers).expect("valid config");
    learner.fit(&x, &y).expect("simulation succeeds");

    assert!(learner.history().expect("fitted").test_scores().is_empty());
    // the best model is still tracked from unsaved scores
    assert!(learner.best().is_some());
    assert!(learner
        .evaluate_named("area_under_learning_curve", &scorers)
        .is_err());
}

#[test]
fn test_dur_uses_threshold_relative_to_best_score() {
    let scores = [0.5, 0.6, 0.9, 0.95];
    let utilization = [0.2, 0.4, 0.6, 0.8];
    // 0.9 * 0.95 = 0.855 is first reached at utilization 0.6
    assert_eq!(data_utilization_rate(&scores, &utilization, 0.9), Some(0.6));
}

#[test]
fn test_zero_probabilities_give_finite_uncertainty() {
    let probabilities = Matrix::from_vec(3, 3, vec![
        1.0, 0.0, 0.0, //
        0.5, 0.5, 0.0, //
        0.2, 0.3, 0.5,
    ])
    .expect("3x3 matrix");
    for function in [
        UncertaintyFunction::Entropy,
        UncertaintyFunction::BreakingTies,
        UncertaintyFunction::LeastConfident,
    ] {
        assert!(function.score(&probabilities).iter().all(|s| s.is_finite()));
    }

    let strategies = StrategyRegistry::with_defaults();
    let ids = [10, 11, 12];
    for name in ["entropy", "margin"] {
        let request = QueryRequest::new(&ids, 2).with_probabilities(&probabilities);
        let picked = strategies
            .get(name)
            .expect("registered")
            .select(&request)
            .expect("valid request");
        assert_eq!(picked.len(), 2);
        assert!(!picked.contains(&10), "{name} picked the certain row");
    }
}

#[test]
fn test_cluster_seeding_keeps_fitted_clusterer() {
    let (x, y) = two_blobs(15);
    for method in [InitMethod::Edge, InitMethod::Centroid, InitMethod::Hybrid] {
        let config = ActiveLearnerConfig::new()
            .with_classifier(tree)
            .with_initializer(
                SeedInitializer::clustered(|| {
                    Box::new(KMeans::new(3).with_random_state(1)) as Box<dyn Clusterer>
                })
                .with_method(method),
            )
            .with_n_initial(4)
            .with_increment(4)
            .with_max_iter(Some(3))
            .with_random_state(0);
        let learner = run(config, &x, &y);
        assert!(learner.clusterer().is_some(), "{method:?}");
        assert_eq!(learner.history().expect("fitted").len(), 3);
    }

    let random = run(
        ActiveLearnerConfig::new()
            .with_classifier(tree)
            .with_n_initial(4)
            .with_increment(4)
            .with_max_iter(Some(1))
            .with_random_state(0),
        &x,
        &y,
    );
    assert!(random.clusterer().is_none());
}

#[test]
fn test_data_errors_abort_before_training() {
    let (strategies, scorers) = registries();
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_n_initial(2)
        .with_increment(2)
        .with_random_state(0);
    let mut learner = ActiveLearner::new(config, &strategies, &scorers).expect("valid config");

    let x = Matrix::from_vec(6, 1, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).expect("6x1");
    let single_class = vec![1; 6];
    assert!(matches!(
        learner.fit(&x, &single_class),
        Err(ActiveLearningError::InsufficientClasses { found: 1 })
    ));

    let singleton = vec![0, 0, 0, 0, 0, 1];
    let err = learner.fit(&x, &singleton).unwrap_err();
    assert!(matches!(err, ActiveLearningError::StratifiedSplitInfeasible { class: 1, .. }));
    assert!(err.is_data_error());

    assert!(learner.fit(&x, &[0, 1]).unwrap_err().is_data_error());
    assert!(!learner.is_fitted());
}

#[test]
fn test_history_exports_as_json() {
    let (x, y) = two_blobs(10);
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_save_classifiers(true)
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(Some(2))
        .with_random_state(0);
    let learner = run(config, &x, &y);

    let json = serde_json::to_value(learner.history().expect("fitted")).expect("serializes");
    let records = json["records"].as_array().expect("records array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["n_labeled"], 8);
    assert!(records[0].get("classifier").is_none());
}

#[test]
fn test_parallel_seed_runs_match_sequential_runs() {
    let (x, y) = two_blobs(15);
    let (strategies, scorers) = registries();
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_selection_strategy("least_confident")
        .with_n_initial(4)
        .with_increment(3)
        .with_max_iter(Some(4));
    let seeds = [1, 2, 3];

    let parallel = simulate_seeds(&config, &strategies, &scorers, &x, &y, &seeds)
        .expect("all runs succeed");
    assert_eq!(parallel.len(), seeds.len());
    for (learner, &seed) in parallel.iter().zip(&seeds) {
        assert_eq!(learner.config().random_state(), Some(seed));
        let sequential = run(config.clone().with_random_state(seed), &x, &y);
        assert_eq!(learner.labeled_mask(), sequential.labeled_mask());
        assert_eq!(learner.test_indices(), sequential.test_indices());
    }
}

#[test]
fn test_registries_are_shared_across_threads() {
    let (x, y) = two_blobs(15);
    let (strategies, scorers) = registries();
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree)
        .with_selection_strategy("random")
        .with_n_initial(4)
        .with_increment(4)
        .with_max_iter(Some(3))
        .with_random_state(21);

    let (config, strategies, scorers, x, y) = (&config, &strategies, &scorers, &x, &y);
    let masks: Vec<Vec<bool>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || {
                    let mut learner = ActiveLearner::new(config.clone(), strategies, scorers)
                        .expect("valid config");
                    learner.fit(x, y).expect("simulation succeeds");
                    learner.labeled_mask().expect("fitted").to_vec()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread finished"))
            .collect()
    });
    assert!(masks.windows(2).all(|w| w[0] == w[1]));
}
