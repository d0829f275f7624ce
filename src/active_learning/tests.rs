use super::*;
use crate::selection::SelectionStrategy;
use crate::tree::DecisionTreeClassifier;

fn tree_factory() -> Box<dyn Classifier> {
    Box::new(DecisionTreeClassifier::new())
}

// Classifier without probability estimates.
#[derive(Debug, Default)]
struct MajorityVote(Option<usize>);

impl Classifier for MajorityVote {
    fn fit(&mut self, _x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        let mut counts = std::collections::BTreeMap::new();
        for &label in y {
            *counts.entry(label).or_insert(0usize) += 1;
        }
        self.0 = counts.into_iter().max_by_key(|&(_, c)| c).map(|(l, _)| l);
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        let label = self.0.ok_or(ActiveLearningError::NotFitted {
            what: "MajorityVote",
        })?;
        Ok(vec![label; x.n_rows()])
    }
}

// Strategy that always proposes pool index 0.
#[derive(Debug)]
struct AlwaysFirst;

impl QueryStrategy for AlwaysFirst {
    fn name(&self) -> &str {
        "always_first"
    }

    fn select(&self, _request: &QueryRequest<'_>) -> Result<Vec<usize>> {
        Ok(vec![0])
    }
}

fn registries() -> (StrategyRegistry, ScorerRegistry) {
    (StrategyRegistry::with_defaults(), ScorerRegistry::with_defaults())
}

fn line_data(n: usize) -> (Matrix<f32>, Vec<usize>) {
    let x = Matrix::from_vec(n, 1, (0..n).map(|i| i as f32).collect()).expect("column");
    let y = (0..n).map(|i| usize::from(i >= n / 2)).collect();
    (x, y)
}

#[test]
fn test_mark_labeled_counts_new_examples() {
    let mut mask = vec![false; 5];
    assert_eq!(mark_labeled(&mut mask, &[1, 3, 3]).expect("valid"), 2);
    assert_eq!(mask, vec![false, true, false, true, false]);
    assert_eq!(unlabeled_ids(&mask), vec![0, 2, 4]);
    assert_eq!(labeled_ids(&mask), vec![1, 3]);
}

#[test]
fn test_mark_labeled_rejects_contract_violations() {
    let mut mask = vec![false, true, false];
    assert!(matches!(
        mark_labeled(&mut mask, &[1]),
        Err(ActiveLearningError::ContractViolation(_))
    ));
    assert!(matches!(
        mark_labeled(&mut mask, &[7]),
        Err(ActiveLearningError::ContractViolation(_))
    ));
    assert!(matches!(
        mark_labeled(&mut mask, &[]),
        Err(ActiveLearningError::ContractViolation(_))
    ));
}

#[test]
fn test_default_config_values() {
    let config = ActiveLearnerConfig::default();
    assert_eq!(config.max_iter(), Some(1000));
    assert_eq!(config.n_initial(), 100);
    assert_eq!(config.increment(), 50);
    assert!((config.test_size() - 0.1).abs() < 1e-6);
    assert!(!config.save_classifiers());
    assert!(config.save_test_scores());
    assert!(config.auto_load());
    assert!(config.random_state().is_none());
    assert!(matches!(
        config.selection_strategy(),
        SelectionStrategy::Named(name) if name == "entropy"
    ));
    assert!(config.classifier_factory().build().supports_probabilities());
}

#[test]
fn test_unknown_names_fail_at_construction() {
    let (strategies, scorers) = registries();
    let config = ActiveLearnerConfig::new().with_selection_strategy("entropyy");
    let err = ActiveLearner::new(config, &strategies, &scorers).unwrap_err();
    assert!(err.is_configuration_error());

    let config = ActiveLearnerConfig::new().with_evaluation_metric("auc");
    let err = ActiveLearner::new(config, &strategies, &scorers).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn test_learning_curve_metric_rejected_per_iteration() {
    let (strategies, scorers) = registries();
    let config = ActiveLearnerConfig::new().with_evaluation_metric("area_under_learning_curve");
    let err = ActiveLearner::new(config, &strategies, &scorers).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn test_uncertainty_strategy_needs_probabilities() {
    let (strategies, scorers) = registries();
    let config = ActiveLearnerConfig::new()
        .with_classifier(|| Box::new(MajorityVote::default()) as Box<dyn Classifier>);
    let err = ActiveLearner::new(config.clone(), &strategies, &scorers).unwrap_err();
    assert!(matches!(err, ActiveLearningError::Unsupported(_)));

    let random = config.with_selection_strategy("random");
    assert!(ActiveLearner::new(random, &strategies, &scorers).is_ok());
}

#[test]
fn test_invalid_numeric_settings() {
    let (strategies, scorers) = registries();
    for config in [
        ActiveLearnerConfig::new().with_increment(0),
        ActiveLearnerConfig::new().with_n_initial(1),
        ActiveLearnerConfig::new().with_max_iter(Some(0)),
        ActiveLearnerConfig::new().with_test_size(1.0),
    ] {
        let err = ActiveLearner::new(config, &strategies, &scorers).unwrap_err();
        assert!(err.is_configuration_error(), "{err}");
    }
    let no_split = ActiveLearnerConfig::new()
        .with_auto_load(false)
        .with_test_size(1.0);
    assert!(ActiveLearner::new(no_split, &strategies, &scorers).is_ok());
}

#[test]
fn test_not_fitted_errors() {
    let (strategies, scorers) = registries();
    let mut learner = ActiveLearner::new(ActiveLearnerConfig::new(), &strategies, &scorers)
        .expect("valid config");
    let (x, y) = line_data(10);

    assert!(!learner.is_fitted());
    assert!(matches!(
        learner.predict(&x),
        Err(ActiveLearningError::NotFitted { .. })
    ));
    assert!(learner.load_best_classifier(&x, &y).unwrap_err().is_configuration_error());
    assert!(learner.history().is_none());
    assert!(learner.labeled_mask().is_none());
}

#[test]
fn test_strategy_returning_labeled_index_aborts_run() {
    let (strategies, scorers) = registries();
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree_factory)
        .with_selection_strategy(SelectionStrategy::custom(AlwaysFirst))
        .with_auto_load(false)
        .with_n_initial(20)
        .with_increment(2)
        .with_random_state(0);
    let mut learner = ActiveLearner::new(config, &strategies, &scorers).expect("valid config");
    let (x, y) = line_data(30);

    // index 0 is labeled by round 2 at the latest
    let err = learner.fit(&x, &y).unwrap_err();
    assert!(matches!(err, ActiveLearningError::ContractViolation(_)));
    assert!(!learner.is_fitted());
}

#[test]
fn test_n_initial_larger_than_pool() {
    let (strategies, scorers) = registries();
    let config = ActiveLearnerConfig::new()
        .with_classifier(tree_factory)
        .with_n_initial(50)
        .with_random_state(0);
    let mut learner = ActiveLearner::new(config, &strategies, &scorers).expect("valid config");
    let (x, y) = line_data(20);
    assert!(learner.fit(&x, &y).unwrap_err().is_configuration_error());
}
