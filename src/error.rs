//! Error types for active learning simulations.
//!
//! Configuration and data errors are raised before the simulation loop
//! starts; anything raised inside an iteration aborts the run.

use thiserror::Error;

/// Main error type for active learning operations.
///
/// # Examples
///
/// ```
/// use aprender_active::error::ActiveLearningError;
///
/// let err = ActiveLearningError::UnknownName {
///     kind: "selection strategy",
///     name: "entropyy".to_string(),
///     available: vec!["entropy".to_string(), "random".to_string()],
/// };
/// assert!(err.to_string().contains("entropyy"));
/// assert!(err.is_configuration_error());
/// ```
#[derive(Debug, Error)]
pub enum ActiveLearningError {
    /// A strategy or scorer name is not present in its registry.
    #[error("Unknown {kind} '{name}', available: {}", available.join(", "))]
    UnknownName {
        /// Registry kind ("selection strategy", "scorer", ...)
        kind: &'static str,
        /// Requested name
        name: String,
        /// Registered names
        available: Vec<String>,
    },

    /// Invalid hyperparameter value provided.
    #[error("Invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// An operation needs a fitted model.
    #[error("{what} is not fitted, call fit() first")]
    NotFitted {
        /// Component that was queried
        what: &'static str,
    },

    /// `load_best_classifier` was called without saved snapshots.
    #[error("No classifiers were saved during fit, enable save_classifiers")]
    NoSavedClassifiers,

    /// A collaborator lacks a required capability.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Labels contain fewer than two classes.
    #[error("Need at least 2 classes, found {found}")]
    InsufficientClasses {
        /// Number of distinct classes found
        found: usize,
    },

    /// A stratified split cannot honor the requested proportion.
    #[error("Stratified split infeasible for class {class} with {members} member(s): {reason}")]
    StratifiedSplitInfeasible {
        /// Offending class label
        class: usize,
        /// Number of members of that class
        members: usize,
        /// Explanation
        reason: String,
    },

    /// Matrix/label dimensions don't match.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Input contains no samples.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A query strategy returned an index it was not allowed to return.
    #[error("Query strategy contract violated: {0}")]
    ContractViolation(String),

    /// Generic error with string message.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for ActiveLearningError {
    fn from(msg: &str) -> Self {
        ActiveLearningError::Other(msg.to_string())
    }
}

impl From<String> for ActiveLearningError {
    fn from(msg: String) -> Self {
        ActiveLearningError::Other(msg)
    }
}

impl ActiveLearningError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an invalid hyperparameter error
    #[must_use]
    pub fn invalid_hyperparameter(param: &str, value: impl ToString, constraint: &str) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// True for errors caused by how the run was configured.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownName { .. }
                | Self::InvalidHyperparameter { .. }
                | Self::NotFitted { .. }
                | Self::NoSavedClassifiers
                | Self::Unsupported(_)
        )
    }

    /// True for errors caused by the supplied dataset.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientClasses { .. }
                | Self::StratifiedSplitInfeasible { .. }
                | Self::DimensionMismatch { .. }
                | Self::EmptyInput(_)
        )
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, ActiveLearningError>;
