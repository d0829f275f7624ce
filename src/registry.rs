//! Name-keyed registries for strategies and scorers.
//!
//! A registry is an ordinary value: it is built once during setup, may be
//! extended while it is still owned mutably, and is then shared read-only
//! by reference across every simulation run.

use crate::error::{ActiveLearningError, Result};
use std::collections::BTreeMap;

/// Mapping from string keys to entries of type `T`.
///
/// # Examples
///
/// ```
/// use aprender_active::registry::Registry;
///
/// let mut registry: Registry<u32> = Registry::new("number");
/// registry.register("one", 1);
/// assert_eq!(registry.get("one").unwrap(), &1);
/// assert!(registry.get("two").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Registry<T> {
    kind: &'static str,
    entries: BTreeMap<String, T>,
}

impl<T> Registry<T> {
    /// Creates an empty registry; `kind` is used in error messages.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Registers `entry` under `name`, returning the entry it replaced.
    pub fn register(&mut self, name: impl Into<String>, entry: T) -> Option<T> {
        self.entries.insert(name.into(), entry)
    }

    /// Looks up an entry by name.
    ///
    /// # Errors
    ///
    /// Returns [`ActiveLearningError::UnknownName`] if `name` is not registered.
    pub fn get(&self, name: &str) -> Result<&T> {
        self.entries
            .get(name)
            .ok_or_else(|| ActiveLearningError::UnknownName {
                kind: self.kind,
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registry kind used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}
