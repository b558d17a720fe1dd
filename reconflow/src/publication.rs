//! The table-publication orchestrator seam.
//!
//! The surrounding orchestration framework sequences execution from
//! declared dependencies. The engine's side of that contract is a
//! named output declaration ([`PublicationSpec`]) and an explicit
//! [`DependencyRegistry`] the bootstrapper records into. Registry
//! state is process-wide but owned by the caller, never ambient.

use dashmap::DashSet;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::row::UniqueKey;

/// Declaration of a named incremental output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationSpec {
    name: String,
    unique_key: UniqueKey,
    dependencies: Vec<String>,
}

impl PublicationSpec {
    /// Creates a publication declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or whitespace-only.
    pub fn new(name: impl Into<String>, unique_key: UniqueKey) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(
                ValidationError::new("Output name cannot be empty or whitespace-only")
                    .with_field("output"),
            );
        }
        Ok(Self {
            name,
            unique_key,
            dependencies: Vec::new(),
        })
    }

    /// Adds a declared dependency.
    #[must_use]
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// Returns the output name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique key.
    #[must_use]
    pub fn unique_key(&self) -> &UniqueKey {
        &self.unique_key
    }

    /// Returns the declared dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// Registry of declared external dependencies.
///
/// `declare` is an idempotent insert; the boolean return is the
/// duplicate guard. Safe to share across pipelines in one process.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    entries: DashSet<String>,
}

impl DependencyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a dependency. Returns true if it was newly declared,
    /// false if it was already present.
    pub fn declare(&self, name: impl Into<String>) -> bool {
        self.entries.insert(name.into())
    }

    /// Returns true if the dependency has been declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    /// Returns the number of declared dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the declared names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.clone()).collect();
        names.sort_unstable();
        names
    }
}
