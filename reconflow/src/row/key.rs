//! Row identity: unique-key column sets and materialized key values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// The column set identifying a row for upsert purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueKey {
    columns: Vec<String>,
}

impl UniqueKey {
    /// Creates a unique key over the given columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the column list is empty or contains an
    /// empty column name.
    pub fn new(
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, ValidationError> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(
                ValidationError::new("Unique key requires at least one column")
                    .with_field("unique_key"),
            );
        }
        if columns.iter().any(|c| c.trim().is_empty()) {
            return Err(
                ValidationError::new("Unique key columns cannot be empty").with_field("unique_key")
            );
        }
        Ok(Self { columns })
    }

    /// Creates a single-column unique key.
    #[must_use]
    pub fn single(column: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into()],
        }
    }

    /// Returns the key columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.columns.join(", "))
    }
}

/// A row's materialized identity: one canonical value per key column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowKey(Vec<String>);

impl RowKey {
    /// Creates a row key from canonical value encodings.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }

    /// Returns the key values.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}
