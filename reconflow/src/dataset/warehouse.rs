//! The warehouse trait: scans, creates, and keyed merges.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::WarehouseError;
use crate::row::{Row, UniqueKey};

/// A named source relation (table or view) to read work from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef(String);

impl SourceRef {
    /// Creates a source reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the relation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SourceRef {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Executes statements against dataset storage.
///
/// Implementations own the wire protocol and any per-statement
/// timeout enforcement. The engine requires two consistency
/// properties from every implementation:
///
/// - `merge` is atomic with respect to concurrent readers: a scan
///   observes either none or all of one merge call's upserts.
/// - Read-after-write: a scan issued after a merge returns observes
///   that merge's rows. Stale reads risk resubmitting rows that
///   already succeeded, which wastes quota.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Returns true if the named table exists.
    async fn table_exists(&self, name: &str) -> Result<bool, WarehouseError>;

    /// Creates a table keyed by `unique_key`, populated with `rows`.
    ///
    /// # Errors
    ///
    /// Returns `TableAlreadyExists` if the table is already present.
    async fn create_table(
        &self,
        name: &str,
        unique_key: &UniqueKey,
        rows: Vec<Row>,
    ) -> Result<usize, WarehouseError>;

    /// Reads all rows of the named relation.
    ///
    /// Row order is unspecified; callers must not depend on it.
    async fn scan(&self, name: &str) -> Result<Vec<Row>, WarehouseError>;

    /// Upserts `rows` into the named table keyed by `unique_key`.
    ///
    /// Existing keys are replaced, new keys inserted. Returns the
    /// number of rows written.
    async fn merge(
        &self,
        name: &str,
        unique_key: &UniqueKey,
        rows: Vec<Row>,
    ) -> Result<usize, WarehouseError>;
}
