//! In-memory warehouse used by tests and benchmarks.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{SourceRef, Warehouse};
use crate::errors::WarehouseError;
use crate::row::{Row, RowKey, UniqueKey};

#[derive(Debug)]
struct StoredTable {
    unique_key: UniqueKey,
    rows: HashMap<RowKey, Row>,
}

/// An in-memory [`Warehouse`].
///
/// Each merge call takes the write lock once and applies every upsert
/// under it, so concurrent scans observe either the pre-merge or the
/// post-merge state, never a half-written batch.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    tables: RwLock<HashMap<String, StoredTable>>,
}

impl MemoryWarehouse {
    /// Creates an empty warehouse.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style table seeding for tests.
    ///
    /// Rows without a complete key are dropped silently; fixtures are
    /// expected to be well-formed.
    #[must_use]
    pub fn with_table(
        self,
        name: impl Into<String>,
        unique_key: UniqueKey,
        rows: impl IntoIterator<Item = Row>,
    ) -> Self {
        let mut keyed = HashMap::new();
        for row in rows {
            if let Some(key) = row.key(&unique_key) {
                keyed.insert(key, row);
            }
        }
        self.tables.write().insert(
            name.into(),
            StoredTable {
                unique_key,
                rows: keyed,
            },
        );
        self
    }

    /// Returns the number of rows in a table, if it exists.
    #[must_use]
    pub fn row_count(&self, name: &str) -> Option<usize> {
        self.tables.read().get(name).map(|t| t.rows.len())
    }

    /// Returns a copy of one row by key, if present.
    #[must_use]
    pub fn get(&self, name: &str, key: &RowKey) -> Option<Row> {
        self.tables.read().get(name)?.rows.get(key).cloned()
    }

    /// Reads all rows of a relation by reference.
    #[must_use]
    pub fn scan_ref(&self, source: &SourceRef) -> Option<Vec<Row>> {
        self.tables
            .read()
            .get(source.name())
            .map(|t| t.rows.values().cloned().collect())
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn table_exists(&self, name: &str) -> Result<bool, WarehouseError> {
        Ok(self.tables.read().contains_key(name))
    }

    async fn create_table(
        &self,
        name: &str,
        unique_key: &UniqueKey,
        rows: Vec<Row>,
    ) -> Result<usize, WarehouseError> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(WarehouseError::TableAlreadyExists {
                name: name.to_string(),
            });
        }

        let mut keyed = HashMap::with_capacity(rows.len());
        for row in rows {
            let key = keyed_or_err(name, unique_key, &row)?;
            keyed.insert(key, row);
        }
        let written = keyed.len();
        tables.insert(
            name.to_string(),
            StoredTable {
                unique_key: unique_key.clone(),
                rows: keyed,
            },
        );
        Ok(written)
    }

    async fn scan(&self, name: &str) -> Result<Vec<Row>, WarehouseError> {
        let tables = self.tables.read();
        let table = tables
            .get(name)
            .ok_or_else(|| WarehouseError::TableNotFound {
                name: name.to_string(),
            })?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn merge(
        &self,
        name: &str,
        unique_key: &UniqueKey,
        rows: Vec<Row>,
    ) -> Result<usize, WarehouseError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(name)
            .ok_or_else(|| WarehouseError::TableNotFound {
                name: name.to_string(),
            })?;

        // Validate the whole batch before touching the table so a
        // malformed row cannot leave a partial merge behind.
        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows {
            let key = keyed_or_err(name, unique_key, &row)?;
            keyed.push((key, row));
        }

        let written = keyed.len();
        for (key, row) in keyed {
            table.rows.insert(key, row);
        }
        Ok(written)
    }
}

fn keyed_or_err(
    table: &str,
    unique_key: &UniqueKey,
    row: &Row,
) -> Result<RowKey, WarehouseError> {
    row.key(unique_key).ok_or_else(|| {
        let column = row
            .missing_key_column(unique_key)
            .unwrap_or("<unknown>")
            .to_string();
        WarehouseError::MissingKeyColumn {
            table: table.to_string(),
            column,
        }
    })
}
