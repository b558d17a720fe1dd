//! The row type carried through source, eligibility, and output.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{RowKey, UniqueKey};

/// One unit of work: a named-column record.
///
/// Cell values are arbitrary JSON values; the engine itself only ever
/// interprets key columns, the freshness column, and the operation's
/// status column. Everything else is payload passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: HashMap<String, serde_json::Value>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a column, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.columns.get(column)
    }

    /// Returns a column value as a string slice, if it is a string.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.columns.get(column).and_then(serde_json::Value::as_str)
    }

    /// Sets a column value, replacing any existing value.
    pub fn set(&mut self, column: impl Into<String>, value: serde_json::Value) {
        self.columns.insert(column.into(), value);
    }

    /// Builder-style column setter.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: serde_json::Value) -> Self {
        self.set(column, value);
        self
    }

    /// Returns true if the column is present.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over column names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.columns.iter()
    }

    /// Extracts the row's identity under the given unique key.
    ///
    /// Returns `None` if any key column is absent or null; such rows
    /// have no upsert identity and are excluded from eligibility.
    #[must_use]
    pub fn key(&self, unique_key: &UniqueKey) -> Option<RowKey> {
        let mut values = Vec::with_capacity(unique_key.columns().len());
        for column in unique_key.columns() {
            values.push(canonical(self.columns.get(column)?)?);
        }
        Some(RowKey::new(values))
    }

    /// Returns the name of the first unique-key column this row is
    /// missing (or holds null for), if any.
    #[must_use]
    pub fn missing_key_column<'a>(&self, unique_key: &'a UniqueKey) -> Option<&'a str> {
        unique_key.columns().iter().find_map(|column| {
            match self.columns.get(column.as_str()) {
                None | Some(serde_json::Value::Null) => Some(column.as_str()),
                Some(_) => None,
            }
        })
    }
}

impl FromIterator<(String, serde_json::Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, serde_json::Value)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Canonical string encoding of a key cell. Null has no identity.
fn canonical(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_builder() {
        let row = Row::new()
            .with("id", json!("r1"))
            .with("content", json!("hello"));

        assert_eq!(row.get_str("id"), Some("r1"));
        assert_eq!(row.len(), 2);
        assert!(row.contains("content"));
        assert!(!row.contains("status"));
    }

    #[test]
    fn test_key_extraction_single_column() {
        let row = Row::new().with("id", json!("r1"));
        let key = row.key(&UniqueKey::single("id")).unwrap();
        assert_eq!(key, RowKey::new(["r1"]));
    }

    #[test]
    fn test_key_extraction_composite() {
        let row = Row::new().with("tenant", json!("acme")).with("id", json!(7));
        let unique_key = UniqueKey::new(["tenant", "id"]).unwrap();
        let key = row.key(&unique_key).unwrap();
        assert_eq!(key, RowKey::new(["acme", "7"]));
    }

    #[test]
    fn test_key_missing_column_is_none() {
        let row = Row::new().with("content", json!("hello"));
        assert!(row.key(&UniqueKey::single("id")).is_none());
        assert_eq!(row.missing_key_column(&UniqueKey::single("id")), Some("id"));
    }

    #[test]
    fn test_key_null_column_is_none() {
        let row = Row::new().with("id", json!(null));
        assert!(row.key(&UniqueKey::single("id")).is_none());
    }

    #[test]
    fn test_row_serde_round_trip() {
        let row = Row::new().with("id", json!("r1")).with("n", json!(3));
        let encoded = serde_json::to_string(&row).unwrap();
        let decoded: Row = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, row);
    }
}
