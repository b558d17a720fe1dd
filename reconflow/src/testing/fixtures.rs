//! Row fixtures.

use serde_json::json;

use crate::row::Row;

/// A structured source row with an `id` key and a `content` payload.
#[must_use]
pub fn text_row(id: &str, content: &str) -> Row {
    Row::new().with("id", json!(id)).with("content", json!(content))
}

/// An object source row with a `uri` key and an `updated` freshness
/// timestamp (RFC3339 or unix epoch).
#[must_use]
pub fn object_row(uri: &str, updated: &str) -> Row {
    Row::new().with("uri", json!(uri)).with("updated", json!(updated))
}
