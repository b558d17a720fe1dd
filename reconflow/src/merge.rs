//! Accept filtering and keyed merge of candidate rows.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::dataset::Warehouse;
use crate::errors::WarehouseError;
use crate::observability::SpanTimer;
use crate::row::{Row, StatusClassifier, UniqueKey};

/// Decides which candidate rows may be written to the output.
///
/// The default filter excludes rows still reporting a retryable
/// failure: those must stay out of the output so the next iteration's
/// eligibility pass resubmits them. Terminal failures pass the filter
/// and are written carrying their failure detail, which is what stops
/// them from being retried forever.
#[derive(Clone)]
pub struct AcceptFilter {
    description: String,
    predicate: Arc<dyn Fn(&Row) -> bool + Send + Sync>,
}

impl AcceptFilter {
    /// Accepts every row whose status is not retryable.
    #[must_use]
    pub fn not_retryable(classifier: StatusClassifier) -> Self {
        let description = format!("status `{}` not retryable", classifier.column());
        Self {
            description,
            predicate: Arc::new(move |row| !classifier.is_retryable(row)),
        }
    }

    /// Accepts every row unconditionally.
    #[must_use]
    pub fn accept_all() -> Self {
        Self {
            description: "accept all".to_string(),
            predicate: Arc::new(|_| true),
        }
    }

    /// A caller-supplied predicate with a description for logging.
    #[must_use]
    pub fn custom(
        description: impl Into<String>,
        predicate: impl Fn(&Row) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns true if the row passes the filter.
    #[must_use]
    pub fn accepts(&self, row: &Row) -> bool {
        (self.predicate)(row)
    }

    /// Returns the filter description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for AcceptFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceptFilter")
            .field("description", &self.description)
            .finish()
    }
}

/// Upserts accepted candidate rows into the output dataset.
#[derive(Debug, Clone)]
pub struct MergeWriter {
    output: String,
    unique_key: UniqueKey,
    filter: AcceptFilter,
}

impl MergeWriter {
    /// Creates a writer for the given output table.
    #[must_use]
    pub fn new(output: impl Into<String>, unique_key: UniqueKey, filter: AcceptFilter) -> Self {
        Self {
            output: output.into(),
            unique_key,
            filter,
        }
    }

    /// Returns the output table name.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns the accept filter.
    #[must_use]
    pub fn filter(&self) -> &AcceptFilter {
        &self.filter
    }

    /// Filters candidates and upserts the survivors.
    ///
    /// Returns the number of rows written, which the controller uses
    /// for convergence detection.
    ///
    /// # Errors
    ///
    /// Propagates warehouse failures; nothing is written when the
    /// batch fails validation.
    pub async fn merge(
        &self,
        warehouse: &dyn Warehouse,
        candidates: Vec<Row>,
    ) -> Result<usize, WarehouseError> {
        let total = candidates.len();
        let accepted: Vec<Row> = candidates
            .into_iter()
            .filter(|row| self.filter.accepts(row))
            .collect();
        let rejected = total - accepted.len();

        if accepted.is_empty() {
            debug!(output = %self.output, rejected, "no rows accepted, skipping merge");
            return Ok(0);
        }

        let timer = SpanTimer::start("merge");
        let written = warehouse
            .merge(&self.output, &self.unique_key, accepted)
            .await?;
        debug!(
            output = %self.output,
            written,
            rejected,
            filter = self.filter.description(),
            duration_ms = timer.finish(),
            "merged candidate rows"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MemoryWarehouse;
    use crate::row::RowKey;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const STATUS: &str = "generate_text_status";

    fn writer() -> MergeWriter {
        MergeWriter::new(
            "out",
            UniqueKey::single("id"),
            AcceptFilter::not_retryable(StatusClassifier::new(STATUS)),
        )
    }

    fn candidate(id: &str, status: &str) -> Row {
        Row::new().with("id", json!(id)).with(STATUS, json!(status))
    }

    async fn warehouse() -> MemoryWarehouse {
        let warehouse = MemoryWarehouse::new();
        warehouse
            .create_table("out", &UniqueKey::single("id"), vec![])
            .await
            .unwrap();
        warehouse
    }

    #[tokio::test]
    async fn test_retryable_rows_are_rejected() {
        let warehouse = warehouse().await;
        let written = writer()
            .merge(
                &warehouse,
                vec![
                    candidate("a", ""),
                    candidate("b", "A retryable error occurred: quota"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert!(warehouse.get("out", &RowKey::new(["a"])).is_some());
        assert!(warehouse.get("out", &RowKey::new(["b"])).is_none());
    }

    #[tokio::test]
    async fn test_terminal_failures_are_written() {
        let warehouse = warehouse().await;
        let written = writer()
            .merge(&warehouse, vec![candidate("a", "Invalid argument")])
            .await
            .unwrap();

        assert_eq!(written, 1);
        let row = warehouse.get("out", &RowKey::new(["a"])).unwrap();
        assert_eq!(row.get_str(STATUS), Some("Invalid argument"));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_key() {
        let warehouse = warehouse().await;
        let w = writer();

        w.merge(
            &warehouse,
            vec![candidate("a", "Invalid argument").with("attempt", json!(1))],
        )
        .await
        .unwrap();
        w.merge(&warehouse, vec![candidate("a", "").with("attempt", json!(2))])
            .await
            .unwrap();

        assert_eq!(warehouse.row_count("out"), Some(1));
        let row = warehouse.get("out", &RowKey::new(["a"])).unwrap();
        assert_eq!(row.get("attempt"), Some(&json!(2)));
        assert_eq!(row.get_str(STATUS), Some(""));
    }

    #[tokio::test]
    async fn test_all_rejected_writes_nothing() {
        let warehouse = warehouse().await;
        let written = writer()
            .merge(
                &warehouse,
                vec![candidate("a", "A retryable error occurred: busy")],
            )
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(warehouse.row_count("out"), Some(0));
    }

    #[tokio::test]
    async fn test_custom_filter() {
        let warehouse = warehouse().await;
        let writer = MergeWriter::new(
            "out",
            UniqueKey::single("id"),
            AcceptFilter::custom("id is not b", |row| row.get_str("id") != Some("b")),
        );

        let written = writer
            .merge(&warehouse, vec![candidate("a", ""), candidate("b", "")])
            .await
            .unwrap();
        assert_eq!(written, 1);
    }

    #[test]
    fn test_accept_all() {
        let filter = AcceptFilter::accept_all();
        assert!(filter.accepts(&candidate("a", "A retryable error occurred")));
        assert_eq!(filter.description(), "accept all");
    }

    #[test]
    fn test_filter_debug_shows_description() {
        let filter = AcceptFilter::not_retryable(StatusClassifier::new(STATUS));
        let debug = format!("{filter:?}");
        assert!(debug.contains("not retryable"));
    }
}
