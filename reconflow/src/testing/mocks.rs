//! Mock external operation with scripted per-row outcomes.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::OperationError;
use crate::operation::{MlOperation, ModelRef, OperationConfig, OperationKind};
use crate::row::Row;

/// Scripted outcome for one row.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Return a success result.
    Succeed,
    /// Return a retryable failure status.
    Retryable,
    /// Return a terminal failure status with this detail.
    Fail(String),
    /// Return retryable failures until the nth attempt, then succeed.
    SucceedAfter(usize),
}

/// Mock ML operation.
///
/// Outcomes are scripted per key-column value; unscripted rows
/// succeed. Result rows echo the input columns plus the operation's
/// result and status columns, matching the collaborator contract.
pub struct MockOperation {
    kind: OperationKind,
    key_column: String,
    outcomes: HashMap<String, ScriptedOutcome>,
    attempts: Mutex<HashMap<String, usize>>,
    fail_rate: f64,
    call_count: AtomicUsize,
    rows_seen: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl MockOperation {
    /// Creates a mock where every row succeeds.
    #[must_use]
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            key_column: "id".to_string(),
            outcomes: HashMap::new(),
            attempts: Mutex::new(HashMap::new()),
            fail_rate: 0.0,
            call_count: AtomicUsize::new(0),
            rows_seen: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Sets the column used to look up scripted outcomes.
    #[must_use]
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    /// Scripts the outcome for one key value.
    #[must_use]
    pub fn with_outcome(mut self, key: impl Into<String>, outcome: ScriptedOutcome) -> Self {
        self.outcomes.insert(key.into(), outcome);
        self
    }

    /// Injects random retryable failures at the given rate.
    #[must_use]
    pub fn with_fail_rate(mut self, fail_rate: f64) -> Self {
        self.fail_rate = fail_rate;
        self
    }

    /// Returns the number of batches invoked.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Returns the total number of rows seen across all batches.
    #[must_use]
    pub fn rows_seen(&self) -> usize {
        self.rows_seen.load(Ordering::SeqCst)
    }

    /// Returns the size of each invoked batch, in order.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }

    /// Resets counters and attempt history.
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        self.rows_seen.store(0, Ordering::SeqCst);
        self.attempts.lock().clear();
        self.batch_sizes.lock().clear();
    }

    fn status_for(&self, key: &str) -> String {
        let attempt = {
            let mut attempts = self.attempts.lock();
            let entry = attempts.entry(key.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        if self.fail_rate > 0.0 && rand::thread_rng().gen::<f64>() < self.fail_rate {
            return "A retryable error occurred: injected".to_string();
        }

        match self.outcomes.get(key) {
            None | Some(ScriptedOutcome::Succeed) => String::new(),
            Some(ScriptedOutcome::Retryable) => {
                "A retryable error occurred: resource exhausted".to_string()
            }
            Some(ScriptedOutcome::Fail(detail)) => detail.clone(),
            Some(ScriptedOutcome::SucceedAfter(n)) => {
                if attempt > *n {
                    String::new()
                } else {
                    "A retryable error occurred: resource exhausted".to_string()
                }
            }
        }
    }
}

impl std::fmt::Debug for MockOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockOperation")
            .field("kind", &self.kind)
            .field("key_column", &self.key_column)
            .field("scripted", &self.outcomes.len())
            .finish()
    }
}

#[async_trait]
impl MlOperation for MockOperation {
    fn kind(&self) -> OperationKind {
        self.kind
    }

    async fn apply(
        &self,
        _model: &ModelRef,
        rows: &[Row],
        _config: &OperationConfig,
    ) -> Result<Vec<Row>, OperationError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.rows_seen.fetch_add(rows.len(), Ordering::SeqCst);
        self.batch_sizes.lock().push(rows.len());

        let results = rows
            .iter()
            .map(|row| {
                let key = row.get_str(&self.key_column).unwrap_or_default().to_string();
                let status = self.status_for(&key);
                let mut result = row.clone();
                if status.is_empty() {
                    result.set(
                        self.kind.result_column(),
                        serde_json::Value::String(format!(
                            "{} for {key}",
                            self.kind.function_name()
                        )),
                    );
                }
                result.set(self.kind.status_column(), serde_json::Value::String(status));
                result
            })
            .collect();
        Ok(results)
    }
}
