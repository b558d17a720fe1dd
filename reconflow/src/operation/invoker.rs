//! Batch invocation of an external operation.

use std::sync::Arc;
use tracing::debug;

use super::{MlOperation, ModelRef, OperationConfig, OperationKind};
use crate::errors::OperationError;
use crate::row::Row;

/// Issues one call of the external operation against a bounded batch.
///
/// A pure pass-through: no retries here, since retries are an emergent
/// property of the outer loop re-selecting failed rows in a later
/// iteration. Must not mutate source or output.
#[derive(Clone)]
pub struct BatchInvoker {
    operation: Arc<dyn MlOperation>,
    model: ModelRef,
    config: OperationConfig,
}

impl BatchInvoker {
    /// Creates an invoker for one operation and model.
    #[must_use]
    pub fn new(operation: Arc<dyn MlOperation>, model: ModelRef) -> Self {
        Self {
            operation,
            model,
            config: OperationConfig::new(),
        }
    }

    /// Sets the operation configuration.
    #[must_use]
    pub fn with_config(mut self, config: OperationConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the catalogue entry of the wrapped operation.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    /// Returns the model reference.
    #[must_use]
    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    /// Invokes the operation on a batch of eligible rows.
    ///
    /// # Errors
    ///
    /// Propagates provider errors, and surfaces a
    /// [`OperationError::CardinalityMismatch`] if the operation
    /// violates the one-result-row-per-input-row contract.
    pub async fn invoke(&self, rows: &[Row]) -> Result<Vec<Row>, OperationError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let results = self.operation.apply(&self.model, rows, &self.config).await?;

        if results.len() != rows.len() {
            return Err(OperationError::CardinalityMismatch {
                operation: self.kind().function_name().to_string(),
                expected: rows.len(),
                actual: results.len(),
            });
        }

        debug!(
            operation = %self.kind(),
            model = %self.model,
            rows = rows.len(),
            "batch dispatched"
        );
        Ok(results)
    }
}

impl std::fmt::Debug for BatchInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchInvoker")
            .field("operation", &self.kind())
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    mockall::mock! {
        pub Operation {}

        #[async_trait]
        impl MlOperation for Operation {
            fn kind(&self) -> OperationKind;
            async fn apply(
                &self,
                model: &ModelRef,
                rows: &[Row],
                config: &OperationConfig,
            ) -> Result<Vec<Row>, OperationError>;
        }
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row::new().with("id", json!(i.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch_short_circuits() {
        let mut operation = MockOperation::new();
        operation.expect_apply().times(0);
        let invoker = BatchInvoker::new(Arc::new(operation), ModelRef::new("m"));

        let results = invoker.invoke(&[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_pass_through() {
        let mut operation = MockOperation::new();
        operation
            .expect_kind()
            .return_const(OperationKind::GenerateText);
        operation
            .expect_apply()
            .times(1)
            .returning(|_, rows, _| Ok(rows.to_vec()));

        let invoker = BatchInvoker::new(Arc::new(operation), ModelRef::new("m"));
        let results = invoker.invoke(&rows(3)).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_cardinality_mismatch_is_rejected() {
        let mut operation = MockOperation::new();
        operation
            .expect_kind()
            .return_const(OperationKind::GenerateText);
        operation
            .expect_apply()
            .returning(|_, _, _| Ok(Vec::new()));

        let invoker = BatchInvoker::new(Arc::new(operation), ModelRef::new("m"));
        let err = invoker.invoke(&rows(2)).await.unwrap_err();
        assert!(matches!(err, OperationError::CardinalityMismatch { .. }));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let mut operation = MockOperation::new();
        operation
            .expect_apply()
            .returning(|_, _, _| {
                Err(OperationError::Provider {
                    operation: "generate_text".to_string(),
                    message: "model not found".to_string(),
                })
            });

        let invoker = BatchInvoker::new(Arc::new(operation), ModelRef::new("m"));
        let err = invoker.invoke(&rows(1)).await.unwrap_err();
        assert!(matches!(err, OperationError::Provider { .. }));
    }

    #[test]
    fn test_config_is_carried() {
        let mut operation = MockOperation::new();
        operation
            .expect_kind()
            .return_const(OperationKind::GenerateText);
        let invoker = BatchInvoker::new(Arc::new(operation), ModelRef::new("m"))
            .with_config(OperationConfig::new().with("prompt", "p"));
        assert_eq!(invoker.kind(), OperationKind::GenerateText);
        assert_eq!(invoker.model().name(), "m");
    }
}
