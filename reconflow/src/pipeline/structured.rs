//! Structured-row pipelines under the identity-retry policy.

use std::sync::Arc;

use super::{PipelineOptions, PipelineReport};
use crate::dataset::{SourceRef, Warehouse};
use crate::eligibility::IdentityRetry;
use crate::engine::{Bootstrapper, ConvergenceLoop};
use crate::errors::{ReconflowError, ValidationError};
use crate::merge::{AcceptFilter, MergeWriter};
use crate::operation::{BatchInvoker, MlOperation, ModelRef, OperationConfig};
use crate::publication::{DependencyRegistry, PublicationSpec};
use crate::row::{StatusClassifier, UniqueKey};

/// An incremental pipeline over structured rows.
///
/// Eligibility is identity-based: rows absent from the output or
/// recorded with a retryable status are (re)processed; terminal
/// outcomes are never resubmitted.
pub struct StructuredPipeline {
    output: String,
    unique_key: UniqueKey,
    operation: Arc<dyn MlOperation>,
    model: ModelRef,
    source: SourceRef,
    accept_filter: Option<AcceptFilter>,
    operation_config: OperationConfig,
    options: PipelineOptions,
}

impl std::fmt::Debug for StructuredPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredPipeline")
            .field("output", &self.output)
            .field("unique_key", &self.unique_key)
            .field("operation", &self.operation.kind())
            .field("model", &self.model)
            .finish()
    }
}

impl StructuredPipeline {
    /// Starts building a pipeline that publishes `output`.
    #[must_use]
    pub fn builder(output: impl Into<String>) -> StructuredPipelineBuilder {
        StructuredPipelineBuilder::new(output)
    }

    /// The classifier over this pipeline's status column.
    #[must_use]
    pub fn classifier(&self) -> StatusClassifier {
        StatusClassifier::new(self.operation.kind().status_column())
    }

    /// Runs one pipeline invocation: bootstrap, then (on incremental
    /// runs) the convergence loop.
    ///
    /// # Errors
    ///
    /// Propagates bootstrap, warehouse, and operation-contract
    /// failures.
    pub async fn run(
        &self,
        warehouse: &dyn Warehouse,
        registry: &DependencyRegistry,
    ) -> Result<PipelineReport, ReconflowError> {
        let classifier = self.classifier();
        let filter = self
            .accept_filter
            .clone()
            .unwrap_or_else(|| AcceptFilter::not_retryable(classifier.clone()));
        let invoker = BatchInvoker::new(self.operation.clone(), self.model.clone())
            .with_config(self.operation_config.clone());

        let spec = PublicationSpec::new(self.output.clone(), self.unique_key.clone())?
            .with_dependency(self.source.name())
            .with_dependency(self.model.name());

        let bootstrap = Bootstrapper::new(spec, self.source.clone(), filter.clone())
            .with_seed_limit(self.options.seed_limit())
            .bootstrap(warehouse, registry, &invoker)
            .await?;

        if bootstrap.created {
            // First run: the seed is the whole job; the loop starts
            // with the next scheduled invocation.
            return Ok(PipelineReport {
                bootstrap,
                run: None,
            });
        }

        let policy = Arc::new(IdentityRetry::new(self.unique_key.clone(), classifier));
        let writer = MergeWriter::new(self.output.clone(), self.unique_key.clone(), filter);
        let config = self
            .options
            .engine_config(self.operation.kind().default_batch_limit());

        let run = ConvergenceLoop::new(self.source.clone(), policy, invoker, writer, config)
            .run(warehouse)
            .await?;

        Ok(PipelineReport {
            bootstrap,
            run: Some(run),
        })
    }
}

/// Builder for [`StructuredPipeline`].
pub struct StructuredPipelineBuilder {
    output: String,
    unique_key: Option<UniqueKey>,
    operation: Option<Arc<dyn MlOperation>>,
    model: Option<ModelRef>,
    source: Option<SourceRef>,
    accept_filter: Option<AcceptFilter>,
    operation_config: OperationConfig,
    options: PipelineOptions,
}

impl StructuredPipelineBuilder {
    fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            unique_key: None,
            operation: None,
            model: None,
            source: None,
            accept_filter: None,
            operation_config: OperationConfig::new(),
            options: PipelineOptions::new(),
        }
    }

    /// Sets the unique key columns.
    #[must_use]
    pub fn unique_key(mut self, unique_key: UniqueKey) -> Self {
        self.unique_key = Some(unique_key);
        self
    }

    /// Sets the external operation.
    #[must_use]
    pub fn operation(mut self, operation: Arc<dyn MlOperation>) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Sets the model reference.
    #[must_use]
    pub fn model(mut self, model: impl Into<ModelRef>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the source relation.
    #[must_use]
    pub fn source(mut self, source: impl Into<SourceRef>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Overrides the default not-retryable accept filter.
    #[must_use]
    pub fn accept_filter(mut self, filter: AcceptFilter) -> Self {
        self.accept_filter = Some(filter);
        self
    }

    /// Sets operation parameters.
    #[must_use]
    pub fn operation_config(mut self, config: OperationConfig) -> Self {
        self.operation_config = config;
        self
    }

    /// Sets tuning options.
    #[must_use]
    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a required field is missing or
    /// the output name is empty.
    pub fn build(self) -> Result<StructuredPipeline, ValidationError> {
        if self.output.trim().is_empty() {
            return Err(
                ValidationError::new("Output name cannot be empty").with_field("output")
            );
        }
        let unique_key = self
            .unique_key
            .ok_or_else(|| ValidationError::new("Unique key is required").with_field("unique_key"))?;
        let operation = self
            .operation
            .ok_or_else(|| ValidationError::new("Operation is required").with_field("operation"))?;
        let model = self
            .model
            .ok_or_else(|| ValidationError::new("Model reference is required").with_field("model"))?;
        let source = self
            .source
            .ok_or_else(|| ValidationError::new("Source is required").with_field("source"))?;

        Ok(StructuredPipeline {
            output: self.output,
            unique_key,
            operation,
            model,
            source,
            accept_filter: self.accept_filter,
            operation_config: self.operation_config,
            options: self.options,
        })
    }
}

/// Runs a structured-row pipeline in one call.
///
/// Convenience wrapper over [`StructuredPipeline::builder`] matching
/// the public call contract.
///
/// # Errors
///
/// Propagates validation, bootstrap, warehouse, and operation
/// failures.
#[allow(clippy::too_many_arguments)]
pub async fn run_structured_pipeline(
    warehouse: &dyn Warehouse,
    registry: &DependencyRegistry,
    output_name: impl Into<String>,
    unique_key: UniqueKey,
    operation: Arc<dyn MlOperation>,
    model: impl Into<ModelRef>,
    source_query: impl Into<SourceRef>,
    accept_filter: Option<AcceptFilter>,
    operation_config: OperationConfig,
    options: PipelineOptions,
) -> Result<PipelineReport, ReconflowError> {
    let mut builder = StructuredPipeline::builder(output_name)
        .unique_key(unique_key)
        .operation(operation)
        .model(model)
        .source(source_query)
        .operation_config(operation_config)
        .options(options);
    if let Some(filter) = accept_filter {
        builder = builder.accept_filter(filter);
    }
    builder.build()?.run(warehouse, registry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use crate::testing::MockOperation;

    fn operation() -> Arc<dyn MlOperation> {
        Arc::new(MockOperation::new(OperationKind::GenerateText))
    }

    #[test]
    fn test_builder_requires_operation() {
        let err = StructuredPipeline::builder("out")
            .unique_key(UniqueKey::single("id"))
            .model("m")
            .source("src")
            .build()
            .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("operation"));
    }

    #[test]
    fn test_builder_requires_unique_key() {
        let err = StructuredPipeline::builder("out")
            .operation(operation())
            .model("m")
            .source("src")
            .build()
            .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("unique_key"));
    }

    #[test]
    fn test_builder_rejects_empty_output() {
        let err = StructuredPipeline::builder("  ")
            .unique_key(UniqueKey::single("id"))
            .operation(operation())
            .model("m")
            .source("src")
            .build()
            .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("output"));
    }

    #[test]
    fn test_builder_complete() {
        let pipeline = StructuredPipeline::builder("out")
            .unique_key(UniqueKey::single("id"))
            .operation(operation())
            .model("m")
            .source("src")
            .build()
            .unwrap();
        assert_eq!(pipeline.classifier().column(), "generate_text_status");
    }
}
