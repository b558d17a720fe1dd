//! Object-collection pipelines under the freshness-scan policy.

use std::sync::Arc;

use super::{PipelineOptions, PipelineReport};
use crate::dataset::{SourceRef, Warehouse};
use crate::eligibility::FreshnessScan;
use crate::engine::{Bootstrapper, ConvergenceLoop};
use crate::errors::{ReconflowError, ValidationError};
use crate::merge::{AcceptFilter, MergeWriter};
use crate::operation::{BatchInvoker, MlOperation, ModelRef, OperationConfig};
use crate::publication::{DependencyRegistry, PublicationSpec};
use crate::row::{StatusClassifier, UniqueKey};

/// Default key column for object collections.
pub const DEFAULT_OBJECT_KEY: &str = "uri";

/// Default freshness column for object collections.
pub const DEFAULT_UPDATED_COLUMN: &str = "updated";

/// An incremental pipeline over an append-only object collection.
///
/// Eligibility is freshness-based: objects absent from the output or
/// whose `updated` timestamp exceeds the output's high-water mark are
/// (re)processed. Transient failures are also resurfaced by default;
/// [`ObjectPipelineBuilder::strict_freshness`] restores the
/// timestamp-only variant.
pub struct ObjectPipeline {
    output: String,
    source_table: String,
    source: SourceRef,
    unique_key: UniqueKey,
    updated_column: String,
    operation: Arc<dyn MlOperation>,
    model: ModelRef,
    accept_filter: Option<AcceptFilter>,
    operation_config: OperationConfig,
    options: PipelineOptions,
    strict_freshness: bool,
}

impl std::fmt::Debug for ObjectPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPipeline")
            .field("output", &self.output)
            .field("source_table", &self.source_table)
            .field("unique_key", &self.unique_key)
            .field("updated_column", &self.updated_column)
            .field("operation", &self.operation.kind())
            .field("model", &self.model)
            .field("strict_freshness", &self.strict_freshness)
            .finish()
    }
}

impl ObjectPipeline {
    /// Starts building a pipeline that publishes `output`.
    #[must_use]
    pub fn builder(output: impl Into<String>) -> ObjectPipelineBuilder {
        ObjectPipelineBuilder::new(output)
    }

    /// Runs one pipeline invocation.
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
        let classifier = StatusClassifier::new(self.operation.kind().status_column());
        let filter = self
            .accept_filter
            .clone()
            .unwrap_or_else(|| AcceptFilter::not_retryable(classifier.clone()));
        let invoker = BatchInvoker::new(self.operation.clone(), self.model.clone())
            .with_config(self.operation_config.clone());

        let spec = PublicationSpec::new(self.output.clone(), self.unique_key.clone())?
            .with_dependency(self.source_table.clone())
            .with_dependency(self.model.name());

        let bootstrap = Bootstrapper::new(spec, self.source.clone(), filter.clone())
            .with_seed_limit(self.options.seed_limit())
            .bootstrap(warehouse, registry, &invoker)
            .await?;

        if bootstrap.created {
            return Ok(PipelineReport {
                bootstrap,
                run: None,
            });
        }

        let mut policy = FreshnessScan::new(
            self.unique_key.clone(),
            self.updated_column.clone(),
            classifier,
        );
        if self.strict_freshness {
            policy = policy.without_retry_term();
        }

        let writer = MergeWriter::new(self.output.clone(), self.unique_key.clone(), filter);
        let config = self
            .options
            .engine_config(self.operation.kind().default_batch_limit());

        let run = ConvergenceLoop::new(
            self.source.clone(),
            Arc::new(policy),
            invoker,
            writer,
            config,
        )
        .run(warehouse)
        .await?;

        Ok(PipelineReport {
            bootstrap,
            run: Some(run),
        })
    }
}

/// Builder for [`ObjectPipeline`].
pub struct ObjectPipelineBuilder {
    output: String,
    source_table: Option<String>,
    source_query: Option<SourceRef>,
    unique_key: UniqueKey,
    updated_column: String,
    operation: Option<Arc<dyn MlOperation>>,
    model: Option<ModelRef>,
    accept_filter: Option<AcceptFilter>,
    operation_config: OperationConfig,
    options: PipelineOptions,
    strict_freshness: bool,
}

impl ObjectPipelineBuilder {
    fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            source_table: None,
            source_query: None,
            unique_key: UniqueKey::single(DEFAULT_OBJECT_KEY),
            updated_column: DEFAULT_UPDATED_COLUMN.to_string(),
            operation: None,
            model: None,
            accept_filter: None,
            operation_config: OperationConfig::new(),
            options: PipelineOptions::new(),
            strict_freshness: false,
        }
    }

    /// Sets the object table (declared as the pipeline dependency and
    /// scanned unless a source query overrides it).
    #[must_use]
    pub fn source_table(mut self, table: impl Into<String>) -> Self {
        self.source_table = Some(table.into());
        self
    }

    /// Overrides the relation scanned for work.
    #[must_use]
    pub fn source_query(mut self, source: impl Into<SourceRef>) -> Self {
        self.source_query = Some(source.into());
        self
    }

    /// Overrides the default `uri` unique key.
    #[must_use]
    pub fn unique_key(mut self, unique_key: UniqueKey) -> Self {
        self.unique_key = unique_key;
        self
    }

    /// Overrides the default `updated` freshness column.
    #[must_use]
    pub fn updated_column(mut self, column: impl Into<String>) -> Self {
        self.updated_column = column.into();
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

    /// Only timestamp advancement resurfaces recorded objects;
    /// transient failures wait for a re-upload.
    #[must_use]
    pub fn strict_freshness(mut self) -> Self {
        self.strict_freshness = true;
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a required field is missing.
    pub fn build(self) -> Result<ObjectPipeline, ValidationError> {
        if self.output.trim().is_empty() {
            return Err(
                ValidationError::new("Output name cannot be empty").with_field("output")
            );
        }
        let source_table = self.source_table.ok_or_else(|| {
            ValidationError::new("Source table is required").with_field("source_table")
        })?;
        let operation = self
            .operation
            .ok_or_else(|| ValidationError::new("Operation is required").with_field("operation"))?;
        let model = self
            .model
            .ok_or_else(|| ValidationError::new("Model reference is required").with_field("model"))?;

        let source = self
            .source_query
            .unwrap_or_else(|| SourceRef::new(source_table.clone()));

        Ok(ObjectPipeline {
            output: self.output,
            source_table,
            source,
            unique_key: self.unique_key,
            updated_column: self.updated_column,
            operation,
            model,
            accept_filter: self.accept_filter,
            operation_config: self.operation_config,
            options: self.options,
            strict_freshness: self.strict_freshness,
        })
    }
}

/// Runs an object-collection pipeline in one call.
///
/// Convenience wrapper over [`ObjectPipeline::builder`] matching the
/// public call contract.
///
/// # Errors
///
/// Propagates validation, bootstrap, warehouse, and operation
/// failures.
#[allow(clippy::too_many_arguments)]
pub async fn run_object_pipeline(
    warehouse: &dyn Warehouse,
    registry: &DependencyRegistry,
    source_table: impl Into<String>,
    source_query: Option<SourceRef>,
    output_name: impl Into<String>,
    operation: Arc<dyn MlOperation>,
    model: impl Into<ModelRef>,
    accept_filter: Option<AcceptFilter>,
    operation_config: OperationConfig,
    options: PipelineOptions,
) -> Result<PipelineReport, ReconflowError> {
    let mut builder = ObjectPipeline::builder(output_name)
        .source_table(source_table)
        .operation(operation)
        .model(model)
        .operation_config(operation_config)
        .options(options);
    if let Some(query) = source_query {
        builder = builder.source_query(query);
    }
    if let Some(filter) = accept_filter {
        builder = builder.accept_filter(filter);
    }
    builder.build()?.run(warehouse, registry).await
}
