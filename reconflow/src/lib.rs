//! # Reconflow
//!
//! An incremental batch-reconciliation engine for applying external,
//! quota-limited, partially-unreliable ML operations to datasets.
//!
//! Reconflow repeatedly selects the rows that still need processing,
//! invokes the external operation on a bounded batch, and upserts
//! accepted results into an output dataset keyed by identity, until
//! an iteration writes zero rows (convergence) or a wall-clock budget
//! is exhausted. Rows whose prior attempt failed transiently are
//! retried automatically; rows with terminal outcomes are never
//! resubmitted.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reconflow::prelude::*;
//!
//! let report = StructuredPipeline::builder("reviews_summarized")
//!     .unique_key(UniqueKey::single("review_id"))
//!     .operation(operation)
//!     .model("summary_model")
//!     .source("reviews")
//!     .operation_config(OperationConfig::new().with("prompt", "Summarize the review"))
//!     .options(PipelineOptions::new().with_batch_size(100))
//!     .build()?
//!     .run(&warehouse, &registry)
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod dataset;
pub mod eligibility;
pub mod engine;
pub mod errors;
pub mod merge;
pub mod observability;
pub mod operation;
pub mod pipeline;
pub mod publication;
pub mod row;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dataset::{MemoryWarehouse, SourceRef, Warehouse};
    pub use crate::eligibility::{
        BatchLimit, EligibilityPolicy, FreshnessScan, IdentityRetry,
    };
    pub use crate::engine::{
        BootstrapReport, Bootstrapper, ConvergenceLoop, EngineConfig, LoopOutcome, RunReport,
    };
    pub use crate::errors::{
        OperationError, ReconflowError, ValidationError, WarehouseError,
    };
    pub use crate::merge::{AcceptFilter, MergeWriter};
    pub use crate::operation::{
        BatchInvoker, MlOperation, ModelRef, OperationConfig, OperationKind,
    };
    pub use crate::pipeline::{
        run_object_pipeline, run_structured_pipeline, ObjectPipeline, PipelineOptions,
        PipelineReport, StructuredPipeline,
    };
    pub use crate::publication::{DependencyRegistry, PublicationSpec};
    pub use crate::row::{Row, RowKey, StatusClass, StatusClassifier, UniqueKey};
}
