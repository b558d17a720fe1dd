//! Public pipeline surface.
//!
//! Thin parameterization layers over the one reconciliation engine:
//! [`StructuredPipeline`] runs general structured-row ML operations
//! under the identity-retry policy; [`ObjectPipeline`] runs
//! append-only object collections under the freshness-scan policy.

mod object;
mod options;
mod structured;

pub use object::{run_object_pipeline, ObjectPipeline};
pub use options::PipelineOptions;
pub use structured::{run_structured_pipeline, StructuredPipeline};

use serde::{Deserialize, Serialize};

use crate::engine::{BootstrapReport, RunReport};

/// Summary of one full pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// What bootstrap did.
    pub bootstrap: BootstrapReport,
    /// The convergence run, absent on the bootstrap invocation that
    /// created the output.
    pub run: Option<RunReport>,
}

impl PipelineReport {
    /// Returns true if this invocation created the output dataset.
    #[must_use]
    pub fn is_bootstrap_run(&self) -> bool {
        self.bootstrap.created
    }

    /// Total rows written by this invocation (seed plus loop).
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.bootstrap.rows_seeded + self.run.as_ref().map_or(0, |r| r.rows_written)
    }
}
