//! The external ML operation seam.
//!
//! Operations are remote, quota-limited, per-row inference calls.
//! The engine only knows their catalogue metadata (status column,
//! default batch limit) and the [`MlOperation`] call contract: one
//! result row per input row, each annotated with a status column.

mod catalogue;
mod config;
mod invoker;

pub use catalogue::OperationKind;
pub use config::OperationConfig;
pub use invoker::BatchInvoker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::OperationError;
use crate::row::Row;

/// A reference to the remote model backing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef(String);

impl ModelRef {
    /// Creates a model reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An external per-row operation.
///
/// Implementations must return exactly one result row per input row,
/// carrying the operation payload plus the status column named by
/// [`OperationKind::status_column`]. Per-row failures are status
/// values, not errors; `Err` is reserved for batch-level contract
/// violations.
#[async_trait]
pub trait MlOperation: Send + Sync {
    /// The catalogue entry this operation implements.
    fn kind(&self) -> OperationKind;

    /// Applies the operation to a batch of rows.
    async fn apply(
        &self,
        model: &ModelRef,
        rows: &[Row],
        config: &OperationConfig,
    ) -> Result<Vec<Row>, OperationError>;
}
