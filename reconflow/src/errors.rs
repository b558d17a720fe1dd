//! Error types for the reconflow engine.
//!
//! Row-level failures are data, not errors: they travel through the
//! output dataset as status columns and are recovered by the next
//! iteration's eligibility pass. The types here cover the hard
//! failures only: bootstrap problems, warehouse statement failures,
//! and operation-contract violations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for reconflow operations.
#[derive(Debug, Error)]
pub enum ReconflowError {
    /// A configuration validation error occurred.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Bootstrap failed before any state was merged.
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    /// A warehouse statement failed.
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    /// The external operation violated its contract.
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ReconflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when pipeline configuration is invalid.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// The error message.
    pub message: String,
    /// The configuration field involved, if known.
    pub field: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    /// Sets the configuration field involved.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Errors surfaced by the query-execution collaborator.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum WarehouseError {
    /// The referenced table does not exist.
    #[error("Table not found: {name}")]
    TableNotFound {
        /// The table name.
        name: String,
    },

    /// A table with this name already exists.
    #[error("Table already exists: {name}")]
    TableAlreadyExists {
        /// The table name.
        name: String,
    },

    /// A row is missing one of its unique-key columns.
    #[error("Row in '{table}' is missing key column '{column}'")]
    MissingKeyColumn {
        /// The table being written.
        table: String,
        /// The missing column.
        column: String,
    },

    /// A statement failed at the engine level (connectivity, syntax,
    /// permission, or a hard statement timeout).
    #[error("Statement failed: {message}")]
    Statement {
        /// The failure detail.
        message: String,
    },
}

impl WarehouseError {
    /// Creates a statement failure.
    #[must_use]
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the external ML operation collaborator.
///
/// Per-row failures are NOT represented here; they arrive as status
/// column values on result rows. These variants cover violations of
/// the batch-level contract.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum OperationError {
    /// The operation returned a different number of result rows than
    /// input rows.
    #[error("Operation '{operation}' returned {actual} rows for {expected} inputs")]
    CardinalityMismatch {
        /// The operation name.
        operation: String,
        /// Number of input rows.
        expected: usize,
        /// Number of result rows.
        actual: usize,
    },

    /// The provider rejected the whole batch.
    #[error("Operation '{operation}' failed: {message}")]
    Provider {
        /// The operation name.
        operation: String,
        /// The failure detail.
        message: String,
    },

    /// The operation configuration is not serializable or not accepted.
    #[error("Invalid operation config: {message}")]
    InvalidConfig {
        /// The failure detail.
        message: String,
    },
}
