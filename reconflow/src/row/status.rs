//! Retryable-status classification over operation status columns.
//!
//! Every external operation annotates each result row with a status
//! column (`<operation>_status`). An empty or absent status means the
//! row succeeded. A status matching the retryable pattern means the
//! provider reported a transient failure and the row is safe to
//! reattempt. Anything else is a terminal failure and is written to
//! the output as-is so it never re-enters the eligibility set.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Row;

/// The textual marker providers use for transient per-row failures.
pub const RETRYABLE_ERROR_PATTERN: &str = "A retryable error occurred";

/// Classification of a row's recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// The operation succeeded for this row.
    Success,
    /// A transient failure; the row is safe to reattempt.
    Retryable,
    /// A permanent failure; the row must not be reattempted.
    Terminal,
}

impl StatusClass {
    /// Returns true if the row may be resubmitted to the operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable)
    }

    /// Returns true if the outcome must not be reattempted.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Terminal)
    }

    /// Returns true if the row succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Retryable => write!(f, "retryable"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Classifies rows by their operation status column.
#[derive(Debug, Clone)]
pub struct StatusClassifier {
    column: String,
    pattern: Regex,
}

impl StatusClassifier {
    /// Creates a classifier over the given status column using the
    /// standard retryable pattern.
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        // The escaped literal is always a valid regex.
        #[allow(clippy::expect_used)]
        let pattern = Regex::new(&regex::escape(RETRYABLE_ERROR_PATTERN))
            .expect("static retryable pattern compiles");
        Self {
            column: column.into(),
            pattern,
        }
    }

    /// Replaces the retryable pattern.
    ///
    /// # Errors
    ///
    /// Returns a regex error if the pattern does not compile.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Regex::new(pattern)?;
        Ok(self)
    }

    /// Returns the status column this classifier reads.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Classifies a row.
    ///
    /// A missing or null status column classifies as success: absence
    /// of an error is success, which keeps seeded rows and rows
    /// written by other writers out of the eligibility set.
    #[must_use]
    pub fn classify(&self, row: &Row) -> StatusClass {
        match row.get(&self.column) {
            None | Some(serde_json::Value::Null) => StatusClass::Success,
            Some(serde_json::Value::String(s)) if s.is_empty() => StatusClass::Success,
            Some(serde_json::Value::String(s)) if self.pattern.is_match(s) => {
                StatusClass::Retryable
            }
            Some(_) => StatusClass::Terminal,
        }
    }

    /// Returns true if the row's recorded status is retryable.
    #[must_use]
    pub fn is_retryable(&self, row: &Row) -> bool {
        self.classify(row).is_retryable()
    }
}
