//! Per-iteration batch cap.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::row::Row;

/// Cap on rows considered per iteration.
///
/// Capping is what makes repetition meaningful: an uncapped pass
/// already covers every eligible row, so the controller runs it as a
/// single pass instead of a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchLimit {
    /// No cap; the whole eligibility set is processed in one pass.
    Unlimited,
    /// At most this many rows per iteration.
    Rows(usize),
}

impl BatchLimit {
    /// Returns true if no cap applies.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Truncates an eligibility set to the cap.
    #[must_use]
    pub fn apply(&self, mut rows: Vec<Row>) -> Vec<Row> {
        if let Self::Rows(cap) = self {
            rows.truncate(*cap);
        }
        rows
    }
}

impl From<i64> for BatchLimit {
    /// Negative values disable capping.
    fn from(value: i64) -> Self {
        if value < 0 {
            Self::Unlimited
        } else {
            Self::Rows(value as usize)
        }
    }
}

impl fmt::Display for BatchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Rows(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row::new().with("id", json!(i.to_string())))
            .collect()
    }

    #[test]
    fn test_from_negative_is_unlimited() {
        assert_eq!(BatchLimit::from(-1), BatchLimit::Unlimited);
        assert!(BatchLimit::from(-100).is_unlimited());
    }

    #[test]
    fn test_from_non_negative() {
        assert_eq!(BatchLimit::from(0), BatchLimit::Rows(0));
        assert_eq!(BatchLimit::from(25), BatchLimit::Rows(25));
    }

    #[test]
    fn test_apply_truncates() {
        assert_eq!(BatchLimit::Rows(2).apply(rows(5)).len(), 2);
        assert_eq!(BatchLimit::Rows(10).apply(rows(5)).len(), 5);
        assert_eq!(BatchLimit::Unlimited.apply(rows(5)).len(), 5);
    }

    #[test]
    fn test_display() {
        assert_eq!(BatchLimit::Unlimited.to_string(), "unlimited");
        assert_eq!(BatchLimit::Rows(40).to_string(), "40");
    }
}
