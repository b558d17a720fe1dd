//! Run outcomes and reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Terminal state of one convergence run.
///
/// All three are successful from the loop's own perspective. A
/// `TimedOut` run leaves the output partially updated and is expected
/// to be resumed by the next scheduled invocation, which skips
/// already-terminal rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopOutcome {
    /// An iteration wrote zero rows: no remaining work.
    Converged,
    /// The wall-clock budget elapsed with work remaining.
    TimedOut,
    /// The batch size was uncapped, so one unbounded pass was the
    /// entire job; no zero-written fixpoint was observed.
    SinglePass,
}

impl LoopOutcome {
    /// Returns true if the run observed convergence.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }

    /// Returns true if the run yielded on its time budget.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

impl fmt::Display for LoopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::TimedOut => write!(f, "timed_out"),
            Self::SinglePass => write!(f, "single_pass"),
        }
    }
}

/// Summary of one convergence run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// Terminal state.
    pub outcome: LoopOutcome,
    /// Number of iterations executed.
    pub iterations: usize,
    /// Total rows written across all iterations.
    pub rows_written: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: f64,
}
