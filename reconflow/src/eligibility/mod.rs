//! Eligibility policies: which rows still need (re)processing.
//!
//! The two policies are modeled as one trait with one method, selected
//! by pipeline kind. [`IdentityRetry`] serves structured-row ML
//! pipelines; [`FreshnessScan`] serves append-heavy object
//! collections. Both recompute the eligibility set from the current
//! source and output state every iteration; nothing here is persisted.

mod freshness;
mod identity;
mod limit;

pub use freshness::FreshnessScan;
pub use identity::IdentityRetry;
pub use limit::BatchLimit;

use crate::row::Row;

/// Computes the subset of source rows eligible for this iteration.
pub trait EligibilityPolicy: Send + Sync {
    /// A short policy name for logging.
    fn name(&self) -> &'static str;

    /// Selects eligible rows given the current source and output
    /// snapshots, truncated to `cap`.
    ///
    /// Selection order is unspecified; correctness must not depend on
    /// which eligible rows land inside the cap, only on convergence
    /// over iterations.
    fn select(&self, source: &[Row], output: &[Row], cap: BatchLimit) -> Vec<Row>;
}
