//! Shared pipeline tuning options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::eligibility::BatchLimit;
use crate::engine::EngineConfig;

/// Default wall-clock budget for one loop, in seconds. Leaves
/// headroom inside a typical scheduler slot.
pub const DEFAULT_BATCH_DURATION_SECS: u64 = 600;

/// Tuning knobs shared by both pipeline kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    batch_limit: Option<BatchLimit>,
    batch_duration_secs: u64,
    seed_limit: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_limit: None,
            batch_duration_secs: DEFAULT_BATCH_DURATION_SECS,
            seed_limit: crate::engine::DEFAULT_SEED_LIMIT,
        }
    }
}

impl PipelineOptions {
    /// Creates options with defaults: the operation's catalogue batch
    /// limit, a ten-minute budget, and a ten-row seed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-iteration batch size. Negative disables capping.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_limit = Some(BatchLimit::from(batch_size));
        self
    }

    /// Sets the batch limit directly.
    #[must_use]
    pub fn with_batch_limit(mut self, limit: BatchLimit) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    /// Sets the wall-clock budget in seconds.
    #[must_use]
    pub fn with_batch_duration_secs(mut self, secs: u64) -> Self {
        self.batch_duration_secs = secs;
        self
    }

    /// Sets the bootstrap seed bound.
    #[must_use]
    pub fn with_seed_limit(mut self, seed_limit: usize) -> Self {
        self.seed_limit = seed_limit;
        self
    }

    /// Returns the configured batch limit, if overridden.
    #[must_use]
    pub fn batch_limit(&self) -> Option<BatchLimit> {
        self.batch_limit
    }

    /// Returns the seed bound.
    #[must_use]
    pub fn seed_limit(&self) -> usize {
        self.seed_limit
    }

    /// Resolves the loop configuration, falling back to the
    /// operation's default batch limit.
    #[must_use]
    pub fn engine_config(&self, default_limit: BatchLimit) -> EngineConfig {
        EngineConfig::new(
            self.batch_limit.unwrap_or(default_limit),
            Duration::from_secs(self.batch_duration_secs),
        )
    }
}
