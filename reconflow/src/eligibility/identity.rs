//! Identity-based eligibility with automatic retry of transient failures.

use std::collections::HashMap;
use tracing::warn;

use super::{BatchLimit, EligibilityPolicy};
use crate::row::{Row, RowKey, StatusClass, StatusClassifier, UniqueKey};

/// Unique-key anti-join plus a retryable-status predicate.
///
/// A source row is eligible iff its key does not exist in the output
/// (never processed) or the recorded output status is retryable. Rows
/// with terminal outcomes (success or permanent failure) are never
/// resubmitted.
#[derive(Debug, Clone)]
pub struct IdentityRetry {
    unique_key: UniqueKey,
    classifier: StatusClassifier,
}

impl IdentityRetry {
    /// Creates the policy.
    #[must_use]
    pub fn new(unique_key: UniqueKey, classifier: StatusClassifier) -> Self {
        Self {
            unique_key,
            classifier,
        }
    }

    fn output_classes(&self, output: &[Row]) -> HashMap<RowKey, StatusClass> {
        output
            .iter()
            .filter_map(|row| {
                row.key(&self.unique_key)
                    .map(|key| (key, self.classifier.classify(row)))
            })
            .collect()
    }
}

impl EligibilityPolicy for IdentityRetry {
    fn name(&self) -> &'static str {
        "identity_retry"
    }

    fn select(&self, source: &[Row], output: &[Row], cap: BatchLimit) -> Vec<Row> {
        let recorded = self.output_classes(output);

        let eligible: Vec<Row> = source
            .iter()
            .filter(|row| match row.key(&self.unique_key) {
                Some(key) => recorded
                    .get(&key)
                    .map_or(true, |class| class.is_retryable()),
                None => {
                    warn!(
                        unique_key = %self.unique_key,
                        "source row has no usable key, skipping"
                    );
                    false
                }
            })
            .cloned()
            .collect();

        cap.apply(eligible)
    }
}
