//! Freshness-based eligibility for append-heavy object collections.

use std::collections::HashMap;
use tracing::warn;

use super::{BatchLimit, EligibilityPolicy};
use crate::row::{Row, RowKey, StatusClass, StatusClassifier, UniqueKey};
use crate::utils::{parse_freshness, Timestamp};

/// Key absence, freshness advancement, or a recorded retryable status.
///
/// A source object is eligible iff its key is absent from the output,
/// its freshness timestamp exceeds the maximum recorded in the output
/// (a replaced or re-uploaded object), or, with the retry term
/// enabled (the default), its recorded status is retryable. The retry
/// term makes transient failures recoverable without a re-upload,
/// matching the retry guarantee of the identity policy;
/// [`FreshnessScan::without_retry_term`] restores the strict
/// timestamp-only historical behavior.
#[derive(Debug, Clone)]
pub struct FreshnessScan {
    unique_key: UniqueKey,
    updated_column: String,
    classifier: StatusClassifier,
    retry_term: bool,
}

impl FreshnessScan {
    /// Creates the policy with the retry term enabled.
    #[must_use]
    pub fn new(
        unique_key: UniqueKey,
        updated_column: impl Into<String>,
        classifier: StatusClassifier,
    ) -> Self {
        Self {
            unique_key,
            updated_column: updated_column.into(),
            classifier,
            retry_term: true,
        }
    }

    /// Disables the retryable-status term: only key absence and
    /// freshness advancement surface work.
    #[must_use]
    pub fn without_retry_term(mut self) -> Self {
        self.retry_term = false;
        self
    }

    /// Returns the freshness column name.
    #[must_use]
    pub fn updated_column(&self) -> &str {
        &self.updated_column
    }

    /// The maximum freshness timestamp recorded in the output.
    fn high_water_mark(&self, output: &[Row]) -> Option<Timestamp> {
        output
            .iter()
            .filter_map(|row| row.get(&self.updated_column).and_then(parse_freshness))
            .max()
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

impl EligibilityPolicy for FreshnessScan {
    fn name(&self) -> &'static str {
        "freshness_scan"
    }

    fn select(&self, source: &[Row], output: &[Row], cap: BatchLimit) -> Vec<Row> {
        let high_water = self.high_water_mark(output);
        let recorded = self.output_classes(output);

        let eligible: Vec<Row> = source
            .iter()
            .filter(|row| {
                let Some(key) = row.key(&self.unique_key) else {
                    warn!(
                        unique_key = %self.unique_key,
                        "source object has no usable key, skipping"
                    );
                    return false;
                };

                let Some(class) = recorded.get(&key) else {
                    return true;
                };

                let freshness = row.get(&self.updated_column).and_then(parse_freshness);
                let advanced = match (freshness, high_water) {
                    (Some(updated), Some(mark)) => updated > mark,
                    // No recorded mark yet: anything with a timestamp counts as new.
                    (Some(_), None) => true,
                    (None, _) => false,
                };

                advanced || (self.retry_term && class.is_retryable())
            })
            .cloned()
            .collect();

        cap.apply(eligible)
    }
}
