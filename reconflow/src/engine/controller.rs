//! The convergence loop controller.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use super::{LoopOutcome, RunReport};
use crate::dataset::{SourceRef, Warehouse};
use crate::eligibility::{BatchLimit, EligibilityPolicy};
use crate::errors::ReconflowError;
use crate::merge::MergeWriter;
use crate::operation::BatchInvoker;

/// Immutable per-run loop parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cap on rows considered per iteration.
    pub batch_limit: BatchLimit,
    /// Wall-clock ceiling for the whole loop.
    pub batch_duration: Duration,
}

impl EngineConfig {
    /// Creates a loop configuration.
    #[must_use]
    pub fn new(batch_limit: BatchLimit, batch_duration: Duration) -> Self {
        Self {
            batch_limit,
            batch_duration,
        }
    }
}

/// Drives eligibility, invocation, and merge until convergence or
/// budget exhaustion.
///
/// Single-threaded and iteration-synchronous: no iteration starts
/// before the previous one's merge has returned, and each iteration's
/// eligibility pass observes the output state committed by the
/// previous iteration's merge. At most one loop per output may run at
/// a time; the upsert is only safe under one-writer-at-a-time
/// discipline, which the wall-clock budget bounds in lieu of locking.
pub struct ConvergenceLoop {
    source: SourceRef,
    policy: Arc<dyn EligibilityPolicy>,
    invoker: BatchInvoker,
    writer: MergeWriter,
    config: EngineConfig,
}

impl ConvergenceLoop {
    /// Creates a loop over the given source and output.
    #[must_use]
    pub fn new(
        source: SourceRef,
        policy: Arc<dyn EligibilityPolicy>,
        invoker: BatchInvoker,
        writer: MergeWriter,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            policy,
            invoker,
            writer,
            config,
        }
    }

    /// Runs the loop to a terminal state.
    ///
    /// With a capped batch size, iterates until an iteration writes
    /// zero rows (`Converged`) or the elapsed time since loop entry
    /// reaches the budget (`TimedOut`). An uncapped batch size
    /// degenerates to a single unbounded pass (`SinglePass`): capping
    /// is what makes repetition meaningful.
    ///
    /// # Errors
    ///
    /// Warehouse and operation contract failures abort the run; the
    /// output keeps the state of the last completed merge.
    pub async fn run(&self, warehouse: &dyn Warehouse) -> Result<RunReport, ReconflowError> {
        let run_id = Uuid::new_v4();
        // Fixed at loop entry, never re-read per iteration.
        let started = Instant::now();

        info!(
            %run_id,
            source = %self.source,
            output = self.writer.output(),
            policy = self.policy.name(),
            batch_limit = %self.config.batch_limit,
            budget_secs = self.config.batch_duration.as_secs(),
            "reconciliation run started"
        );

        let mut iterations = 0usize;
        let mut rows_written = 0usize;

        let outcome = if self.config.batch_limit.is_unlimited() {
            let written = self.iterate(warehouse).await?;
            iterations = 1;
            rows_written = written;
            LoopOutcome::SinglePass
        } else {
            loop {
                let written = self.iterate(warehouse).await?;
                iterations += 1;
                rows_written += written;
                debug!(
                    %run_id,
                    iteration = iterations,
                    written,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "iteration complete"
                );

                if written == 0 {
                    break LoopOutcome::Converged;
                }
                if started.elapsed() >= self.config.batch_duration {
                    break LoopOutcome::TimedOut;
                }
            }
        };

        let report = RunReport {
            run_id,
            outcome,
            iterations,
            rows_written,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        info!(
            %run_id,
            outcome = %report.outcome,
            iterations = report.iterations,
            rows_written = report.rows_written,
            "reconciliation run finished"
        );
        Ok(report)
    }

    /// One eligibility-invoke-merge round. Returns rows written.
    async fn iterate(&self, warehouse: &dyn Warehouse) -> Result<usize, ReconflowError> {
        let source_rows = warehouse.scan(self.source.name()).await?;
        let output_rows = warehouse.scan(self.writer.output()).await?;

        let eligible = self
            .policy
            .select(&source_rows, &output_rows, self.config.batch_limit);
        if eligible.is_empty() {
            return Ok(0);
        }

        let candidates = self.invoker.invoke(&eligible).await?;
        let written = self.writer.merge(warehouse, candidates).await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MemoryWarehouse;
    use crate::eligibility::IdentityRetry;
    use crate::merge::AcceptFilter;
    use crate::operation::{ModelRef, OperationKind};
    use crate::row::{Row, StatusClassifier, UniqueKey};
    use crate::testing::{text_row, MockOperation};
    use serde_json::json;

    const STATUS: &str = "generate_text_status";

    fn build_loop(
        operation: Arc<MockOperation>,
        batch_limit: BatchLimit,
        budget: Duration,
    ) -> ConvergenceLoop {
        let unique_key = UniqueKey::single("id");
        let classifier = StatusClassifier::new(STATUS);
        ConvergenceLoop::new(
            SourceRef::new("src"),
            Arc::new(IdentityRetry::new(unique_key.clone(), classifier.clone())),
            BatchInvoker::new(operation, ModelRef::new("summary_model")),
            MergeWriter::new("out", unique_key, AcceptFilter::not_retryable(classifier)),
            EngineConfig::new(batch_limit, budget),
        )
    }

    async fn warehouse_with_source(rows: Vec<Row>) -> MemoryWarehouse {
        let warehouse =
            MemoryWarehouse::new().with_table("src", UniqueKey::single("id"), rows);
        warehouse
            .create_table("out", &UniqueKey::single("id"), vec![])
            .await
            .unwrap();
        warehouse
    }

    #[tokio::test]
    async fn test_empty_source_converges_immediately() {
        let warehouse = warehouse_with_source(vec![]).await;
        let operation = Arc::new(MockOperation::new(OperationKind::GenerateText));
        let driver = build_loop(operation, BatchLimit::Rows(10), Duration::from_secs(60));

        let report = driver.run(&warehouse).await.unwrap();
        assert_eq!(report.outcome, LoopOutcome::Converged);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.rows_written, 0);
    }

    #[tokio::test]
    async fn test_converges_in_bounded_iterations() {
        // 5 rows, batch of 2: three writing passes plus the
        // zero-written pass that proves convergence.
        let rows = (0..5).map(|i| text_row(&format!("r{i}"), "body")).collect();
        let warehouse = warehouse_with_source(rows).await;
        let operation = Arc::new(MockOperation::new(OperationKind::GenerateText));
        let driver = build_loop(
            operation.clone(),
            BatchLimit::Rows(2),
            Duration::from_secs(60),
        );

        let report = driver.run(&warehouse).await.unwrap();
        assert_eq!(report.outcome, LoopOutcome::Converged);
        assert_eq!(report.rows_written, 5);
        assert_eq!(report.iterations, 4);
        assert_eq!(warehouse.row_count("out"), Some(5));
    }

    #[tokio::test]
    async fn test_uncapped_is_a_single_pass() {
        let rows = (0..5).map(|i| text_row(&format!("r{i}"), "body")).collect();
        let warehouse = warehouse_with_source(rows).await;
        let operation = Arc::new(MockOperation::new(OperationKind::GenerateText));
        let driver = build_loop(
            operation.clone(),
            BatchLimit::Unlimited,
            Duration::from_secs(60),
        );

        let report = driver.run(&warehouse).await.unwrap();
        assert_eq!(report.outcome, LoopOutcome::SinglePass);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.rows_written, 5);
        assert_eq!(operation.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_times_out_after_first_write() {
        let rows = (0..5).map(|i| text_row(&format!("r{i}"), "body")).collect();
        let warehouse = warehouse_with_source(rows).await;
        let operation = Arc::new(MockOperation::new(OperationKind::GenerateText));
        let driver = build_loop(operation, BatchLimit::Rows(2), Duration::ZERO);

        let report = driver.run(&warehouse).await.unwrap();
        assert_eq!(report.outcome, LoopOutcome::TimedOut);
        assert_eq!(report.iterations, 1);
        // Only the fully merged first batch landed.
        assert_eq!(warehouse.row_count("out"), Some(2));
    }

    #[tokio::test]
    async fn test_eligibility_observes_previous_merge() {
        let rows = vec![text_row("a", "x"), text_row("b", "y")];
        let warehouse = warehouse_with_source(rows).await;
        let operation = Arc::new(MockOperation::new(OperationKind::GenerateText));
        let driver = build_loop(
            operation.clone(),
            BatchLimit::Rows(1),
            Duration::from_secs(60),
        );

        let report = driver.run(&warehouse).await.unwrap();
        assert_eq!(report.rows_written, 2);
        // Each row processed exactly once: batches of 1, then the
        // empty proving pass.
        assert_eq!(operation.rows_seen(), 2);
    }

    #[tokio::test]
    async fn test_missing_output_table_fails() {
        let warehouse = MemoryWarehouse::new().with_table(
            "src",
            UniqueKey::single("id"),
            vec![text_row("a", "x")],
        );
        let operation = Arc::new(MockOperation::new(OperationKind::GenerateText));
        let driver = build_loop(operation, BatchLimit::Rows(1), Duration::from_secs(60));

        let result = driver.run(&warehouse).await;
        assert!(matches!(result, Err(ReconflowError::Warehouse(_))));
    }

    #[tokio::test]
    async fn test_rows_without_payload_still_flow() {
        let warehouse =
            warehouse_with_source(vec![Row::new().with("id", json!("only-key"))]).await;
        let operation = Arc::new(MockOperation::new(OperationKind::GenerateText));
        let driver = build_loop(operation, BatchLimit::Rows(10), Duration::from_secs(60));

        let report = driver.run(&warehouse).await.unwrap();
        assert_eq!(report.rows_written, 1);
    }
}
