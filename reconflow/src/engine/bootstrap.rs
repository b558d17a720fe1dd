//! One-time pipeline initialization.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::{SourceRef, Warehouse};
use crate::errors::ReconflowError;
use crate::merge::AcceptFilter;
use crate::operation::BatchInvoker;
use crate::publication::{DependencyRegistry, PublicationSpec};

/// Default number of rows in the bootstrap seed slice.
pub const DEFAULT_SEED_LIMIT: usize = 10;

/// What the bootstrapper did on this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    /// True if the output dataset was created by this call.
    pub created: bool,
    /// Rows written into the newly created output.
    pub rows_seeded: usize,
}

/// Declares dependencies and creates the output dataset if absent.
///
/// Safe to run on every pipeline invocation: dependency declaration
/// is idempotent and creation is a no-op when the output exists. The
/// seed slice is deliberately small and independent of the batch size
/// so the first scheduled run never risks a full-size operation
/// before the dependency graph and output schema exist.
#[derive(Debug, Clone)]
pub struct Bootstrapper {
    spec: PublicationSpec,
    source: SourceRef,
    filter: AcceptFilter,
    seed_limit: usize,
}

impl Bootstrapper {
    /// Creates a bootstrapper for the given publication.
    #[must_use]
    pub fn new(spec: PublicationSpec, source: SourceRef, filter: AcceptFilter) -> Self {
        Self {
            spec,
            source,
            filter,
            seed_limit: DEFAULT_SEED_LIMIT,
        }
    }

    /// Sets the seed slice bound.
    #[must_use]
    pub fn with_seed_limit(mut self, seed_limit: usize) -> Self {
        self.seed_limit = seed_limit;
        self
    }

    /// Declares dependencies and creates the output if absent.
    ///
    /// # Errors
    ///
    /// Every failure here is fatal: nothing has been merged yet, so
    /// there is no partial state to reconcile.
    pub async fn bootstrap(
        &self,
        warehouse: &dyn Warehouse,
        registry: &DependencyRegistry,
        invoker: &BatchInvoker,
    ) -> Result<BootstrapReport, ReconflowError> {
        registry.declare(self.source.name());
        registry.declare(invoker.model().name());
        for dependency in self.spec.dependencies() {
            registry.declare(dependency.clone());
        }

        if warehouse.table_exists(self.spec.name()).await? {
            debug!(output = self.spec.name(), "output exists, bootstrap is a no-op");
            return Ok(BootstrapReport {
                created: false,
                rows_seeded: 0,
            });
        }

        let mut seed = warehouse.scan(self.source.name()).await?;
        seed.truncate(self.seed_limit);

        let candidates = invoker.invoke(&seed).await?;
        let accepted: Vec<_> = candidates
            .into_iter()
            .filter(|row| self.filter.accepts(row))
            .collect();

        let rows_seeded = warehouse
            .create_table(self.spec.name(), self.spec.unique_key(), accepted)
            .await
            .map_err(|err| {
                ReconflowError::Bootstrap(format!(
                    "cannot create output '{}': {err}",
                    self.spec.name()
                ))
            })?;

        info!(
            output = self.spec.name(),
            rows_seeded,
            seed_limit = self.seed_limit,
            "output dataset created"
        );
        Ok(BootstrapReport {
            created: true,
            rows_seeded,
        })
    }
}
