//! The reconciliation engine: bootstrap and the convergence loop.
//!
//! The reference system expresses this loop as engine-native
//! repeat/until control flow; here it is hoisted into an explicit
//! host-language loop that issues one scan-invoke-merge round per
//! iteration, which keeps it testable and independent of any engine
//! scripting dialect.

mod bootstrap;
mod controller;
mod report;

pub use bootstrap::{BootstrapReport, Bootstrapper, DEFAULT_SEED_LIMIT};
pub use controller::{ConvergenceLoop, EngineConfig};
pub use report::{LoopOutcome, RunReport};
