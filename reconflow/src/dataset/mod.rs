//! Dataset storage: the query-execution collaborator seam.
//!
//! The engine never talks to a warehouse dialect directly; it issues
//! scans, creates, and keyed merges through the [`Warehouse`] trait.
//! [`MemoryWarehouse`] is the reference implementation used by tests
//! and benchmarks.

mod memory;
mod warehouse;

pub use memory::MemoryWarehouse;
pub use warehouse::{SourceRef, Warehouse};
