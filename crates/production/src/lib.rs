//! `stocksmith-production` — production-run orchestration.
//!
//! A run explodes the target item's BOM, deducts component stock from the
//! selected warehouses and credits the finished good, all as one
//! all-or-nothing ledger transaction. Validation is side-effect free, so an
//! abandoned or rejected request leaves the ledger untouched.

pub mod executor;
pub mod run;

pub use executor::{ProductionExecutor, ProductionRequest, RunState, SourceSelection, ValidatedPlan};
pub use run::{MemoryRunStore, ProductionRun, RunStore};
