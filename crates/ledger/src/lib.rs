//! `stocksmith-ledger` — per-warehouse stock with a materialized item total.
//!
//! The item total is a cache of a derived value (the sum of that item's
//! per-warehouse rows). Every write path adjusts a row and the total as one
//! atomic unit, so the reconciliation invariant
//! `sum(rows of item) == total(item)` holds at every commit boundary.
//! Drift can only be introduced from outside (`overwrite_at`), and is
//! surfaced — never silently fixed — by the reconciliation checker.

pub mod ledger;
pub mod reconcile;

pub use ledger::{RowGuard, StockDelta, StockLedger, StockStore, StockView};
pub use reconcile::ReconciliationReport;
