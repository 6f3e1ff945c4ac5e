//! Reconciliation: verify the materialized item total against the sum of
//! its per-warehouse rows.

use serde::{Deserialize, Serialize};

use stocksmith_core::{DomainError, DomainResult, ItemId};

use crate::ledger::{StockLedger, total_of, total_row_mut, warehouse_sum};

/// Outcome of checking one item.
///
/// `delta` is `total - warehouse_sum`: positive means the materialized
/// total over-reports, negative means it under-reports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub item: ItemId,
    pub total: u64,
    pub warehouse_sum: u64,
    pub delta: i64,
    pub consistent: bool,
}

impl ReconciliationReport {
    fn new(item: ItemId, total: u64, warehouse_sum: u64) -> Self {
        Self {
            item,
            total,
            warehouse_sum,
            delta: total as i64 - warehouse_sum as i64,
            consistent: total == warehouse_sum,
        }
    }

    /// The drift as a domain error, if there is any — for callers that
    /// escalate instead of reporting.
    pub fn drift(&self) -> Option<DomainError> {
        (!self.consistent).then(|| DomainError::ReconciliationDrift {
            item: self.item,
            total: self.total,
            warehouse_sum: self.warehouse_sum,
        })
    }
}

impl StockLedger {
    /// Read-only drift check for one item, from a single consistent
    /// snapshot. Detected drift is reported, never fixed here: silent
    /// auto-repair would mask a broken write path.
    pub fn check(&self, item: ItemId) -> DomainResult<ReconciliationReport> {
        let state = self.read()?;
        Ok(ReconciliationReport::new(
            item,
            total_of(&state, item),
            warehouse_sum(&state, item),
        ))
    }

    /// Recompute the materialized total from the per-warehouse sum and
    /// overwrite it. Privileged, explicitly administrative; returns the
    /// post-repair report (always consistent).
    pub fn repair(&self, item: ItemId) -> DomainResult<ReconciliationReport> {
        let mut state = self.write()?;
        let sum = warehouse_sum(&state, item);
        let total = total_of(&state, item);
        if total != sum {
            tracing::warn!(
                %item, total, warehouse_sum = sum,
                "repairing reconciliation drift"
            );
            *total_row_mut(&mut state, item) = sum;
        }
        Ok(ReconciliationReport::new(item, sum, sum))
    }
}
