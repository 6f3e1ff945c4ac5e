use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use stocksmith_core::{DomainError, DomainResult, ExpectedVersion, ItemId, WarehouseId};

/// One requested adjustment to a (item, warehouse) row. Negative deducts,
/// positive credits; the item total moves by the same amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    pub item: ItemId,
    pub warehouse: WarehouseId,
    pub delta: i64,
}

/// Version expectation for one row, taken from an earlier snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RowGuard {
    pub item: ItemId,
    pub warehouse: WarehouseId,
    pub expected: ExpectedVersion,
}

/// Consistent read of one row: quantity plus the version to guard a later
/// write with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockView {
    pub item: ItemId,
    pub warehouse: WarehouseId,
    pub quantity: u64,
    pub version: u64,
}

#[derive(Debug, Default, Copy, Clone)]
struct Row {
    quantity: u64,
    version: u64,
}

#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    totals: HashMap<ItemId, Row>,
    rows: HashMap<(ItemId, WarehouseId), Row>,
}

impl LedgerState {
    fn row(&self, item: ItemId, warehouse: WarehouseId) -> Row {
        self.rows
            .get(&(item, warehouse))
            .copied()
            .unwrap_or_default()
    }

    fn total(&self, item: ItemId) -> Row {
        self.totals.get(&item).copied().unwrap_or_default()
    }
}

/// Per-warehouse stock ledger with a materialized per-item total.
///
/// Absent rows read as zero. All mutation happens under a single writer
/// lock over the whole ledger, which is the in-memory analogue of taking
/// row locks in one fixed global order: two concurrent production runs
/// sharing components serialize here instead of deadlocking.
#[derive(Debug, Default)]
pub struct StockLedger {
    state: RwLock<LedgerState>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialized total for an item across all warehouses.
    pub fn total(&self, item: ItemId) -> u64 {
        self.state
            .read()
            .map(|s| s.total(item).quantity)
            .unwrap_or(0)
    }

    /// Quantity on hand in one warehouse.
    pub fn at(&self, item: ItemId, warehouse: WarehouseId) -> u64 {
        self.state
            .read()
            .map(|s| s.row(item, warehouse).quantity)
            .unwrap_or(0)
    }

    /// Read a set of rows under one shared lock (a consistent snapshot),
    /// including the versions needed to guard a later `apply_all`.
    pub fn snapshot(&self, keys: &[(ItemId, WarehouseId)]) -> DomainResult<Vec<StockView>> {
        let state = self.read()?;
        Ok(keys
            .iter()
            .map(|&(item, warehouse)| {
                let row = state.row(item, warehouse);
                StockView {
                    item,
                    warehouse,
                    quantity: row.quantity,
                    version: row.version,
                }
            })
            .collect())
    }

    /// Adjust one row and the item total as a single atomic unit.
    ///
    /// Both move together or neither moves. Fails with `InsufficientStock`
    /// if the row or the total would go below zero.
    pub fn apply(&self, item: ItemId, warehouse: WarehouseId, delta: i64) -> DomainResult<()> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }
        self.apply_all(&[StockDelta { item, warehouse, delta }], &[])
    }

    /// Apply a batch of deltas as one all-or-nothing transaction.
    ///
    /// Order of operations under the writer lock:
    /// 1. every `guard` is checked against the current row version — a
    ///    mismatch is `ConcurrentModification` and nothing is written;
    /// 2. every delta is staged against a scratch copy, in input order —
    ///    the first row or total that would go negative rejects the whole
    ///    batch with `InsufficientStock`, and nothing is written;
    /// 3. only then is the staged state committed, bumping the version of
    ///    every touched row and total.
    pub fn apply_all(&self, deltas: &[StockDelta], guards: &[RowGuard]) -> DomainResult<()> {
        let mut state = self.write()?;

        for guard in guards {
            let actual = state.row(guard.item, guard.warehouse).version;
            guard.expected.check(actual).map_err(|_| {
                DomainError::concurrent(format!(
                    "stock row for item {} in warehouse {} changed since validation",
                    guard.item, guard.warehouse
                ))
            })?;
        }

        // Stage against scratch copies; commit only if every delta fits.
        let mut staged_rows: HashMap<(ItemId, WarehouseId), u64> = HashMap::new();
        let mut staged_totals: HashMap<ItemId, u64> = HashMap::new();

        for d in deltas {
            if d.delta == 0 {
                continue;
            }
            let key = (d.item, d.warehouse);
            let row_qty = *staged_rows
                .entry(key)
                .or_insert_with(|| state.row(d.item, d.warehouse).quantity);
            let total_qty = *staged_totals
                .entry(d.item)
                .or_insert_with(|| state.total(d.item).quantity);

            let new_row = shift(row_qty, d.delta).ok_or_else(|| row_shortfall(d, row_qty))?;
            let new_total =
                shift(total_qty, d.delta).ok_or_else(|| total_shortfall(&state, d))?;

            staged_rows.insert(key, new_row);
            staged_totals.insert(d.item, new_total);
        }

        for ((item, warehouse), quantity) in staged_rows {
            let row = state.rows.entry((item, warehouse)).or_default();
            row.quantity = quantity;
            row.version += 1;
        }
        for (item, quantity) in staged_totals {
            let total = state.totals.entry(item).or_default();
            total.quantity = quantity;
            total.version += 1;
        }

        Ok(())
    }

    /// Overwrite one warehouse row **without** touching the item total.
    ///
    /// Administrative escape hatch: this is how external repair tooling
    /// (and tests) model an unsynchronized write path. The resulting drift
    /// is exactly what the reconciliation checker exists to surface.
    pub fn overwrite_at(
        &self,
        item: ItemId,
        warehouse: WarehouseId,
        quantity: u64,
    ) -> DomainResult<()> {
        let mut state = self.write()?;
        let row = state.rows.entry((item, warehouse)).or_default();
        tracing::warn!(
            %item, %warehouse, from = row.quantity, to = quantity,
            "overwriting warehouse stock row outside the transactional path"
        );
        row.quantity = quantity;
        row.version += 1;
        Ok(())
    }

    pub(crate) fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| DomainError::concurrent("ledger lock poisoned"))
    }

    pub(crate) fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| DomainError::concurrent("ledger lock poisoned"))
    }
}

/// The ledger surface a production run needs: a consistent snapshot and
/// the guarded all-or-nothing batch.
///
/// A trait so orchestration can be driven against controlled
/// implementations (contention injection in tests, a row-locking store in
/// a real deployment) without touching the run logic.
pub trait StockStore: Send + Sync {
    fn snapshot(&self, keys: &[(ItemId, WarehouseId)]) -> DomainResult<Vec<StockView>>;
    fn apply_all(&self, deltas: &[StockDelta], guards: &[RowGuard]) -> DomainResult<()>;
}

impl StockStore for StockLedger {
    fn snapshot(&self, keys: &[(ItemId, WarehouseId)]) -> DomainResult<Vec<StockView>> {
        StockLedger::snapshot(self, keys)
    }

    fn apply_all(&self, deltas: &[StockDelta], guards: &[RowGuard]) -> DomainResult<()> {
        StockLedger::apply_all(self, deltas, guards)
    }
}

impl<T: StockStore + ?Sized> StockStore for std::sync::Arc<T> {
    fn snapshot(&self, keys: &[(ItemId, WarehouseId)]) -> DomainResult<Vec<StockView>> {
        (**self).snapshot(keys)
    }

    fn apply_all(&self, deltas: &[StockDelta], guards: &[RowGuard]) -> DomainResult<()> {
        (**self).apply_all(deltas, guards)
    }
}

pub(crate) fn warehouse_sum(state: &LedgerState, item: ItemId) -> u64 {
    state
        .rows
        .iter()
        .filter(|((row_item, _), _)| *row_item == item)
        .map(|(_, row)| row.quantity)
        .sum()
}

pub(crate) fn total_row_mut(state: &mut LedgerState, item: ItemId) -> &mut u64 {
    let row = state.totals.entry(item).or_default();
    row.version += 1;
    &mut row.quantity
}

pub(crate) fn total_of(state: &LedgerState, item: ItemId) -> u64 {
    state.total(item).quantity
}

fn shift(quantity: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        quantity.checked_add(delta as u64)
    } else {
        quantity.checked_sub(delta.unsigned_abs())
    }
}

/// The warehouse row cannot absorb the delta: short on a deduction, past
/// `u64::MAX` on a credit.
fn row_shortfall(d: &StockDelta, available: u64) -> DomainError {
    if d.delta < 0 {
        DomainError::InsufficientStock {
            item: d.item,
            warehouse: d.warehouse,
            required: d.delta.unsigned_abs(),
            available,
        }
    } else {
        overflow(d)
    }
}

/// The materialized total cannot absorb a delta the warehouse row could.
/// On a deduction that means the total under-reports the warehouse sum —
/// pre-existing drift, reported as such instead of blaming the row.
fn total_shortfall(state: &LedgerState, d: &StockDelta) -> DomainError {
    if d.delta < 0 {
        DomainError::ReconciliationDrift {
            item: d.item,
            total: total_of(state, d.item),
            warehouse_sum: warehouse_sum(state, d.item),
        }
    } else {
        overflow(d)
    }
}

fn overflow(d: &StockDelta) -> DomainError {
    DomainError::validation(format!(
        "stock overflow on item {} in warehouse {}",
        d.item, d.warehouse
    ))
}
