//! End-to-end production flow: catalog + BOM + ledger + executor.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;

use stocksmith_audit::MemoryAuditSink;
use stocksmith_bom::BomGraph;
use stocksmith_catalog::{Catalog, Item, Sku};
use stocksmith_core::{DomainError, DomainResult, ItemId, Quantity, UserId, WarehouseId};
use stocksmith_ledger::{RowGuard, StockDelta, StockLedger, StockStore, StockView};
use stocksmith_production::{
    MemoryRunStore, ProductionExecutor, ProductionRequest, RunStore, SourceSelection,
};

type Executor = ProductionExecutor<Arc<StockLedger>, MemoryRunStore, Arc<MemoryAuditSink>>;

struct Fixture {
    catalog: Catalog,
    ledger: Arc<StockLedger>,
    audit: Arc<MemoryAuditSink>,
    executor: Executor,
    paste: ItemId,
    finished: ItemId,
    w1: WarehouseId,
    w2: WarehouseId,
}

/// Item `CHM-00017` (thermal paste, raw component) with stock
/// {W1: 40, W2: 10}; a finished good requires 2 units of it per unit.
fn fixture() -> Fixture {
    stocksmith_observability::init();

    let catalog = Catalog::new();
    let paste = ItemId::new();
    let finished = ItemId::new();
    let w1 = WarehouseId::new();
    let w2 = WarehouseId::new();

    catalog
        .add_item(
            Item::new(
                paste,
                Sku::new("CHM-00017").unwrap(),
                "thermal paste",
                Quantity::new(5),
            )
            .unwrap(),
        )
        .unwrap();
    catalog
        .add_item(
            Item::new(
                finished,
                Sku::new("FIN-00001").unwrap(),
                "cpu cooler",
                Quantity::ZERO,
            )
            .unwrap(),
        )
        .unwrap();

    let mut bom = BomGraph::new();
    bom.add_line(finished, paste, Quantity::new(2)).unwrap();

    let ledger = Arc::new(StockLedger::new());
    ledger.apply(paste, w1, 40).unwrap();
    ledger.apply(paste, w2, 10).unwrap();

    let audit = Arc::new(MemoryAuditSink::new());
    let executor = ProductionExecutor::new(
        Arc::new(bom),
        Arc::clone(&ledger),
        MemoryRunStore::new(),
        Arc::clone(&audit),
    );

    Fixture {
        catalog,
        ledger,
        audit,
        executor,
        paste,
        finished,
        w1,
        w2,
    }
}

fn request(f: &Fixture, quantity: u64) -> ProductionRequest {
    ProductionRequest {
        item: f.finished,
        quantity: Quantity::new(quantity),
        source: SourceSelection::Single(f.w1),
        actor: UserId::new(),
        requested_at: Utc::now(),
    }
}

#[test]
fn producing_twenty_units_drains_w1_exactly() {
    let f = fixture();

    let run = f.executor.execute(&request(&f, 20)).unwrap();
    assert_eq!(run.item, f.finished);
    assert_eq!(run.quantity.get(), 20);

    assert_eq!(f.ledger.at(f.paste, f.w1), 0);
    assert_eq!(f.ledger.at(f.paste, f.w2), 10);
    assert_eq!(f.ledger.total(f.paste), 10);
    assert_eq!(f.ledger.total(f.finished), 20);

    assert!(f.ledger.check(f.paste).unwrap().consistent);
    assert!(f.ledger.check(f.finished).unwrap().consistent);

    assert_eq!(f.executor.runs().list().len(), 1);
    let entries = f.audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entity, "production_run");
    assert_eq!(entries[0].action, "applied");
}

#[test]
fn shortfall_of_two_rejects_the_run_and_changes_nothing() {
    let f = fixture();

    // 21 units need 42 of the paste; W1 only has 40.
    let err = f.executor.execute(&request(&f, 21)).unwrap_err();
    match err {
        DomainError::InsufficientStock {
            item,
            warehouse,
            required,
            available,
        } => {
            assert_eq!(item, f.paste);
            assert_eq!(warehouse, f.w1);
            assert_eq!(required, 42);
            assert_eq!(available, 40);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(err.shortfall(), Some(2));

    assert_eq!(f.ledger.at(f.paste, f.w1), 40);
    assert_eq!(f.ledger.at(f.paste, f.w2), 10);
    assert_eq!(f.ledger.total(f.paste), 50);
    assert_eq!(f.ledger.total(f.finished), 0);

    assert!(f.executor.runs().list().is_empty());
    let entries = f.audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "rejected");
}

#[test]
fn validation_alone_has_no_observable_effect() {
    let f = fixture();

    let before = [
        f.ledger.at(f.paste, f.w1),
        f.ledger.at(f.paste, f.w2),
        f.ledger.total(f.paste),
        f.ledger.total(f.finished),
    ];

    let plan = f.executor.validate(&request(&f, 20)).unwrap();
    assert_eq!(plan.requirements().len(), 1);

    let after = [
        f.ledger.at(f.paste, f.w1),
        f.ledger.at(f.paste, f.w2),
        f.ledger.total(f.paste),
        f.ledger.total(f.finished),
    ];
    assert_eq!(before, after);
    assert!(f.audit.entries().is_empty());
}

#[test]
fn zero_quantity_is_rejected_before_any_ledger_access() {
    let f = fixture();
    let err = f.executor.execute(&request(&f, 0)).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(f.ledger.total(f.paste), 50);
}

#[test]
fn cyclic_bom_rejects_the_run_with_no_side_effects() {
    stocksmith_observability::init();

    let a = ItemId::new();
    let b = ItemId::new();
    let w = WarehouseId::new();

    let mut bom = BomGraph::new();
    bom.add_line(a, b, Quantity::new(1)).unwrap();
    bom.add_line(b, a, Quantity::new(1)).unwrap();

    let ledger = Arc::new(StockLedger::new());
    ledger.apply(b, w, 100).unwrap();

    let executor = ProductionExecutor::new(
        Arc::new(bom),
        Arc::clone(&ledger),
        MemoryRunStore::new(),
        MemoryAuditSink::new(),
    );

    let err = executor
        .execute(&ProductionRequest {
            item: a,
            quantity: Quantity::new(1),
            source: SourceSelection::Single(w),
            actor: UserId::new(),
            requested_at: Utc::now(),
        })
        .unwrap_err();

    assert!(matches!(err, DomainError::CyclicBom { .. }));
    assert_eq!(ledger.at(b, w), 100);
    assert!(executor.runs().list().is_empty());
}

#[test]
fn per_component_overrides_pick_the_right_warehouses() {
    let f = fixture();

    // Source the paste from W2 instead of the default W1.
    let err = f
        .executor
        .execute(&ProductionRequest {
            item: f.finished,
            quantity: Quantity::new(6),
            source: SourceSelection::PerComponent {
                default: f.w1,
                overrides: HashMap::from([(f.paste, f.w2)]),
            },
            actor: UserId::new(),
            requested_at: Utc::now(),
        })
        .unwrap_err();
    // 6 units need 12 from W2, which only has 10.
    assert_eq!(err.shortfall(), Some(2));

    let run = f
        .executor
        .execute(&ProductionRequest {
            item: f.finished,
            quantity: Quantity::new(5),
            source: SourceSelection::PerComponent {
                default: f.w1,
                overrides: HashMap::from([(f.paste, f.w2)]),
            },
            actor: UserId::new(),
            requested_at: Utc::now(),
        })
        .unwrap();
    assert_eq!(run.quantity.get(), 5);

    assert_eq!(f.ledger.at(f.paste, f.w1), 40);
    assert_eq!(f.ledger.at(f.paste, f.w2), 0);
    // Finished goods land in the default warehouse.
    assert_eq!(f.ledger.at(f.finished, f.w1), 5);
}

#[test]
fn producing_a_raw_item_is_a_pure_credit() {
    let f = fixture();

    let run = f
        .executor
        .execute(&ProductionRequest {
            item: f.paste,
            quantity: Quantity::new(3),
            source: SourceSelection::Single(f.w2),
            actor: UserId::new(),
            requested_at: Utc::now(),
        })
        .unwrap();
    assert_eq!(run.item, f.paste);
    assert_eq!(f.ledger.at(f.paste, f.w2), 13);
    assert_eq!(f.ledger.total(f.paste), 53);
}

#[test]
fn reorder_report_reflects_post_run_stock() {
    let f = fixture();

    // min_stock for the paste is 5; total drops to 10, still fine.
    f.executor.execute(&request(&f, 20)).unwrap();
    let ledger = Arc::clone(&f.ledger);
    let low = f.catalog.below_min_stock(move |id| ledger.total(id));
    assert!(low.is_empty());

    // Burn the rest from W2: total 10 -> 2, below the threshold of 5.
    f.ledger.apply(f.paste, f.w2, -8).unwrap();
    let ledger = Arc::clone(&f.ledger);
    let low = f.catalog.below_min_stock(move |id| ledger.total(id));
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].sku().as_str(), "CHM-00017");
}

/// Ledger wrapper that fails the next `conflicts` apply attempts with a
/// version conflict before delegating to the real ledger. Lets tests pin
/// the retry loop without racing real threads.
struct ContentiousLedger {
    inner: Arc<StockLedger>,
    conflicts: AtomicU32,
}

impl ContentiousLedger {
    fn new(inner: Arc<StockLedger>, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts: AtomicU32::new(conflicts),
        }
    }
}

impl StockStore for ContentiousLedger {
    fn snapshot(&self, keys: &[(ItemId, WarehouseId)]) -> DomainResult<Vec<StockView>> {
        self.inner.snapshot(keys)
    }

    fn apply_all(&self, deltas: &[StockDelta], guards: &[RowGuard]) -> DomainResult<()> {
        let remaining = self.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::concurrent(
                "stock row version changed under the run",
            ));
        }
        self.inner.apply_all(deltas, guards)
    }
}

fn contentious_setup(
    conflicts: u32,
) -> (
    Arc<StockLedger>,
    Arc<ContentiousLedger>,
    Arc<MemoryAuditSink>,
    ProductionExecutor<Arc<ContentiousLedger>, MemoryRunStore, Arc<MemoryAuditSink>>,
    ItemId,
    ItemId,
    WarehouseId,
) {
    stocksmith_observability::init();

    let component = ItemId::new();
    let finished = ItemId::new();
    let w = WarehouseId::new();

    let mut bom = BomGraph::new();
    bom.add_line(finished, component, Quantity::new(7)).unwrap();

    let ledger = Arc::new(StockLedger::new());
    ledger.apply(component, w, 100).unwrap();

    let contentious = Arc::new(ContentiousLedger::new(Arc::clone(&ledger), conflicts));
    let audit = Arc::new(MemoryAuditSink::new());
    let executor = ProductionExecutor::new(
        Arc::new(bom),
        Arc::clone(&contentious),
        MemoryRunStore::new(),
        Arc::clone(&audit),
    );

    (ledger, contentious, audit, executor, component, finished, w)
}

#[test]
fn two_apply_conflicts_are_retried_and_the_third_attempt_lands() {
    let (ledger, contentious, audit, executor, component, finished, w) = contentious_setup(2);

    let run = executor
        .execute(&ProductionRequest {
            item: finished,
            quantity: Quantity::new(1),
            source: SourceSelection::Single(w),
            actor: UserId::new(),
            requested_at: Utc::now(),
        })
        .unwrap();

    assert_eq!(run.item, finished);
    assert_eq!(contentious.conflicts.load(Ordering::SeqCst), 0);
    assert_eq!(ledger.at(component, w), 93);
    assert_eq!(ledger.total(finished), 1);
    assert_eq!(executor.runs().list().len(), 1);

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "applied");
}

#[test]
fn three_apply_conflicts_exhaust_the_retries_and_reject_the_run() {
    let (ledger, contentious, audit, executor, component, finished, w) = contentious_setup(3);

    let err = executor
        .execute(&ProductionRequest {
            item: finished,
            quantity: Quantity::new(1),
            source: SourceSelection::Single(w),
            actor: UserId::new(),
            requested_at: Utc::now(),
        })
        .unwrap_err();

    assert!(matches!(err, DomainError::ConcurrentModification(_)));
    // Exactly three attempts were made, no fourth.
    assert_eq!(contentious.conflicts.load(Ordering::SeqCst), 0);
    assert_eq!(ledger.at(component, w), 100);
    assert_eq!(ledger.total(finished), 0);
    assert!(executor.runs().list().is_empty());

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "rejected");
}

#[test]
fn concurrent_runs_never_double_spend_or_drift() {
    stocksmith_observability::init();

    let component = ItemId::new();
    let finished = ItemId::new();
    let w = WarehouseId::new();

    let mut bom = BomGraph::new();
    bom.add_line(finished, component, Quantity::new(7)).unwrap();

    let ledger = Arc::new(StockLedger::new());
    ledger.apply(component, w, 100).unwrap();

    let executor = Arc::new(ProductionExecutor::new(
        Arc::new(bom),
        Arc::clone(&ledger),
        MemoryRunStore::new(),
        MemoryAuditSink::new(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let executor = Arc::clone(&executor);
            std::thread::spawn(move || {
                let mut applied = 0u64;
                for _ in 0..10 {
                    let result = executor.execute(&ProductionRequest {
                        item: finished,
                        quantity: Quantity::new(1),
                        source: SourceSelection::Single(w),
                        actor: UserId::new(),
                        requested_at: Utc::now(),
                    });
                    match result {
                        Ok(_) => applied += 1,
                        Err(DomainError::InsufficientStock { .. })
                        | Err(DomainError::ConcurrentModification(_)) => {}
                        Err(other) => panic!("unexpected rejection: {other:?}"),
                    }
                }
                applied
            })
        })
        .collect();

    let applied: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // 100 / 7 => at most 14 runs can ever commit.
    assert!(applied <= 14, "double spend: {applied} runs applied");
    assert_eq!(ledger.total(component), 100 - 7 * applied);
    assert_eq!(ledger.total(finished), applied);
    assert!(ledger.check(component).unwrap().consistent);
    assert!(ledger.check(finished).unwrap().consistent);
    assert_eq!(executor.runs().list().len(), applied as usize);
}
