use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use stocksmith_audit::{AuditEntry, AuditSink};
use stocksmith_bom::{BomGraph, Requirement};
use stocksmith_core::{
    DomainError, DomainResult, ExpectedVersion, ItemId, ProductionRunId, Quantity, UserId,
    WarehouseId,
};
use stocksmith_ledger::{RowGuard, StockDelta, StockStore};

use crate::run::{ProductionRun, RunStore};

/// Which warehouse each component is deducted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceSelection {
    /// Deduct everything from (and credit the finished good to) a single
    /// designated warehouse.
    Single(WarehouseId),
    /// Deduct each overridden component from its own warehouse; everything
    /// else, and the finished-good credit, uses `default`.
    PerComponent {
        default: WarehouseId,
        overrides: HashMap<ItemId, WarehouseId>,
    },
}

impl SourceSelection {
    fn source_for(&self, component: ItemId) -> WarehouseId {
        match self {
            SourceSelection::Single(warehouse) => *warehouse,
            SourceSelection::PerComponent { default, overrides } => {
                overrides.get(&component).copied().unwrap_or(*default)
            }
        }
    }

    fn credit_warehouse(&self) -> WarehouseId {
        match self {
            SourceSelection::Single(warehouse) => *warehouse,
            SourceSelection::PerComponent { default, .. } => *default,
        }
    }
}

/// A request to produce `quantity` units of `item`.
///
/// `actor` is an opaque verified identity supplied by the auth
/// collaborator; `requested_at` is caller-supplied for determinism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRequest {
    pub item: ItemId,
    pub quantity: Quantity,
    pub source: SourceSelection,
    pub actor: UserId,
    pub requested_at: DateTime<Utc>,
}

/// Lifecycle of one run attempt. `Applied` and `Rejected` are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Requested,
    Validated,
    Applied,
    Rejected,
}

impl core::fmt::Display for RunState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            RunState::Requested => "requested",
            RunState::Validated => "validated",
            RunState::Applied => "applied",
            RunState::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// The side-effect-free result of validation: every ledger delta the run
/// will apply, plus the version guards that make the apply step detect
/// concurrent writers.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    requirements: Vec<Requirement>,
    deltas: Vec<StockDelta>,
    guards: Vec<RowGuard>,
}

impl ValidatedPlan {
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

/// Retries of the whole validate→apply sequence after a concurrent
/// modification, before the error is surfaced to the caller.
const MAX_ATTEMPTS: u32 = 3;

/// Orchestrates production runs against the BOM graph and the stock
/// ledger.
///
/// Validation happens before any lock on stock rows is taken, so BOM
/// traversal depth never extends the critical section. The apply step is a
/// single all-or-nothing ledger batch: component deductions plus the
/// finished-good credit commit together or not at all.
pub struct ProductionExecutor<L: StockStore, S: RunStore, A: AuditSink> {
    bom: Arc<BomGraph>,
    ledger: L,
    runs: S,
    audit: A,
}

impl<L: StockStore, S: RunStore, A: AuditSink> ProductionExecutor<L, S, A> {
    pub fn new(bom: Arc<BomGraph>, ledger: L, runs: S, audit: A) -> Self {
        Self {
            bom,
            ledger,
            runs,
            audit,
        }
    }

    pub fn runs(&self) -> &S {
        &self.runs
    }

    /// Requested → Validated. Pure read path: a request abandoned here has
    /// had no observable effect.
    ///
    /// Availability is checked in BOM explosion order, so the first
    /// insufficient component named in a rejection is deterministic.
    pub fn validate(&self, request: &ProductionRequest) -> DomainResult<ValidatedPlan> {
        if request.quantity.is_zero() {
            return Err(DomainError::validation(
                "production quantity cannot be zero",
            ));
        }

        // CyclicBom surfaces here, before any stock access.
        let requirements = self.bom.explode(request.item, request.quantity)?;

        let keys: Vec<(ItemId, WarehouseId)> = requirements
            .iter()
            .map(|r| (r.item, request.source.source_for(r.item)))
            .collect();
        let views = self.ledger.snapshot(&keys)?;

        let mut deltas = Vec::with_capacity(requirements.len() + 1);
        let mut guards = Vec::with_capacity(requirements.len());
        for (requirement, view) in requirements.iter().zip(&views) {
            let required = requirement.quantity.get();
            if view.quantity < required {
                return Err(DomainError::InsufficientStock {
                    item: requirement.item,
                    warehouse: view.warehouse,
                    required,
                    available: view.quantity,
                });
            }
            deltas.push(StockDelta {
                item: requirement.item,
                warehouse: view.warehouse,
                delta: -signed(required)?,
            });
            guards.push(RowGuard {
                item: requirement.item,
                warehouse: view.warehouse,
                expected: ExpectedVersion::Exact(view.version),
            });
        }

        // Crediting is a ledger delta with the sign reversed.
        deltas.push(StockDelta {
            item: request.item,
            warehouse: request.source.credit_warehouse(),
            delta: signed(request.quantity.get())?,
        });

        Ok(ValidatedPlan {
            requirements,
            deltas,
            guards,
        })
    }

    /// Run the full state machine: Requested → Validated → Applied, or
    /// Rejected with the specific reason.
    ///
    /// Only `ConcurrentModification` during apply is retried (bounded);
    /// every other failure is terminal and surfaced unchanged.
    pub fn execute(&self, request: &ProductionRequest) -> DomainResult<ProductionRun> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let plan = match self.validate(request) {
                Ok(plan) => plan,
                Err(reason) => return Err(self.reject(request, reason)),
            };
            tracing::debug!(
                item = %request.item,
                quantity = %request.quantity,
                components = plan.requirements.len(),
                state = %RunState::Validated,
                "production run validated"
            );

            match self.ledger.apply_all(&plan.deltas, &plan.guards) {
                Ok(()) => return self.commit(request),
                Err(reason) if reason.is_transient() && attempt < MAX_ATTEMPTS => {
                    tracing::debug!(
                        item = %request.item,
                        attempt,
                        "concurrent modification during apply, retrying run"
                    );
                }
                Err(reason) => return Err(self.reject(request, reason)),
            }
        }
    }

    fn commit(&self, request: &ProductionRequest) -> DomainResult<ProductionRun> {
        let run = ProductionRun {
            id: ProductionRunId::new(),
            item: request.item,
            quantity: request.quantity,
            produced_at: request.requested_at,
            actor: request.actor,
        };
        self.runs.append(run.clone())?;
        self.audit.record(AuditEntry::new(
            "production_run",
            RunState::Applied.to_string(),
            json!({
                "run_id": run.id,
                "item": run.item,
                "quantity": run.quantity,
                "actor": run.actor,
            }),
            request.requested_at,
        ));
        tracing::info!(
            run_id = %run.id,
            item = %run.item,
            quantity = %run.quantity,
            state = %RunState::Applied,
            "production run applied"
        );
        Ok(run)
    }

    fn reject(&self, request: &ProductionRequest, reason: DomainError) -> DomainError {
        self.audit.record(AuditEntry::new(
            "production_run",
            RunState::Rejected.to_string(),
            json!({
                "item": request.item,
                "quantity": request.quantity,
                "actor": request.actor,
                "reason": reason.to_string(),
            }),
            request.requested_at,
        ));
        tracing::info!(
            item = %request.item,
            quantity = %request.quantity,
            state = %RunState::Rejected,
            reason = %reason,
            "production run rejected"
        );
        reason
    }
}

fn signed(quantity: u64) -> DomainResult<i64> {
    i64::try_from(quantity)
        .map_err(|_| DomainError::validation(format!("quantity out of range: {quantity}")))
}
