//! Domain error model.

use thiserror::Error;

use crate::id::{ItemId, WarehouseId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Every
/// rejection carries a specific, actionable reason; the application layer
/// must never have to show a generic failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or non-integral quantity).
    /// Raised before any ledger access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness or state conflict (e.g. duplicate SKU).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The bill of materials contains a cycle reachable from `item`.
    ///
    /// Data-integrity defect: explosion cannot terminate. Blocks the
    /// production run; never truncated or worked around silently.
    #[error("cyclic bill of materials involving item {item}")]
    CyclicBom { item: ItemId },

    /// A deduction would drive a stock quantity below zero.
    ///
    /// Expected, user-facing: names the deficient component and amounts.
    #[error(
        "insufficient stock of item {item} in warehouse {warehouse}: \
         required {required}, available {available}"
    )]
    InsufficientStock {
        item: ItemId,
        warehouse: WarehouseId,
        required: u64,
        available: u64,
    },

    /// A concurrent writer touched a stock row between validate and apply.
    /// Transient; the whole validate→apply sequence is safe to retry.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    /// The denormalized item total disagrees with the per-warehouse sum.
    /// Non-fatal; requires administrative attention (explicit repair).
    #[error(
        "reconciliation drift on item {item}: total {total}, \
         sum of warehouses {warehouse_sum}"
    )]
    ReconciliationDrift {
        item: ItemId,
        total: u64,
        warehouse_sum: u64,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn concurrent(msg: impl Into<String>) -> Self {
        Self::ConcurrentModification(msg.into())
    }

    /// How many units short an `InsufficientStock` rejection is, if that is
    /// what this error carries.
    pub fn shortfall(&self) -> Option<u64> {
        match self {
            Self::InsufficientStock {
                required, available, ..
            } => Some(required.saturating_sub(*available)),
            _ => None,
        }
    }

    /// True for errors where retrying the whole operation can succeed
    /// without any input change.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}
