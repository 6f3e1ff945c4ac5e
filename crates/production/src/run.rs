use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocksmith_core::{DomainResult, ItemId, ProductionRunId, Quantity, UserId};

/// Immutable record of one committed production run.
///
/// Only successful (Applied) runs are recorded; rejected attempts leave an
/// audit entry instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRun {
    pub id: ProductionRunId,
    pub item: ItemId,
    pub quantity: Quantity,
    pub produced_at: DateTime<Utc>,
    pub actor: UserId,
}

/// Append-only store of committed production runs.
pub trait RunStore: Send + Sync {
    fn append(&self, run: ProductionRun) -> DomainResult<()>;
    fn list(&self) -> Vec<ProductionRun>;
}

/// In-memory run store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: RwLock<Vec<ProductionRun>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunStore for MemoryRunStore {
    fn append(&self, run: ProductionRun) -> DomainResult<()> {
        let mut runs = self
            .runs
            .write()
            .map_err(|_| stocksmith_core::DomainError::concurrent("run store lock poisoned"))?;
        runs.push(run);
        Ok(())
    }

    fn list(&self) -> Vec<ProductionRun> {
        self.runs.read().map(|r| r.clone()).unwrap_or_default()
    }
}
