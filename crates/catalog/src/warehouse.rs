use serde::{Deserialize, Serialize};

use stocksmith_core::{DomainError, Entity, WarehouseId};

/// Physical storage location. Immutable as far as this core is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    id: WarehouseId,
    name: String,
}

impl Warehouse {
    pub fn new(id: WarehouseId, name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("warehouse name cannot be empty"));
        }
        Ok(Self { id, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
