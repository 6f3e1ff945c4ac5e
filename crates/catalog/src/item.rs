use serde::{Deserialize, Serialize};

use stocksmith_core::{DomainError, Entity, ItemId, Quantity, ValueObject};

/// Human-facing stock-keeping unit code, e.g. `CHM-00017`. Unique across
/// the catalog; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
        let code = code.into();
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for Sku {}

/// Catalog item: a raw component or a manufacturable finished good.
///
/// The denormalized current-stock figure lives in the stock ledger (as the
/// item's total row), not here, so that the ledger remains the single
/// write path to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    sku: Sku,
    name: String,
    min_stock: Quantity,
}

impl Item {
    pub fn new(
        id: ItemId,
        sku: Sku,
        name: impl Into<String>,
        min_stock: Quantity,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        Ok(Self {
            id,
            sku,
            name,
            min_stock,
        })
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reorder threshold: stock strictly below this level surfaces in the
    /// reorder report.
    pub fn min_stock(&self) -> Quantity {
        self.min_stock
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
