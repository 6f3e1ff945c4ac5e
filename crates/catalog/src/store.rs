use std::collections::HashMap;
use std::sync::RwLock;

use stocksmith_core::{DomainError, DomainResult, Entity, ItemId, WarehouseId};

use crate::item::{Item, Sku};
use crate::warehouse::Warehouse;

/// In-memory catalog of items and warehouses.
///
/// Read-mostly shared state: production runs only read it, so reads take a
/// shared lock and return clones (records are small).
#[derive(Debug, Default)]
pub struct Catalog {
    items: RwLock<HashMap<ItemId, Item>>,
    by_sku: RwLock<HashMap<Sku, ItemId>>,
    warehouses: RwLock<HashMap<WarehouseId, Warehouse>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item. SKUs are unique; a duplicate is a conflict, not an
    /// upsert.
    pub fn add_item(&self, item: Item) -> DomainResult<()> {
        let mut by_sku = self
            .by_sku
            .write()
            .map_err(|_| DomainError::conflict("catalog lock poisoned"))?;
        if by_sku.contains_key(item.sku()) {
            return Err(DomainError::conflict(format!(
                "duplicate sku: {}",
                item.sku()
            )));
        }
        let mut items = self
            .items
            .write()
            .map_err(|_| DomainError::conflict("catalog lock poisoned"))?;
        by_sku.insert(item.sku().clone(), *item.id());
        items.insert(*item.id(), item);
        Ok(())
    }

    pub fn add_warehouse(&self, warehouse: Warehouse) -> DomainResult<()> {
        let mut warehouses = self
            .warehouses
            .write()
            .map_err(|_| DomainError::conflict("catalog lock poisoned"))?;
        warehouses.insert(*warehouse.id(), warehouse);
        Ok(())
    }

    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.items.read().ok()?.get(&id).cloned()
    }

    pub fn item_by_sku(&self, sku: &Sku) -> Option<Item> {
        let id = *self.by_sku.read().ok()?.get(sku)?;
        self.item(id)
    }

    pub fn warehouse(&self, id: WarehouseId) -> Option<Warehouse> {
        self.warehouses.read().ok()?.get(&id).cloned()
    }

    /// Like `item`, but an absent record is a domain error naming the id.
    pub fn require_item(&self, id: ItemId) -> DomainResult<Item> {
        self.item(id)
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))
    }

    pub fn require_warehouse(&self, id: WarehouseId) -> DomainResult<Warehouse> {
        self.warehouse(id)
            .ok_or_else(|| DomainError::not_found(format!("warehouse {id}")))
    }

    /// Items whose stock (as reported by the caller-supplied lookup, i.e.
    /// the ledger total) has fallen below their reorder threshold.
    pub fn below_min_stock(&self, stock_of: impl Fn(ItemId) -> u64) -> Vec<Item> {
        let Ok(items) = self.items.read() else {
            return Vec::new();
        };
        let mut low: Vec<Item> = items
            .values()
            .filter(|item| stock_of(*item.id()) < item.min_stock().get())
            .cloned()
            .collect();
        low.sort_by(|a, b| a.sku().as_str().cmp(b.sku().as_str()));
        low
    }
}
