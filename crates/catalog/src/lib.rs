//! `stocksmith-catalog` — items and warehouses.
//!
//! Leaf data provider for the production core. Read-mostly: catalog
//! records are authored by management workflows out of scope here and are
//! only read during production runs.

pub mod item;
pub mod store;
pub mod warehouse;

pub use item::{Item, Sku};
pub use store::Catalog;
pub use warehouse::Warehouse;
