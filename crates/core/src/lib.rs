//! `stocksmith-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the whole-number `Quantity` value object, the
//! domain error taxonomy, and the optimistic-concurrency `ExpectedVersion`.

pub mod entity;
pub mod error;
pub mod id;
pub mod quantity;
pub mod value_object;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ItemId, ProductionRunId, UserId, WarehouseId};
pub use quantity::Quantity;
pub use value_object::ValueObject;
pub use version::ExpectedVersion;
