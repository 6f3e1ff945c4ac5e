//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; two
/// value objects with the same values are the same value. `Quantity` and a
/// BOM line are value objects; `Item` (which has an id) is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
