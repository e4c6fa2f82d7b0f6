//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// create a new instance with the new values. A `BillOfMaterials` requirement is a
/// value object; a `StockRequest` (which has identity and a lifecycle) is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
