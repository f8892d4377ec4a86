//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stock records are identified by their (product, warehouse) key, warehouses by
/// their own id. Stores key their maps on `Entity::id`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
