//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. In the
/// ledger these are discount rules, quantity bands, date windows and price
/// quotes: replacing a record's discount swaps the whole value, it never edits
/// one field in place.
///
/// ```ignore
/// let a = QuantityBand::new(Some(2), Some(10))?;
/// let b = QuantityBand::new(Some(2), Some(10))?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
