//! Ledger error model.

use thiserror::Error;

use crate::id::WarehouseId;

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Deterministic business failures plus `StaleWrite` for concurrent
/// modification detected by a store. Operations fail fast with one of these and
/// never retry on their own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Non-positive or negative amount where it is not allowed.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A transfer or decrement exceeds the quantity on hand.
    #[error("insufficient stock (requested: {requested}, available: {available})")]
    InsufficientStock { requested: i64, available: i64 },

    /// Transfer source and target are the same warehouse.
    #[error("source and target warehouse are the same ({0})")]
    SameWarehouse(WarehouseId),

    /// The referenced product/warehouse pair has no record and cannot be created.
    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent modification detected by the storage layer.
    #[error("stale write: {0}")]
    StaleWrite(String),

    /// A unit price was negative.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// A discount rule is malformed (e.g. inverted quantity band).
    #[error("invalid discount: {0}")]
    InvalidDiscount(String),

    /// A warehouse was declared with a non-positive capacity.
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The storage layer itself failed (e.g. poisoned lock).
    #[error("storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn insufficient_stock(requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn stale_write(msg: impl Into<String>) -> Self {
        Self::StaleWrite(msg.into())
    }

    pub fn invalid_price(msg: impl Into<String>) -> Self {
        Self::InvalidPrice(msg.into())
    }

    pub fn invalid_discount(msg: impl Into<String>) -> Self {
        Self::InvalidDiscount(msg.into())
    }

    pub fn invalid_capacity(msg: impl Into<String>) -> Self {
        Self::InvalidCapacity(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
