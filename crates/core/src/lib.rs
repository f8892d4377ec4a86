//! `stockledger-core`: foundation building blocks shared by the ledger crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the ledger error taxonomy and the optimistic
//! concurrency check used by every store.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;
pub mod version;

pub use entity::Entity;
pub use error::{LedgerError, LedgerResult};
pub use id::{ProductId, WarehouseId};
pub use value_object::ValueObject;
pub use version::{ExpectedVersion, Versioned};
