//! Stock repository abstraction.
//!
//! The repository is the only place stock state lives. The ledger, the transfer
//! coordinator and the aggregator receive it by injection, so each can be
//! exercised in isolation against the in-memory implementation.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryStockRepository;
pub use r#trait::StockRepository;
