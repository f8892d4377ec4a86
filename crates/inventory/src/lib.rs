//! Stock ledger domain module.
//!
//! Business rules for per-warehouse stock records, discount pricing and
//! inter-warehouse transfers, implemented purely as deterministic domain logic
//! (no IO, no storage, no clocks: callers pass `now`/`as_of` in).

pub mod catalog;
pub mod discount;
pub mod events;
pub mod stock_record;
pub mod tracked;
pub mod transfer;

pub use catalog::{Product, Warehouse};
pub use discount::{
    DateWindow, Discount, DiscountDocument, DiscountKind, DiscountRule, PriceQuote, QuantityBand,
    price_for,
};
pub use events::StockEvent;
pub use stock_record::{StockKey, StockRecord, StockRecordSnapshot, StockStatus};
pub use tracked::{PendingChange, TrackedRecord};
pub use transfer::{TransferOutcome, TransferRequest};
