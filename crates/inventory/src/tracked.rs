//! Two-phase (pending/committed) state for optimistic client updates.
//!
//! A client may show the effect of a change before the server confirms it. The
//! committed record is only replaced by what the server returns; a rejected
//! change is rolled back by dropping the preview.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{LedgerError, LedgerResult};

use crate::discount::Discount;
use crate::stock_record::{StockKey, StockRecord};

/// A change staged against a committed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingChange {
    AddStock {
        delta: i64,
        unit_price: Option<Decimal>,
    },
    SetQuantity {
        quantity: i64,
    },
    Withdraw {
        quantity: i64,
    },
    SetDiscount {
        discount: Option<Discount>,
    },
}

impl PendingChange {
    /// Apply to a copy of `record`; the original is untouched.
    pub fn preview(&self, record: &StockRecord, now: DateTime<Utc>) -> LedgerResult<StockRecord> {
        let mut next = record.clone();
        match self {
            PendingChange::AddStock { delta, unit_price } => {
                next.add(*delta, now)?;
                if let Some(price) = unit_price {
                    next.set_unit_price(*price, now)?;
                }
            }
            PendingChange::SetQuantity { quantity } => next.set_quantity(*quantity, now)?,
            PendingChange::Withdraw { quantity } => next.withdraw(*quantity, now)?,
            PendingChange::SetDiscount { discount } => next.set_discount(discount.clone(), now),
        }
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    change: PendingChange,
    preview: StockRecord,
}

/// A record as last confirmed by the server plus at most one in-flight change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRecord {
    committed: StockRecord,
    pending: Option<Pending>,
}

impl TrackedRecord {
    pub fn new(committed: StockRecord) -> Self {
        Self {
            committed,
            pending: None,
        }
    }

    pub fn key(&self) -> StockKey {
        self.committed.key()
    }

    pub fn committed(&self) -> &StockRecord {
        &self.committed
    }

    /// What a view should display: the preview while a change is in flight.
    pub fn effective(&self) -> &StockRecord {
        self.pending
            .as_ref()
            .map(|p| &p.preview)
            .unwrap_or(&self.committed)
    }

    pub fn pending_change(&self) -> Option<&PendingChange> {
        self.pending.as_ref().map(|p| &p.change)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Stage `change`. Fails if another change is still in flight or the change
    /// itself is invalid against the committed state.
    pub fn stage(&mut self, change: PendingChange, now: DateTime<Utc>) -> LedgerResult<&StockRecord> {
        if self.pending.is_some() {
            return Err(LedgerError::stale_write(format!(
                "a change to {} is already pending",
                self.key()
            )));
        }
        let preview = change.preview(&self.committed, now)?;
        Ok(&self.pending.insert(Pending { change, preview }).preview)
    }

    /// The server accepted the change and returned its authoritative record.
    pub fn confirm(&mut self, server: StockRecord) -> LedgerResult<&StockRecord> {
        if server.key() != self.key() {
            return Err(LedgerError::invalid_id(format!(
                "confirmation for {} applied to {}",
                server.key(),
                self.key()
            )));
        }
        self.pending = None;
        self.committed = server;
        Ok(&self.committed)
    }

    /// The server rejected the change: drop the preview.
    pub fn rollback(&mut self) -> Option<PendingChange> {
        self.pending.take().map(|p| p.change)
    }
}
