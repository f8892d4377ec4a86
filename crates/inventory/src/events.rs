use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{ProductId, WarehouseId};
use stockledger_events::Event;

use crate::discount::Discount;
use crate::stock_record::StockKey;

/// Facts about committed ledger mutations.
///
/// Quantities carry the post-mutation value alongside the delta so consumers
/// can rebuild state without reading the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StockEvent {
    RecordOpened {
        key: StockKey,
        occurred_at: DateTime<Utc>,
    },
    StockAdded {
        key: StockKey,
        delta: i64,
        quantity: i64,
        unit_price: Decimal,
        occurred_at: DateTime<Utc>,
    },
    QuantitySet {
        key: StockKey,
        previous: i64,
        quantity: i64,
        occurred_at: DateTime<Utc>,
    },
    StockTransferred {
        product_id: ProductId,
        source: WarehouseId,
        target: WarehouseId,
        quantity: i64,
        source_quantity: i64,
        target_quantity: i64,
        occurred_at: DateTime<Utc>,
    },
    DiscountChanged {
        key: StockKey,
        discount: Option<Discount>,
        occurred_at: DateTime<Utc>,
    },
    MinimumStockChanged {
        key: StockKey,
        minimum_stock: i64,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::RecordOpened { .. } => "stock.record.opened",
            StockEvent::StockAdded { .. } => "stock.added",
            StockEvent::QuantitySet { .. } => "stock.quantity_set",
            StockEvent::StockTransferred { .. } => "stock.transferred",
            StockEvent::DiscountChanged { .. } => "stock.discount_changed",
            StockEvent::MinimumStockChanged { .. } => "stock.minimum_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::RecordOpened { occurred_at, .. }
            | StockEvent::StockAdded { occurred_at, .. }
            | StockEvent::QuantitySet { occurred_at, .. }
            | StockEvent::StockTransferred { occurred_at, .. }
            | StockEvent::DiscountChanged { occurred_at, .. }
            | StockEvent::MinimumStockChanged { occurred_at, .. } => *occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = StockEvent::QuantitySet {
            key: StockKey::new(ProductId::new(), WarehouseId::new()),
            previous: 4,
            quantity: 9,
            occurred_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "quantity_set");
        assert_eq!(event.event_type(), "stock.quantity_set");
    }
}
