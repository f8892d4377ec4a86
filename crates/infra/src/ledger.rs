//! Stock record store: the mutation and lookup API over a `StockRepository`.
//!
//! Every mutation follows the same pipeline:
//!
//! ```text
//! validate input → check catalog → load (or open) record → mutate copy
//!   → [publisher lock: repository.save (compare-and-swap) → publish events]
//! ```
//!
//! Nothing is published unless the save committed, and a failed step leaves the
//! stored record untouched. Save and publish share the publisher's lock, so the
//! event stream is in commit order.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;

use stockledger_core::{LedgerError, LedgerResult, ProductId, WarehouseId};
use stockledger_events::{EventBus, EventEnvelope};
use stockledger_inventory::{Discount, Product, StockEvent, StockKey, StockRecord, Warehouse};

use crate::config::LedgerPolicy;
use crate::publisher::StockEventPublisher;
use crate::repository::StockRepository;

/// Command: receive stock into a warehouse (the backend's stock POST body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddStock {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    pub unit_price: Option<Decimal>,
    pub location: Option<String>,
}

#[derive(Debug)]
pub struct StockLedger<R, B> {
    repo: R,
    events: Arc<StockEventPublisher<B>>,
    policy: LedgerPolicy,
}

impl<R, B> StockLedger<R, B> {
    pub fn new(repo: R, events: Arc<StockEventPublisher<B>>, policy: LedgerPolicy) -> Self {
        Self {
            repo,
            events,
            policy,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}

impl<R, B> StockLedger<R, B>
where
    R: StockRepository,
    B: EventBus<EventEnvelope<StockEvent>>,
{
    pub fn register_product(&self, product: Product) -> LedgerResult<()> {
        tracing::debug!(product_id = %product.id_typed(), "registering product");
        self.repo.upsert_product(product)
    }

    /// Capacity was validated when the `Warehouse` was built.
    pub fn register_warehouse(&self, warehouse: Warehouse) -> LedgerResult<()> {
        tracing::debug!(warehouse_id = %warehouse.id_typed(), capacity = warehouse.capacity(), "registering warehouse");
        self.repo.upsert_warehouse(warehouse)
    }

    /// Add `quantity_delta` units, creating the record on first association.
    pub fn add_stock(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity_delta: i64,
        unit_price: Option<Decimal>,
    ) -> LedgerResult<StockRecord> {
        self.receive(AddStock {
            product_id,
            warehouse_id,
            quantity: quantity_delta,
            unit_price,
            location: None,
        })
    }

    #[instrument(skip(self, cmd), fields(product_id = %cmd.product_id, warehouse_id = %cmd.warehouse_id, quantity = cmd.quantity))]
    pub fn receive(&self, cmd: AddStock) -> LedgerResult<StockRecord> {
        if cmd.quantity <= 0 {
            return Err(LedgerError::invalid_quantity(format!(
                "stock increment must be positive (got {})",
                cmd.quantity
            )));
        }
        let key = StockKey::new(cmd.product_id, cmd.warehouse_id);
        let now = Utc::now();
        let (mut record, opened) = self.load_or_open(key, cmd.unit_price)?;

        record.add(cmd.quantity, now)?;
        if let Some(price) = cmd.unit_price {
            record.set_unit_price(price, now)?;
        }
        if cmd.location.is_some() {
            record.set_location(cmd.location, now);
        }

        let saved = self.events.commit(
            || self.repo.save(record),
            |saved: &StockRecord| {
                let mut events = Vec::with_capacity(2);
                if opened {
                    events.push(StockEvent::RecordOpened { key, occurred_at: now });
                }
                events.push(StockEvent::StockAdded {
                    key,
                    delta: cmd.quantity,
                    quantity: saved.quantity(),
                    unit_price: saved.unit_price(),
                    occurred_at: now,
                });
                events
            },
        )?;
        tracing::info!(quantity_after = saved.quantity(), status = saved.status().as_str(), "stock added");

        Ok(saved)
    }

    /// Absolute quantity correction.
    #[instrument(skip(self))]
    pub fn set_quantity(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        new_quantity: i64,
    ) -> LedgerResult<StockRecord> {
        if new_quantity < 0 {
            return Err(LedgerError::invalid_quantity(format!(
                "quantity cannot be negative (got {new_quantity})"
            )));
        }
        let key = StockKey::new(product_id, warehouse_id);
        let now = Utc::now();
        let (mut record, opened) = self.load_or_open(key, None)?;
        let previous = record.quantity();

        record.set_quantity(new_quantity, now)?;
        let saved = self.events.commit(
            || self.repo.save(record),
            |saved: &StockRecord| {
                let mut events = Vec::with_capacity(2);
                if opened {
                    events.push(StockEvent::RecordOpened { key, occurred_at: now });
                }
                events.push(StockEvent::QuantitySet {
                    key,
                    previous,
                    quantity: saved.quantity(),
                    occurred_at: now,
                });
                events
            },
        )?;
        tracing::info!(previous, quantity_after = saved.quantity(), "stock quantity corrected");

        Ok(saved)
    }

    /// Replace (or clear, with `None`) the discount of an existing record.
    #[instrument(skip(self, discount), fields(active = discount.as_ref().map(Discount::is_active)))]
    pub fn set_discount(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        discount: Option<Discount>,
    ) -> LedgerResult<StockRecord> {
        let key = StockKey::new(product_id, warehouse_id);
        let mut record = self.get(product_id, warehouse_id)?;
        let now = Utc::now();

        record.set_discount(discount.clone(), now);
        let saved = self.events.commit(
            || self.repo.save(record),
            |_| {
                vec![StockEvent::DiscountChanged {
                    key,
                    discount,
                    occurred_at: now,
                }]
            },
        )?;
        tracing::info!("discount replaced");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub fn set_minimum_stock(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        minimum_stock: i64,
    ) -> LedgerResult<StockRecord> {
        let key = StockKey::new(product_id, warehouse_id);
        let mut record = self.get(product_id, warehouse_id)?;
        let now = Utc::now();

        record.set_minimum_stock(minimum_stock, now)?;
        self.events.commit(
            || self.repo.save(record),
            |_| {
                vec![StockEvent::MinimumStockChanged {
                    key,
                    minimum_stock,
                    occurred_at: now,
                }]
            },
        )
    }

    /// Snapshot of one record.
    pub fn get(&self, product_id: ProductId, warehouse_id: WarehouseId) -> LedgerResult<StockRecord> {
        let key = StockKey::new(product_id, warehouse_id);
        self.repo
            .get(key)?
            .ok_or_else(|| LedgerError::not_found(format!("no stock record for {key}")))
    }

    /// All warehouse rows for a product (empty if it was never stocked).
    pub fn get_by_product(&self, product_id: ProductId) -> LedgerResult<Vec<StockRecord>> {
        ensure_product(&self.repo, product_id)?;
        self.repo.list_by_product(product_id)
    }

    pub fn get_by_warehouse(&self, warehouse_id: WarehouseId) -> LedgerResult<Vec<StockRecord>> {
        ensure_warehouse(&self.repo, warehouse_id)?;
        self.repo.list_by_warehouse(warehouse_id)
    }

    fn load_or_open(&self, key: StockKey, unit_price: Option<Decimal>) -> LedgerResult<(StockRecord, bool)> {
        ensure_product(&self.repo, key.product_id)?;
        ensure_warehouse(&self.repo, key.warehouse_id)?;

        match self.repo.get(key)? {
            Some(existing) => Ok((existing, false)),
            None => {
                let opened = StockRecord::open(
                    key,
                    unit_price.unwrap_or(Decimal::ZERO),
                    self.policy.default_minimum_stock,
                    Utc::now(),
                )?;
                Ok((opened, true))
            }
        }
    }
}

pub(crate) fn ensure_product<R: StockRepository>(repo: &R, product_id: ProductId) -> LedgerResult<Product> {
    repo.product(product_id)?
        .ok_or_else(|| LedgerError::not_found(format!("unknown product {product_id}")))
}

pub(crate) fn ensure_warehouse<R: StockRepository>(repo: &R, warehouse_id: WarehouseId) -> LedgerResult<Warehouse> {
    repo.warehouse(warehouse_id)?
        .ok_or_else(|| LedgerError::not_found(format!("unknown warehouse {warehouse_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use stockledger_events::InMemoryEventBus;
    use stockledger_inventory::{DateWindow, DiscountRule, QuantityBand, StockStatus, price_for};

    use crate::repository::InMemoryStockRepository;

    type Bus = Arc<InMemoryEventBus<EventEnvelope<StockEvent>>>;

    struct Fixture {
        ledger: StockLedger<Arc<InMemoryStockRepository>, Bus>,
        bus: Bus,
        product: ProductId,
        main: WarehouseId,
        annex: WarehouseId,
    }

    fn setup() -> Fixture {
        let repo = Arc::new(InMemoryStockRepository::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let publisher = Arc::new(StockEventPublisher::new(bus.clone()));
        let ledger = StockLedger::new(repo, publisher, LedgerPolicy { default_minimum_stock: 2 });

        let product = ProductId::new();
        let main = WarehouseId::new();
        let annex = WarehouseId::new();
        ledger.register_product(Product::new(product, "Gold ring 18k")).unwrap();
        ledger.register_warehouse(Warehouse::new(main, "Main", 500).unwrap()).unwrap();
        ledger.register_warehouse(Warehouse::new(annex, "Annex", 100).unwrap()).unwrap();

        Fixture {
            ledger,
            bus,
            product,
            main,
            annex,
        }
    }

    #[test]
    fn add_stock_creates_then_increments() {
        let f = setup();
        let created = f.ledger.add_stock(f.product, f.main, 1, Some(dec!(120))).unwrap();
        assert_eq!(created.quantity(), 1);
        assert_eq!(created.minimum_stock(), 2);
        assert_eq!(created.status(), StockStatus::LowStock);

        let updated = f.ledger.add_stock(f.product, f.main, 4, None).unwrap();
        assert_eq!(updated.quantity(), 5);
        assert_eq!(updated.unit_price(), dec!(120));
        assert_eq!(updated.status(), StockStatus::InStock);
    }

    #[test]
    fn add_stock_rejects_non_positive_delta() {
        let f = setup();
        for delta in [0, -3] {
            let err = f.ledger.add_stock(f.product, f.main, delta, None).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidQuantity(_)));
        }
        assert!(f.ledger.get_by_product(f.product).unwrap().is_empty());
    }

    #[test]
    fn add_stock_can_update_price_and_location() {
        let f = setup();
        f.ledger.add_stock(f.product, f.main, 2, Some(dec!(100))).unwrap();
        let r = f
            .ledger
            .receive(AddStock {
                product_id: f.product,
                warehouse_id: f.main,
                quantity: 1,
                unit_price: Some(dec!(110)),
                location: Some("Safe 2".to_string()),
            })
            .unwrap();
        assert_eq!(r.unit_price(), dec!(110));
        assert_eq!(r.location(), Some("Safe 2"));
    }

    #[test]
    fn unknown_product_or_warehouse_is_not_found() {
        let f = setup();
        let err = f.ledger.add_stock(ProductId::new(), f.main, 1, None).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let err = f.ledger.set_quantity(f.product, WarehouseId::new(), 1).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn set_quantity_is_absolute_and_rejects_negative() {
        let f = setup();
        f.ledger.add_stock(f.product, f.main, 10, None).unwrap();

        let r = f.ledger.set_quantity(f.product, f.main, 3).unwrap();
        assert_eq!(r.quantity(), 3);

        let err = f.ledger.set_quantity(f.product, f.main, -1).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidQuantity(_)));
        assert_eq!(f.ledger.get(f.product, f.main).unwrap().quantity(), 3);

        let zero = f.ledger.set_quantity(f.product, f.main, 0).unwrap();
        assert_eq!(zero.status(), StockStatus::OutOfStock);
    }

    #[test]
    fn set_discount_changes_price_but_not_quantity() {
        let f = setup();
        f.ledger.add_stock(f.product, f.main, 7, Some(dec!(100))).unwrap();

        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let discount = Discount::new(
            DiscountRule::percentage(dec!(25), QuantityBand::unbounded()).unwrap(),
            DateWindow::starting(start),
            true,
        );
        let r = f.ledger.set_discount(f.product, f.main, Some(discount)).unwrap();
        assert_eq!(r.quantity(), 7);
        assert_eq!(price_for(&r, 1, start).unit_price, dec!(75));

        let cleared = f.ledger.set_discount(f.product, f.main, None).unwrap();
        assert!(cleared.discount().is_none());
    }

    #[test]
    fn set_discount_requires_existing_record() {
        let f = setup();
        let err = f.ledger.set_discount(f.product, f.annex, None).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn minimum_stock_change_rederives_status() {
        let f = setup();
        f.ledger.add_stock(f.product, f.main, 5, None).unwrap();
        let r = f.ledger.set_minimum_stock(f.product, f.main, 5).unwrap();
        assert_eq!(r.status(), StockStatus::LowStock);
    }

    #[test]
    fn get_by_product_lists_every_warehouse_row() {
        let f = setup();
        f.ledger.add_stock(f.product, f.main, 5, None).unwrap();
        f.ledger.set_quantity(f.product, f.annex, 0).unwrap();

        let rows = f.ledger.get_by_product(f.product).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.warehouse_id() == f.annex && r.quantity() == 0));
    }

    #[test]
    fn committed_mutations_are_published_in_order() {
        let f = setup();
        let sub = f.bus.subscribe();

        f.ledger.add_stock(f.product, f.main, 3, None).unwrap();
        f.ledger.add_stock(f.product, f.main, 1, None).unwrap();
        let _ = f.ledger.add_stock(f.product, f.main, 0, None);

        let envelopes = sub.drain();
        let types: Vec<_> = envelopes.iter().map(|e| e.event_type().to_string()).collect();
        assert_eq!(types, vec!["stock.record.opened", "stock.added", "stock.added"]);
        let seqs: Vec<_> = envelopes.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }
}
