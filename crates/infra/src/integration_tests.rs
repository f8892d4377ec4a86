//! Integration tests for the full stock pipeline.
//!
//! Tests: Ledger / TransferCoordinator → Repository → EventBus → subscriber
//!
//! Verifies:
//! - Published events are enough to rebuild every record's quantity, also
//!   under concurrent writers
//! - Concurrent transfers never lose or create units
//! - Rollups reflect committed state only

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use stockledger_core::{LedgerError, ProductId, WarehouseId};
    use stockledger_events::{EventBus, EventEnvelope, InMemoryEventBus};
    use stockledger_inventory::{
        DateWindow, Discount, DiscountRule, Product, QuantityBand, StockEvent, StockKey, StockRecord,
        TransferRequest, Warehouse, price_for,
    };

    use crate::aggregator::{InventoryAggregator, ProductStockStatus};
    use crate::config::LedgerPolicy;
    use crate::ledger::StockLedger;
    use crate::publisher::StockEventPublisher;
    use crate::repository::{InMemoryStockRepository, StockRepository};
    use crate::transfer::TransferCoordinator;

    type Bus = Arc<InMemoryEventBus<EventEnvelope<StockEvent>>>;
    type Repo = Arc<InMemoryStockRepository>;

    struct Pipeline {
        repo: Repo,
        bus: Bus,
        ledger: Arc<StockLedger<Repo, Bus>>,
        coordinator: Arc<TransferCoordinator<Repo, Bus>>,
        aggregator: InventoryAggregator<Repo>,
    }

    fn pipeline() -> Pipeline {
        let repo: Repo = Arc::new(InMemoryStockRepository::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let publisher = Arc::new(StockEventPublisher::new(bus.clone()));
        let policy = LedgerPolicy::default();

        Pipeline {
            ledger: Arc::new(StockLedger::new(repo.clone(), publisher.clone(), policy)),
            coordinator: Arc::new(TransferCoordinator::new(repo.clone(), publisher, policy)),
            aggregator: InventoryAggregator::new(repo.clone()),
            repo,
            bus,
        }
    }

    fn catalog(p: &Pipeline, warehouses: usize) -> (ProductId, Vec<WarehouseId>) {
        let product = ProductId::new();
        p.ledger.register_product(Product::new(product, "Pearl earrings")).unwrap();
        let ids = (0..warehouses)
            .map(|i| {
                let id = WarehouseId::new();
                p.ledger
                    .register_warehouse(Warehouse::new(id, format!("W{i}"), 10_000).unwrap())
                    .unwrap();
                id
            })
            .collect();
        (product, ids)
    }

    /// Rebuild quantities from the event stream alone.
    fn replay(events: &[EventEnvelope<StockEvent>]) -> HashMap<StockKey, i64> {
        let mut quantities = HashMap::new();
        for envelope in events {
            match envelope.payload() {
                StockEvent::RecordOpened { key, .. } => {
                    quantities.entry(*key).or_insert(0);
                }
                StockEvent::StockAdded { key, quantity, .. } | StockEvent::QuantitySet { key, quantity, .. } => {
                    quantities.insert(*key, *quantity);
                }
                StockEvent::StockTransferred {
                    product_id,
                    source,
                    target,
                    source_quantity,
                    target_quantity,
                    ..
                } => {
                    quantities.insert(StockKey::new(*product_id, *source), *source_quantity);
                    quantities.insert(StockKey::new(*product_id, *target), *target_quantity);
                }
                StockEvent::DiscountChanged { .. } | StockEvent::MinimumStockChanged { .. } => {}
            }
        }
        quantities
    }

    #[test]
    fn event_stream_rebuilds_repository_state() {
        let p = pipeline();
        let sub = p.bus.subscribe();
        let (product, w) = catalog(&p, 3);

        p.ledger.add_stock(product, w[0], 20, Some(dec!(99.90))).unwrap();
        p.ledger.set_quantity(product, w[1], 5).unwrap();
        p.coordinator
            .transfer(TransferRequest::new(product, w[0], w[2], 7))
            .unwrap();
        p.coordinator
            .transfer(TransferRequest::new(product, w[1], w[0], 5))
            .unwrap();
        let _ = p.coordinator.transfer(TransferRequest::new(product, w[1], w[2], 1));

        let events = sub.drain();
        let sequences: Vec<_> = events.iter().map(EventEnvelope::sequence_number).collect();
        assert_eq!(sequences, (1..=sequences.len() as u64).collect::<Vec<_>>());

        assert_eq!(replay(&events), stored_quantities(&p));
    }

    #[test]
    fn background_subscriber_sees_committed_transfers() {
        let p = pipeline();
        let (product, w) = catalog(&p, 2);
        p.ledger.add_stock(product, w[0], 10, None).unwrap();

        let sub = p.bus.subscribe();
        let handle = thread::spawn(move || sub.recv_timeout(Duration::from_secs(1)));

        p.coordinator
            .transfer(TransferRequest::new(product, w[0], w[1], 4))
            .unwrap();

        let envelope = handle.join().unwrap().unwrap();
        assert_eq!(envelope.event_type(), "stock.record.opened");
    }

    fn stored_quantities(p: &Pipeline) -> HashMap<StockKey, i64> {
        p.repo
            .list()
            .unwrap()
            .into_iter()
            .map(|r| (r.key(), r.quantity()))
            .collect()
    }

    #[test]
    fn concurrent_transfers_conserve_units() {
        let p = pipeline();
        let sub = p.bus.subscribe();
        let (product, w) = catalog(&p, 3);
        for id in &w {
            p.ledger.add_stock(product, *id, 100, None).unwrap();
        }

        let handles: Vec<_> = (0..6)
            .map(|t| {
                let coordinator = p.coordinator.clone();
                let w = w.clone();
                thread::spawn(move || {
                    let mut committed = 0;
                    for i in 0..50 {
                        let from = w[(t + i) % 3];
                        let to = w[(t + i + 1) % 3];
                        match coordinator.transfer(TransferRequest::new(product, from, to, 3)) {
                            Ok(_) => committed += 1,
                            Err(LedgerError::StaleWrite(_)) | Err(LedgerError::InsufficientStock { .. }) => {}
                            Err(other) => panic!("unexpected transfer error: {other}"),
                        }
                    }
                    committed
                })
            })
            .collect();

        let committed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert!(committed > 0);

        let rows = p.ledger.get_by_product(product).unwrap();
        assert!(rows.iter().all(|r| r.quantity() >= 0));
        assert_eq!(rows.iter().map(StockRecord::quantity).sum::<i64>(), 300);
        assert_eq!(p.aggregator.total_quantity(product).unwrap(), 300);

        assert_eq!(replay(&sub.drain()), stored_quantities(&p));
    }

    #[test]
    fn concurrent_corrections_replay_to_stored_state() {
        let p = pipeline();
        let sub = p.bus.subscribe();
        let (product, w) = catalog(&p, 2);
        p.ledger.add_stock(product, w[0], 500, None).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = p.ledger.clone();
                let coordinator = p.coordinator.clone();
                let w = w.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let outcome = if (t + i) % 2 == 0 {
                            ledger.set_quantity(product, w[0], (t * 100 + i) as i64).map(|_| ())
                        } else {
                            coordinator
                                .transfer(TransferRequest::new(product, w[0], w[1], 1))
                                .map(|_| ())
                        };
                        match outcome {
                            Ok(()) | Err(LedgerError::StaleWrite(_)) | Err(LedgerError::InsufficientStock { .. }) => {}
                            Err(other) => panic!("unexpected error: {other}"),
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Delivery order already matches commit order.
        let events = sub.drain();
        let sequences: Vec<_> = events.iter().map(EventEnvelope::sequence_number).collect();
        assert_eq!(sequences, (1..=sequences.len() as u64).collect::<Vec<_>>());
        assert_eq!(replay(&events), stored_quantities(&p));
    }

    #[test]
    fn discounted_price_and_rollups_after_transfers() {
        let p = pipeline();
        let (product, w) = catalog(&p, 2);
        p.ledger.add_stock(product, w[0], 3, Some(dec!(100))).unwrap();
        p.coordinator
            .transfer(TransferRequest::new(product, w[0], w[1], 3))
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let discount = Discount::new(
            DiscountRule::percentage(dec!(20), QuantityBand::unbounded()).unwrap(),
            DateWindow::starting(today.pred_opt().unwrap()),
            true,
        );
        let record = p.ledger.set_discount(product, w[0], Some(discount)).unwrap();

        let quote = price_for(&record, 1, today);
        assert!(quote.discount_applied);
        assert_eq!(quote.unit_price, dec!(80));

        assert_eq!(p.aggregator.total_quantity(product).unwrap(), 3);
        assert_eq!(p.aggregator.overall_status(product).unwrap(), ProductStockStatus::InStock);
        assert_eq!(p.aggregator.occupancy_percent(w[0]).unwrap(), dec!(0));
        assert_eq!(p.aggregator.occupancy_percent(w[1]).unwrap(), dec!(0.03));
    }
}
