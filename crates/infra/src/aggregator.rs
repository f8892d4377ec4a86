//! Product and warehouse rollups derived from the stock records.
//!
//! Read-only: every figure is recomputed from a repository read, nothing is
//! cached.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use stockledger_core::{LedgerError, LedgerResult, ProductId, WarehouseId};
use stockledger_inventory::{StockRecord, StockStatus};

use crate::ledger::{ensure_product, ensure_warehouse};
use crate::repository::StockRepository;

/// Product-level availability. Unlike `StockStatus` there is no low band.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStockStatus {
    InStock,
    OutOfStock,
}

/// One warehouse row of a product summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    pub status: StockStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub total_quantity: i64,
    pub overall_status: ProductStockStatus,
    pub warehouses: Vec<WarehouseStock>,
}

#[derive(Debug)]
pub struct InventoryAggregator<R> {
    repo: R,
}

impl<R: StockRepository> InventoryAggregator<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Sum of quantity over every warehouse holding the product.
    pub fn total_quantity(&self, product_id: ProductId) -> LedgerResult<i64> {
        let rows = self.repo.list_by_product(product_id)?;
        Ok(sum_quantities(&rows))
    }

    /// `InStock` as soon as any warehouse holds at least one unit.
    pub fn overall_status(&self, product_id: ProductId) -> LedgerResult<ProductStockStatus> {
        Ok(status_for_total(self.total_quantity(product_id)?))
    }

    /// `sum(quantity at warehouse) / capacity × 100`, rounded to two places.
    ///
    /// Capacity is positive by construction of `Warehouse`, so the division is
    /// always defined. The result may exceed 100 when a warehouse is over-filled.
    pub fn occupancy_percent(&self, warehouse_id: WarehouseId) -> LedgerResult<Decimal> {
        let warehouse = ensure_warehouse(&self.repo, warehouse_id)?;
        let occupied = sum_quantities(&self.repo.list_by_warehouse(warehouse_id)?);

        let percent = Decimal::from(occupied)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(Decimal::from(warehouse.capacity())))
            .ok_or_else(|| {
                LedgerError::invalid_capacity(format!(
                    "occupancy of warehouse {warehouse_id} is not representable"
                ))
            })?;
        Ok(percent.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn product_summary(&self, product_id: ProductId) -> LedgerResult<ProductSummary> {
        ensure_product(&self.repo, product_id)?;
        let rows = self.repo.list_by_product(product_id)?;
        let total_quantity = sum_quantities(&rows);

        Ok(ProductSummary {
            product_id,
            total_quantity,
            overall_status: status_for_total(total_quantity),
            warehouses: rows
                .iter()
                .map(|r| WarehouseStock {
                    warehouse_id: r.warehouse_id(),
                    quantity: r.quantity(),
                    status: r.status(),
                })
                .collect(),
        })
    }

    /// Records at or below their minimum (including empty ones), optionally
    /// restricted to one warehouse. Emptiest first.
    pub fn low_stock(&self, warehouse_id: Option<WarehouseId>) -> LedgerResult<Vec<StockRecord>> {
        let rows = match warehouse_id {
            Some(id) => {
                ensure_warehouse(&self.repo, id)?;
                self.repo.list_by_warehouse(id)?
            }
            None => self.repo.list()?,
        };

        let mut low: Vec<_> = rows
            .into_iter()
            .filter(|r| r.status() != StockStatus::InStock)
            .collect();
        low.sort_by_key(|r| (r.quantity(), r.key()));
        Ok(low)
    }
}

fn sum_quantities(rows: &[StockRecord]) -> i64 {
    rows.iter().map(StockRecord::quantity).sum()
}

fn status_for_total(total: i64) -> ProductStockStatus {
    if total > 0 {
        ProductStockStatus::InStock
    } else {
        ProductStockStatus::OutOfStock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use stockledger_events::{EventEnvelope, InMemoryEventBus};
    use stockledger_inventory::{Product, StockEvent, Warehouse};

    use crate::config::LedgerPolicy;
    use crate::ledger::StockLedger;
    use crate::publisher::StockEventPublisher;
    use crate::repository::InMemoryStockRepository;

    type Bus = Arc<InMemoryEventBus<EventEnvelope<StockEvent>>>;
    type Repo = Arc<InMemoryStockRepository>;

    fn setup(minimum: i64) -> (StockLedger<Repo, Bus>, InventoryAggregator<Repo>) {
        let repo: Repo = Arc::new(InMemoryStockRepository::new());
        let publisher = Arc::new(StockEventPublisher::new(Bus::default()));
        let ledger = StockLedger::new(
            repo.clone(),
            publisher,
            LedgerPolicy {
                default_minimum_stock: minimum,
            },
        );
        (ledger, InventoryAggregator::new(repo))
    }

    fn warehouse(ledger: &StockLedger<Repo, Bus>, capacity: i64) -> WarehouseId {
        let id = WarehouseId::new();
        ledger
            .register_warehouse(Warehouse::new(id, "W", capacity).unwrap())
            .unwrap();
        id
    }

    fn product(ledger: &StockLedger<Repo, Bus>) -> ProductId {
        let id = ProductId::new();
        ledger.register_product(Product::new(id, "P")).unwrap();
        id
    }

    #[test]
    fn some_stock_anywhere_means_in_stock() {
        let (ledger, agg) = setup(0);
        let p = product(&ledger);
        let w1 = warehouse(&ledger, 100);
        let w2 = warehouse(&ledger, 100);
        ledger.set_quantity(p, w1, 0).unwrap();
        ledger.set_quantity(p, w2, 3).unwrap();

        assert_eq!(agg.total_quantity(p).unwrap(), 3);
        assert_eq!(agg.overall_status(p).unwrap(), ProductStockStatus::InStock);
    }

    #[test]
    fn never_stocked_product_is_out_of_stock() {
        let (ledger, agg) = setup(0);
        let p = product(&ledger);
        assert_eq!(agg.total_quantity(p).unwrap(), 0);
        assert_eq!(agg.overall_status(p).unwrap(), ProductStockStatus::OutOfStock);
    }

    #[test]
    fn occupancy_sums_all_products_at_the_warehouse() {
        let (ledger, agg) = setup(0);
        let w = warehouse(&ledger, 300);
        let a = product(&ledger);
        let b = product(&ledger);
        ledger.add_stock(a, w, 50, None).unwrap();
        ledger.add_stock(b, w, 50, None).unwrap();

        assert_eq!(agg.occupancy_percent(w).unwrap(), dec!(33.33));
    }

    #[test]
    fn occupancy_of_unknown_warehouse_is_not_found() {
        let (_, agg) = setup(0);
        assert!(matches!(
            agg.occupancy_percent(WarehouseId::new()),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn summary_lists_every_row() {
        let (ledger, agg) = setup(2);
        let p = product(&ledger);
        let w1 = warehouse(&ledger, 10);
        let w2 = warehouse(&ledger, 10);
        ledger.add_stock(p, w1, 1, None).unwrap();
        ledger.add_stock(p, w2, 9, None).unwrap();

        let summary = agg.product_summary(p).unwrap();
        assert_eq!(summary.total_quantity, 10);
        assert_eq!(summary.overall_status, ProductStockStatus::InStock);
        assert_eq!(summary.warehouses.len(), 2);
        assert!(
            summary
                .warehouses
                .iter()
                .any(|row| row.warehouse_id == w1 && row.status == StockStatus::LowStock)
        );
    }

    #[test]
    fn low_stock_orders_emptiest_first() {
        let (ledger, agg) = setup(5);
        let w = warehouse(&ledger, 100);
        let full = product(&ledger);
        let low = product(&ledger);
        let empty = product(&ledger);
        ledger.add_stock(full, w, 20, None).unwrap();
        ledger.add_stock(low, w, 4, None).unwrap();
        ledger.set_quantity(empty, w, 0).unwrap();

        let rows = agg.low_stock(Some(w)).unwrap();
        let ids: Vec<_> = rows.iter().map(StockRecord::product_id).collect();
        assert_eq!(ids, vec![empty, low]);
        assert_eq!(agg.low_stock(None).unwrap().len(), 2);
    }
}
