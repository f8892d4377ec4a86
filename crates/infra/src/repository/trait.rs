use std::sync::Arc;

use stockledger_core::{LedgerResult, ProductId, WarehouseId};
use stockledger_inventory::{Product, StockKey, StockRecord, Warehouse};

/// Storage contract for stock records and the catalog entries they reference.
///
/// ## Writes are compare-and-swap
///
/// `save` treats the version carried by the record as the version the writer
/// read. If the stored version differs (or a record with version 0 already
/// exists) the write fails with `LedgerError::StaleWrite` and nothing changes.
/// On success the stored record gets the next version and is returned.
///
/// ## Pairs are atomic
///
/// `save_pair` applies the same check to both records and commits both or
/// neither. No reader observes one half of the pair.
pub trait StockRepository: Send + Sync {
    /// Register or replace a product.
    fn upsert_product(&self, product: Product) -> LedgerResult<()>;

    fn product(&self, product_id: ProductId) -> LedgerResult<Option<Product>>;

    /// Register or replace a warehouse.
    fn upsert_warehouse(&self, warehouse: Warehouse) -> LedgerResult<()>;

    fn warehouse(&self, warehouse_id: WarehouseId) -> LedgerResult<Option<Warehouse>>;

    fn get(&self, key: StockKey) -> LedgerResult<Option<StockRecord>>;

    /// All records, ordered by key.
    fn list(&self) -> LedgerResult<Vec<StockRecord>>;

    /// All warehouse rows for a product, ordered by warehouse.
    fn list_by_product(&self, product_id: ProductId) -> LedgerResult<Vec<StockRecord>>;

    /// All product rows at a warehouse.
    fn list_by_warehouse(&self, warehouse_id: WarehouseId) -> LedgerResult<Vec<StockRecord>>;

    fn save(&self, record: StockRecord) -> LedgerResult<StockRecord>;

    fn save_pair(
        &self,
        first: StockRecord,
        second: StockRecord,
    ) -> LedgerResult<(StockRecord, StockRecord)>;
}

impl<R> StockRepository for Arc<R>
where
    R: StockRepository + ?Sized,
{
    fn upsert_product(&self, product: Product) -> LedgerResult<()> {
        (**self).upsert_product(product)
    }

    fn product(&self, product_id: ProductId) -> LedgerResult<Option<Product>> {
        (**self).product(product_id)
    }

    fn upsert_warehouse(&self, warehouse: Warehouse) -> LedgerResult<()> {
        (**self).upsert_warehouse(warehouse)
    }

    fn warehouse(&self, warehouse_id: WarehouseId) -> LedgerResult<Option<Warehouse>> {
        (**self).warehouse(warehouse_id)
    }

    fn get(&self, key: StockKey) -> LedgerResult<Option<StockRecord>> {
        (**self).get(key)
    }

    fn list(&self) -> LedgerResult<Vec<StockRecord>> {
        (**self).list()
    }

    fn list_by_product(&self, product_id: ProductId) -> LedgerResult<Vec<StockRecord>> {
        (**self).list_by_product(product_id)
    }

    fn list_by_warehouse(&self, warehouse_id: WarehouseId) -> LedgerResult<Vec<StockRecord>> {
        (**self).list_by_warehouse(warehouse_id)
    }

    fn save(&self, record: StockRecord) -> LedgerResult<StockRecord> {
        (**self).save(record)
    }

    fn save_pair(
        &self,
        first: StockRecord,
        second: StockRecord,
    ) -> LedgerResult<(StockRecord, StockRecord)> {
        (**self).save_pair(first, second)
    }
}
