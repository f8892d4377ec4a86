use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use stockledger_core::{
    Entity, ExpectedVersion, LedgerError, LedgerResult, ProductId, Versioned, WarehouseId,
};
use stockledger_inventory::{Product, StockKey, StockRecord, Warehouse};

use super::r#trait::StockRepository;

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    warehouses: HashMap<WarehouseId, Warehouse>,
    records: BTreeMap<StockKey, StockRecord>,
}

impl State {
    fn current_version(&self, key: &StockKey) -> u64 {
        self.records.get(key).map(Versioned::version).unwrap_or(0)
    }

    fn check(&self, record: &StockRecord) -> LedgerResult<u64> {
        let current = self.current_version(record.id());
        ExpectedVersion::Exact(record.version())
            .check(current)
            .map_err(|e| LedgerError::stale_write(format!("{}: {e}", record.key())))?;
        Ok(current + 1)
    }

    fn commit(&mut self, record: StockRecord, version: u64) -> StockRecord {
        let committed = record.committed_as(version);
        self.records.insert(committed.key(), committed.clone());
        committed
    }
}

/// In-memory stock repository.
///
/// One `RwLock` guards all state: readers share it, and a write (single record
/// or transfer pair) holds it exclusively for its check-and-commit. Intended for
/// tests/dev and as the reference implementation of the repository contract.
#[derive(Debug, Default)]
pub struct InMemoryStockRepository {
    state: RwLock<State>,
}

impl InMemoryStockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| LedgerError::storage("stock repository lock poisoned"))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| LedgerError::storage("stock repository lock poisoned"))
    }
}

impl StockRepository for InMemoryStockRepository {
    fn upsert_product(&self, product: Product) -> LedgerResult<()> {
        self.write()?.products.insert(product.id_typed(), product);
        Ok(())
    }

    fn product(&self, product_id: ProductId) -> LedgerResult<Option<Product>> {
        Ok(self.read()?.products.get(&product_id).cloned())
    }

    fn upsert_warehouse(&self, warehouse: Warehouse) -> LedgerResult<()> {
        self.write()?.warehouses.insert(warehouse.id_typed(), warehouse);
        Ok(())
    }

    fn warehouse(&self, warehouse_id: WarehouseId) -> LedgerResult<Option<Warehouse>> {
        Ok(self.read()?.warehouses.get(&warehouse_id).cloned())
    }

    fn get(&self, key: StockKey) -> LedgerResult<Option<StockRecord>> {
        Ok(self.read()?.records.get(&key).cloned())
    }

    fn list(&self) -> LedgerResult<Vec<StockRecord>> {
        Ok(self.read()?.records.values().cloned().collect())
    }

    fn list_by_product(&self, product_id: ProductId) -> LedgerResult<Vec<StockRecord>> {
        Ok(self
            .read()?
            .records
            .values()
            .filter(|r| r.product_id() == product_id)
            .cloned()
            .collect())
    }

    fn list_by_warehouse(&self, warehouse_id: WarehouseId) -> LedgerResult<Vec<StockRecord>> {
        Ok(self
            .read()?
            .records
            .values()
            .filter(|r| r.warehouse_id() == warehouse_id)
            .cloned()
            .collect())
    }

    fn save(&self, record: StockRecord) -> LedgerResult<StockRecord> {
        let mut state = self.write()?;
        let next = state.check(&record)?;
        Ok(state.commit(record, next))
    }

    fn save_pair(
        &self,
        first: StockRecord,
        second: StockRecord,
    ) -> LedgerResult<(StockRecord, StockRecord)> {
        if first.key() == second.key() {
            return Err(LedgerError::SameWarehouse(first.warehouse_id()));
        }

        let mut state = self.write()?;
        // Check both before committing either.
        let first_next = state.check(&first)?;
        let second_next = state.check(&second)?;

        let first = state.commit(first, first_next);
        let second = state.commit(second, second_next);
        Ok((first, second))
    }
}
