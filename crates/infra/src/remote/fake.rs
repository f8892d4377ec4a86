use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use stockledger_core::{LedgerError, Versioned};
use stockledger_inventory::{Discount, StockKey, StockRecord};

use super::{RemoteError, StockPost, StockService};

/// In-process backend with scripted failures.
///
/// Each `post_stock` pops the next entry of the script; `Some(err)` fails that
/// call without touching state. An empty script means every call succeeds.
#[derive(Debug, Default)]
pub struct FakeStockService {
    records: Mutex<HashMap<StockKey, StockRecord>>,
    script: Mutex<VecDeque<Option<RemoteError>>>,
    posts: Mutex<Vec<(StockKey, i64)>>,
}

impl FakeStockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, key: StockKey, quantity: i64, price: Decimal) {
        let mut record = StockRecord::open(key, price, 0, Utc::now()).unwrap();
        if quantity > 0 {
            record.add(quantity, Utc::now()).unwrap();
        }
        self.records.lock().unwrap().insert(key, record.committed_as(1));
    }

    pub fn script(&self, outcomes: impl IntoIterator<Item = Option<RemoteError>>) {
        self.script.lock().unwrap().extend(outcomes);
    }

    pub fn quantity(&self, key: StockKey) -> Option<i64> {
        self.records.lock().unwrap().get(&key).map(StockRecord::quantity)
    }

    pub fn posts(&self) -> Vec<(StockKey, i64)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StockService for FakeStockService {
    async fn fetch(&self, key: StockKey) -> Result<StockRecord, RemoteError> {
        self.records
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(key.to_string()).into())
    }

    async fn post_stock(&self, key: StockKey, post: &StockPost) -> Result<StockRecord, RemoteError> {
        if let Some(Some(err)) = self.script.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.posts.lock().unwrap().push((key, post.quantity));

        let now = Utc::now();
        let mut records = self.records.lock().unwrap();
        let mut record = match records.get(&key) {
            Some(r) => r.clone(),
            None => StockRecord::open(key, post.price.unwrap_or_default(), 0, now)?,
        };
        match post.quantity {
            q if q > 0 => record.add(q, now)?,
            q if q < 0 => record.withdraw(-q, now)?,
            _ => return Err(LedgerError::invalid_quantity("zero delta").into()),
        }
        if let Some(price) = post.price {
            record.set_unit_price(price, now)?;
        }
        let next = record.version() + 1;
        let record = record.committed_as(next);
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn put_discount(
        &self,
        key: StockKey,
        discount: Option<&Discount>,
    ) -> Result<StockRecord, RemoteError> {
        if let Some(Some(err)) = self.script.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut records = self.records.lock().unwrap();
        let mut record = records
            .get(&key)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(key.to_string()))?;
        record.set_discount(discount.cloned(), Utc::now());
        let next = record.version() + 1;
        let record = record.committed_as(next);
        records.insert(key, record.clone());
        Ok(record)
    }
}
