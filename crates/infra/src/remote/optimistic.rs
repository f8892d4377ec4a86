//! Client-side view of remote stock records with optimistic updates.
//!
//! A change is staged locally (so it shows up immediately in `view`), sent to
//! the backend, and then either confirmed with the server's record or rolled
//! back. The local table is never locked across an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rust_decimal::Decimal;

use stockledger_core::LedgerError;
use stockledger_inventory::{Discount, PendingChange, StockKey, StockRecord, TrackedRecord};

use super::{RemoteError, StockPost, StockService};

#[derive(Debug)]
pub struct OptimisticStockClient<S> {
    service: S,
    tracked: Mutex<HashMap<StockKey, TrackedRecord>>,
}

impl<S: StockService> OptimisticStockClient<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            tracked: Mutex::new(HashMap::new()),
        }
    }

    fn table(&self) -> Result<MutexGuard<'_, HashMap<StockKey, TrackedRecord>>, RemoteError> {
        self.tracked
            .lock()
            .map_err(|_| LedgerError::storage("optimistic stock table poisoned").into())
    }

    /// What the user should see: the pending preview if one exists, else the
    /// last committed record.
    pub fn view(&self, key: StockKey) -> Option<StockRecord> {
        let table = self.table().ok()?;
        table.get(&key).map(|t| t.effective().clone())
    }

    pub fn is_pending(&self, key: StockKey) -> bool {
        self.table()
            .map(|t| t.get(&key).is_some_and(TrackedRecord::is_pending))
            .unwrap_or(false)
    }

    /// Fetch the record from the backend and track it as committed.
    ///
    /// Refused while a change for the same record is in flight.
    pub async fn refresh(&self, key: StockKey) -> Result<StockRecord, RemoteError> {
        let record = self.service.fetch(key).await?;
        let mut table = self.table()?;
        if table.get(&key).is_some_and(TrackedRecord::is_pending) {
            return Err(LedgerError::stale_write(format!("{key} has a change in flight")).into());
        }
        table.insert(key, TrackedRecord::new(record.clone()));
        Ok(record)
    }

    pub async fn add_stock(
        &self,
        key: StockKey,
        delta: i64,
        unit_price: Option<Decimal>,
    ) -> Result<StockRecord, RemoteError> {
        self.submit(key, PendingChange::AddStock { delta, unit_price }).await
    }

    pub async fn withdraw(&self, key: StockKey, quantity: i64) -> Result<StockRecord, RemoteError> {
        self.submit(key, PendingChange::Withdraw { quantity }).await
    }

    pub async fn set_quantity(&self, key: StockKey, quantity: i64) -> Result<StockRecord, RemoteError> {
        self.submit(key, PendingChange::SetQuantity { quantity }).await
    }

    pub async fn set_discount(
        &self,
        key: StockKey,
        discount: Option<Discount>,
    ) -> Result<StockRecord, RemoteError> {
        self.submit(key, PendingChange::SetDiscount { discount }).await
    }

    #[tracing::instrument(skip(self, key, change), fields(%key))]
    async fn submit(&self, key: StockKey, change: PendingChange) -> Result<StockRecord, RemoteError> {
        let tracked_already = self.table()?.contains_key(&key);
        if !tracked_already {
            self.refresh(key).await?;
        }

        let committed_quantity = {
            let mut table = self.table()?;
            let tracked = table
                .get_mut(&key)
                .ok_or_else(|| LedgerError::not_found(key.to_string()))?;
            tracked.stage(change.clone(), Utc::now())?;
            tracked.committed().quantity()
        };

        let result = match &change {
            PendingChange::AddStock { delta, unit_price } => {
                let post = StockPost::delta(*delta).with_price(*unit_price);
                self.service.post_stock(key, &post).await
            }
            PendingChange::Withdraw { quantity } => {
                self.service.post_stock(key, &StockPost::delta(-quantity)).await
            }
            PendingChange::SetQuantity { quantity } => {
                let delta = quantity - committed_quantity;
                if delta == 0 {
                    // Nothing to send; the committed record already matches.
                    self.service.fetch(key).await
                } else {
                    self.service.post_stock(key, &StockPost::delta(delta)).await
                }
            }
            PendingChange::SetDiscount { discount } => {
                self.service.put_discount(key, discount.as_ref()).await
            }
        };

        let mut table = self.table()?;
        let tracked = table
            .get_mut(&key)
            .ok_or_else(|| LedgerError::not_found(key.to_string()))?;
        match result {
            Ok(server) => match tracked.confirm(server) {
                Ok(confirmed) => Ok(confirmed.clone()),
                Err(err) => {
                    tracing::warn!(%err, "backend confirmed a different record; rolling back");
                    tracked.rollback();
                    Err(err.into())
                }
            },
            Err(err) => {
                tracing::warn!(%err, "backend rejected change; rolling back");
                tracked.rollback();
                Err(err)
            }
        }
    }
}
