//! Remote stock backend: the collaborator that owns persisted stock records.
//!
//! The ledger core never talks HTTP itself; it goes through [`StockService`],
//! implemented over `reqwest` by [`HttpStockService`] and by in-process fakes
//! in tests.

pub mod http;
pub mod optimistic;
pub mod transfer;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockledger_core::LedgerError;
use stockledger_inventory::{Discount, StockKey, StockRecord};

pub use http::HttpStockService;
pub use optimistic::OptimisticStockClient;
pub use transfer::{RemoteTransferCoordinator, RemoteTransferError};

/// Body of `POST /warehouses/{w}/products/{p}/stock`.
///
/// `quantity` is a signed delta so that a compensating decrement uses the same
/// call as a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPost {
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl StockPost {
    pub fn delta(quantity: i64) -> Self {
        Self {
            quantity,
            location: None,
            price: None,
        }
    }

    pub fn with_price(mut self, price: Option<Decimal>) -> Self {
        self.price = price;
        self
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The backend rejected the call with a ledger-level reason.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({0}): {1}")]
    Api(u16, String),

    #[error("parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait StockService: Send + Sync {
    /// `GET /warehouses/{w}/products/{p}`.
    async fn fetch(&self, key: StockKey) -> Result<StockRecord, RemoteError>;

    /// `POST /warehouses/{w}/products/{p}/stock`; returns the updated record.
    async fn post_stock(&self, key: StockKey, post: &StockPost) -> Result<StockRecord, RemoteError>;

    /// Replace the nested discount object of the stock record resource.
    async fn put_discount(
        &self,
        key: StockKey,
        discount: Option<&Discount>,
    ) -> Result<StockRecord, RemoteError>;
}

#[async_trait]
impl<S> StockService for std::sync::Arc<S>
where
    S: StockService + ?Sized,
{
    async fn fetch(&self, key: StockKey) -> Result<StockRecord, RemoteError> {
        (**self).fetch(key).await
    }

    async fn post_stock(&self, key: StockKey, post: &StockPost) -> Result<StockRecord, RemoteError> {
        (**self).post_stock(key, post).await
    }

    async fn put_discount(
        &self,
        key: StockKey,
        discount: Option<&Discount>,
    ) -> Result<StockRecord, RemoteError> {
        (**self).put_discount(key, discount).await
    }
}
