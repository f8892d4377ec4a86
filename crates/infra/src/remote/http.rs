//! `reqwest`-backed [`StockService`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use stockledger_core::LedgerError;
use stockledger_inventory::{Discount, StockKey, StockRecord};

use super::{RemoteError, StockPost, StockService};
use crate::config::LedgerConfig;

#[derive(Debug, Clone)]
pub struct HttpStockService {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct DiscountPatch<'a> {
    discount: Option<&'a Discount>,
}

/// Body the backend sends with a 422 when a decrement exceeds stock.
#[derive(Deserialize)]
struct InsufficientStockBody {
    requested: i64,
    available: i64,
}

impl HttpStockService {
    /// Client with the configured base URL, bearer token and request timeout.
    pub fn new(config: &LedgerConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, key: StockKey) -> String {
        format!(
            "{}/warehouses/{}/products/{}",
            self.base_url, key.warehouse_id, key.product_id
        )
    }

    fn stock_url(&self, key: StockKey) -> String {
        format!("{}/stock", self.item_url(key))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<StockRecord, RemoteError> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let resp = req.send().await.map_err(|e| RemoteError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), %body, "stock backend rejected request");
            return Err(classify(status.as_u16(), body));
        }

        resp.json().await.map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

/// Map a non-success response onto the error taxonomy.
pub(crate) fn classify(status: u16, body: String) -> RemoteError {
    let message = || {
        if body.trim().is_empty() {
            format!("backend returned {status}")
        } else {
            body.clone()
        }
    };

    match status {
        404 => LedgerError::not_found(message()).into(),
        409 => LedgerError::stale_write(message()).into(),
        422 => match serde_json::from_str::<InsufficientStockBody>(&body) {
            Ok(b) => LedgerError::insufficient_stock(b.requested, b.available).into(),
            Err(_) => RemoteError::Api(status, body),
        },
        _ => RemoteError::Api(status, body),
    }
}

#[async_trait]
impl StockService for HttpStockService {
    #[tracing::instrument(skip(self, key), fields(%key))]
    async fn fetch(&self, key: StockKey) -> Result<StockRecord, RemoteError> {
        self.send(self.client.get(self.item_url(key))).await
    }

    #[tracing::instrument(skip(self, key, post), fields(%key, quantity = post.quantity))]
    async fn post_stock(&self, key: StockKey, post: &StockPost) -> Result<StockRecord, RemoteError> {
        self.send(self.client.post(self.stock_url(key)).json(post)).await
    }

    #[tracing::instrument(skip(self, key, discount), fields(%key, clear = discount.is_none()))]
    async fn put_discount(
        &self,
        key: StockKey,
        discount: Option<&Discount>,
    ) -> Result<StockRecord, RemoteError> {
        let body = DiscountPatch { discount };
        self.send(self.client.patch(self.item_url(key)).json(&body)).await
    }
}
