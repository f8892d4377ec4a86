//! Configuration loading and representation.
//!
//! Everything is read from environment variables. Missing values fall back to
//! development defaults with a warning; malformed values are errors.

use std::time::Duration;

use anyhow::Context;

pub const ENV_API_URL: &str = "STOCK_API_URL";
pub const ENV_API_TOKEN: &str = "STOCK_API_TOKEN";
pub const ENV_API_TIMEOUT_MS: &str = "STOCK_API_TIMEOUT_MS";
pub const ENV_DEFAULT_MINIMUM: &str = "STOCK_DEFAULT_MINIMUM";

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Ledger behaviour knobs shared by the store and the transfer coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerPolicy {
    /// `minimum_stock` given to records the ledger creates implicitly.
    pub default_minimum_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Base URL of the stock backend (no trailing slash required).
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// Per-request timeout for backend calls.
    pub request_timeout: Duration,
    pub policy: LedgerPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            policy: LedgerPolicy::default(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        match lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            Some(url) => config.api_base_url = url.trim().trim_end_matches('/').to_string(),
            None => tracing::warn!(
                fallback = DEFAULT_API_URL,
                "{ENV_API_URL} not set; using development default"
            ),
        }

        config.api_token = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty());

        if let Some(raw) = lookup(ENV_API_TIMEOUT_MS) {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_API_TIMEOUT_MS} must be a whole number of milliseconds (got {raw:?})"))?;
            anyhow::ensure!(ms > 0, "{ENV_API_TIMEOUT_MS} must be positive");
            config.request_timeout = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup(ENV_DEFAULT_MINIMUM) {
            let minimum: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_DEFAULT_MINIMUM} must be an integer (got {raw:?})"))?;
            anyhow::ensure!(minimum >= 0, "{ENV_DEFAULT_MINIMUM} cannot be negative");
            config.policy.default_minimum_stock = minimum;
        }

        Ok(config)
    }
}
