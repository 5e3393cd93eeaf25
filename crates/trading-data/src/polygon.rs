//! Polygon.io snapshot provider.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use trading_core::error::DataError;
use trading_core::traits::MarketDataProvider;
use trading_core::types::MarketSnapshot;

/// Polygon API configuration.
#[derive(Debug, Clone)]
pub struct PolygonConfig {
    pub api_key: String,
    pub base_url: String,
}

impl PolygonConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.polygon.io";

    /// Create config with the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Load the API key from the named environment variable.
    pub fn from_env(key_var: &str) -> Result<Self, DataError> {
        let api_key = std::env::var(key_var)
            .map_err(|_| DataError::Configuration(format!("{} not set", key_var)))?;
        if api_key.trim().is_empty() {
            return Err(DataError::Configuration(format!("{} is empty", key_var)));
        }
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    ticker: Option<TickerSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerSnapshot {
    last_trade: Option<LastTrade>,
    day: Option<DayBar>,
}

#[derive(Debug, Deserialize)]
struct LastTrade {
    p: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DayBar {
    v: Option<f64>,
}

/// Snapshot provider backed by the Polygon stocks snapshot endpoint.
pub struct PolygonProvider {
    config: PolygonConfig,
    client: Client,
}

impl PolygonProvider {
    /// Create a new provider.
    pub fn new(config: PolygonConfig) -> Result<Self, DataError> {
        let client = Client::builder()
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn snapshot_url(&self, symbol: &str) -> String {
        format!(
            "{}/v2/snapshot/locale/us/markets/stocks/tickers/{}",
            self.config.base_url, symbol
        )
    }
}

#[async_trait]
impl MarketDataProvider for PolygonProvider {
    async fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, DataError> {
        let resp = self
            .client
            .get(self.snapshot_url(symbol))
            .query(&[("apiKey", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(DataError::SymbolNotFound(symbol.to_string())),
            StatusCode::TOO_MANY_REQUESTS => return Err(DataError::RateLimited),
            status if !status.is_success() => {
                let text = resp.text().await.unwrap_or_default();
                return Err(DataError::ConnectionError(format!("{}: {}", status, text)));
            }
            _ => {}
        }

        let data: SnapshotResponse = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let ticker = data.ticker;
        let price = ticker
            .as_ref()
            .and_then(|t| t.last_trade.as_ref())
            .and_then(|t| t.p);
        let volume = ticker.as_ref().and_then(|t| t.day.as_ref()).and_then(|d| d.v);

        debug!(symbol, ?price, ?volume, "Polygon snapshot");
        Ok(MarketSnapshot::new(symbol, price, volume))
    }

    fn name(&self) -> &str {
        "polygon"
    }
}
