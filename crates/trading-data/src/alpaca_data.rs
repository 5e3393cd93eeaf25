//! Alpaca market data snapshot provider.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use trading_core::error::DataError;
use trading_core::traits::MarketDataProvider;
use trading_core::types::MarketSnapshot;

/// Alpaca data API configuration.
#[derive(Debug, Clone)]
pub struct AlpacaDataConfig {
    pub api_key: String,
    pub api_secret: String,
    pub data_url: String,
    /// Data feed (`iex` or `sip`)
    pub feed: String,
}

impl AlpacaDataConfig {
    pub const DEFAULT_DATA_URL: &'static str = "https://data.alpaca.markets";

    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            data_url: Self::DEFAULT_DATA_URL.to_string(),
            feed: "iex".to_string(),
        }
    }

    pub fn with_data_url(mut self, data_url: impl Into<String>) -> Self {
        self.data_url = data_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_feed(mut self, feed: impl Into<String>) -> Self {
        self.feed = feed.into();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockSnapshot {
    latest_trade: Option<Trade>,
    daily_bar: Option<Bar>,
}

#[derive(Debug, Deserialize)]
struct Trade {
    p: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Bar {
    v: Option<f64>,
}

/// Snapshot provider backed by the Alpaca stocks snapshot endpoint.
pub struct AlpacaDataProvider {
    config: AlpacaDataConfig,
    client: Client,
}

impl AlpacaDataProvider {
    /// Create a new provider.
    pub fn new(config: AlpacaDataConfig) -> Result<Self, DataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| DataError::Configuration(e.to_string()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(&config.api_secret)
                .map_err(|e| DataError::Configuration(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl MarketDataProvider for AlpacaDataProvider {
    async fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, DataError> {
        let url = format!("{}/v2/stocks/{}/snapshot", self.config.data_url, symbol);

        let resp = self
            .client
            .get(&url)
            .query(&[("feed", self.config.feed.as_str())])
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

        let data: StockSnapshot = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let price = data.latest_trade.and_then(|t| t.p);
        let volume = data.daily_bar.and_then(|b| b.v);

        debug!(symbol, ?price, ?volume, "Alpaca snapshot");
        Ok(MarketSnapshot::new(symbol, price, volume))
    }

    fn name(&self) -> &str {
        "alpaca"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_snapshot_uses_latest_trade_and_daily_bar() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/stocks/MSFT/snapshot")
            .match_header("APCA-API-KEY-ID", "key")
            .match_header("APCA-API-SECRET-KEY", "secret")
            .match_query(Matcher::UrlEncoded("feed".into(), "iex".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"symbol":"MSFT","latestTrade":{"t":"2024-01-08T15:00:00Z","p":410.25,"s":50},"dailyBar":{"o":400.0,"c":410.0,"v":1200000}}"#,
            )
            .create_async()
            .await;

        let provider =
            AlpacaDataProvider::new(AlpacaDataConfig::new("key", "secret").with_data_url(server.url()))
                .unwrap();
        let snapshot = provider.get_snapshot("MSFT").await.unwrap();
        mock.assert_async().await;

        assert_eq!(snapshot.price, Some(410.25));
        assert_eq!(snapshot.volume, Some(1_200_000.0));
    }

    #[tokio::test]
    async fn test_server_error_is_connection_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2/stocks/MSFT/snapshot")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let provider =
            AlpacaDataProvider::new(AlpacaDataConfig::new("key", "secret").with_data_url(server.url()))
                .unwrap();
        assert!(matches!(
            provider.get_snapshot("MSFT").await,
            Err(DataError::ConnectionError(_))
        ));
    }
}
