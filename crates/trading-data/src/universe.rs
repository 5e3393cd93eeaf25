//! Symbol universe.

use csv::ReaderBuilder;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use trading_core::error::DataError;
use trading_core::traits::OrderRouter;

/// Where the universe comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// Static symbol list
    pub symbols: Vec<String>,
    /// CSV file with a `Symbol` column, merged after the static list
    pub csv_path: Option<PathBuf>,
    /// URL serving CSV with a `Symbol` column, fetched once per run
    pub csv_url: Option<String>,
    /// Drop symbols the brokerage reports as not tradeable
    pub filter_tradeable: bool,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            symbols: ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            csv_path: None,
            csv_url: None,
            filter_tradeable: false,
        }
    }
}

/// CSV record format.
#[derive(Debug, Deserialize)]
struct SymbolRecord {
    #[serde(alias = "Symbol", alias = "symbol", alias = "Ticker", alias = "ticker")]
    symbol: String,
}

/// Ordered, de-duplicated list of upper-case symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolUniverse {
    symbols: Vec<String>,
}

impl SymbolUniverse {
    /// Build from a list, preserving first-seen order.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut universe = Self::default();
        universe.extend(symbols);
        universe
    }

    /// Load symbols from a CSV file.
    pub fn from_csv(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            return Err(DataError::Configuration(format!(
                "Universe file not found: {}",
                path.display()
            )));
        }
        let file = std::fs::File::open(path).map_err(|e| DataError::Internal(e.to_string()))?;
        Self::from_reader(file)
    }

    /// Fetch symbols from a CSV document served over HTTP.
    pub async fn from_url(url: &str) -> Result<Self, DataError> {
        let client = Client::builder()
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        let resp = client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::ConnectionError(format!(
                "universe fetch from {} failed: {}",
                url, status
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        Self::from_reader(&body[..])
    }

    /// Load symbols from CSV content.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut symbols = Vec::new();
        for result in reader.deserialize() {
            let record: SymbolRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            symbols.push(record.symbol);
        }

        Ok(Self::from_symbols(symbols))
    }

    /// Resolve the universe described by a config: the static list, then
    /// the CSV file, then the CSV URL.
    pub async fn load(config: &UniverseConfig) -> Result<Self, DataError> {
        let mut universe = Self::from_symbols(&config.symbols);
        if let Some(path) = &config.csv_path {
            let from_file = Self::from_csv(path)?;
            info!(path = %path.display(), count = from_file.len(), "Loaded symbols from file");
            universe.extend(from_file.symbols);
        }
        if let Some(url) = &config.csv_url {
            let fetched = Self::from_url(url).await?;
            info!(url = %url, count = fetched.len(), "Fetched symbols");
            universe.extend(fetched.symbols);
        }
        Ok(universe)
    }

    fn extend<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = self.symbols.iter().cloned().collect();
        for symbol in symbols {
            let symbol = symbol.as_ref().trim().to_uppercase();
            if !symbol.is_empty() && seen.insert(symbol.clone()) {
                self.symbols.push(symbol);
            }
        }
    }

    /// Keep only symbols the router reports as tradeable.
    ///
    /// A lookup error counts as not tradeable.
    pub async fn filter_tradeable(self, router: &dyn OrderRouter) -> Self {
        let mut kept = Vec::with_capacity(self.symbols.len());
        for symbol in self.symbols {
            match router.is_tradeable(&symbol).await {
                Ok(true) => kept.push(symbol),
                Ok(false) => info!(symbol = %symbol, "Dropping non-tradeable symbol"),
                Err(e) => warn!(symbol = %symbol, error = %e, "Tradability check failed, dropping"),
            }
        }
        Self { symbols: kept }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use trading_core::error::BrokerError;
    use trading_core::types::{Order, OrderRequest};

    #[test]
    fn test_dedup_and_uppercase() {
        let universe = SymbolUniverse::from_symbols(["aapl", "MSFT", " AAPL ", "", "tsla"]);
        assert_eq!(universe.symbols(), &["AAPL", "MSFT", "TSLA"]);
    }

    #[test]
    fn test_csv_symbol_column() {
        let csv = "Symbol,Security,GICS Sector\nAAPL,Apple Inc.,Information Technology\nmsft,Microsoft,Information Technology\nAAPL,Apple Inc.,Information Technology\n";
        let universe = SymbolUniverse::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(universe.symbols(), &["AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_configuration_error() {
        let config = UniverseConfig {
            csv_path: Some(PathBuf::from("/nonexistent/sp500.csv")),
            ..Default::default()
        };
        assert!(matches!(
            SymbolUniverse::load(&config).await,
            Err(DataError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_load_merges_fetched_constituents() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/constituents.csv")
            .with_status(200)
            .with_header("content-type", "text/csv")
            .with_body("Symbol,Security\nMSFT,Microsoft\nNVDA,Nvidia\nbrk.b,Berkshire Hathaway\n")
            .create_async()
            .await;

        let config = UniverseConfig {
            symbols: vec!["AAPL".into(), "MSFT".into()],
            csv_url: Some(format!("{}/constituents.csv", server.url())),
            ..Default::default()
        };
        let universe = SymbolUniverse::load(&config).await.unwrap();
        assert_eq!(universe.symbols(), &["AAPL", "MSFT", "NVDA", "BRK.B"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_connection_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/constituents.csv")
            .with_status(503)
            .create_async()
            .await;

        let url = format!("{}/constituents.csv", server.url());
        assert!(matches!(
            SymbolUniverse::from_url(&url).await,
            Err(DataError::ConnectionError(_))
        ));
    }

    struct Router;

    #[async_trait]
    impl OrderRouter for Router {
        async fn submit_order(&self, _request: OrderRequest) -> Result<Order, BrokerError> {
            Err(BrokerError::OrderRejected("unused".into()))
        }

        async fn is_tradeable(&self, symbol: &str) -> Result<bool, BrokerError> {
            match symbol {
                "AAPL" => Ok(true),
                "OTC" => Ok(false),
                _ => Err(BrokerError::Connection("down".into())),
            }
        }

        fn name(&self) -> &str {
            "router"
        }
    }

    #[tokio::test]
    async fn test_filter_tradeable() {
        let universe = SymbolUniverse::from_symbols(["AAPL", "OTC", "ERR"]);
        let filtered = universe.filter_tradeable(&Router).await;
        assert_eq!(filtered.symbols(), &["AAPL"]);
    }
}
