//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trading_core::error::TradingError;
use trading_data::{DataProviderKind, UniverseConfig};
use trading_risk::RiskConfig;
use trading_runner::{LoopConfig, MarketHours, MarketHoursConfig};
use trading_strategies::{DecisionConfig, SignalSettings, SignalSourceKind};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub alpaca: AlpacaSettings,
    #[serde(default)]
    pub polygon: PolygonSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub market_hours: MarketHoursConfig,
    #[serde(default)]
    pub trading_loop: LoopConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub signal: SignalSettings,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub paper: PaperSettings,
}

impl AppConfig {
    /// Check every section for out-of-range values.
    pub fn validate(&self) -> Result<(), TradingError> {
        self.logging.validate()?;
        self.decision.validate()?;
        self.signal.heuristic.validate()?;
        self.risk.validate()?;
        self.trading_loop.validate()?;
        MarketHours::from_config(&self.market_hours)?;

        match self.signal.kind {
            SignalSourceKind::Fixed if !(-1.0..=1.0).contains(&self.signal.fixed_signal) => {
                return Err(TradingError::Validation(format!(
                    "signal.fixed_signal must be within [-1, 1], got {}",
                    self.signal.fixed_signal
                )));
            }
            SignalSourceKind::Policy
                if self.signal.policy_path.is_none() && !self.signal.fallback_to_heuristic =>
            {
                return Err(TradingError::Validation(
                    "signal.policy_path is required for the policy source".to_string(),
                ));
            }
            _ => {}
        }

        if self.universe.symbols.is_empty()
            && self.universe.csv_path.is_none()
            && self.universe.csv_url.is_none()
        {
            return Err(TradingError::Validation(
                "universe needs symbols, a csv_path or a csv_url".to_string(),
            ));
        }

        if self.paper.initial_cash <= Decimal::ZERO {
            return Err(TradingError::Validation(
                "paper.initial_cash must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, TradingError> {
        toml::to_string_pretty(self).map_err(|e| TradingError::Internal(e.to_string()))
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "quant-trader".to_string(),
            environment: "paper".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    fn validate(&self) -> Result<(), TradingError> {
        match self.format.to_lowercase().as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(TradingError::Validation(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Alpaca API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlpacaSettings {
    pub api_key_env: String,
    pub api_secret_env: String,
    pub paper: bool,
    /// Overrides the trading endpoint
    pub base_url: Option<String>,
    pub data_url: String,
    pub feed: String,
}

impl Default for AlpacaSettings {
    fn default() -> Self {
        Self {
            api_key_env: "ALPACA_API_KEY".to_string(),
            api_secret_env: "ALPACA_API_SECRET".to_string(),
            paper: true,
            base_url: None,
            data_url: "https://data.alpaca.markets".to_string(),
            feed: "iex".to_string(),
        }
    }
}

/// Polygon API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonSettings {
    pub api_key_env: String,
    pub base_url: String,
}

impl Default for PolygonSettings {
    fn default() -> Self {
        Self {
            api_key_env: "POLYGON_API_KEY".to_string(),
            base_url: "https://api.polygon.io".to_string(),
        }
    }
}

/// Market data source selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub provider: DataProviderKind,
}

/// In-memory broker used by dry runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSettings {
    pub initial_cash: Decimal,
}

impl Default for PaperSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            initial_cash: dec!(100000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_loop_constants() {
        let config = AppConfig::default();
        assert_eq!(config.trading_loop.market_closed_poll_secs, 180);
        assert_eq!(config.trading_loop.cycle_interval_secs, 15);
        assert_eq!(config.trading_loop.fault_backoff_secs, 15);
        assert_eq!(config.trading_loop.pacing_secs, 15);
        assert_eq!(config.risk.min_confidence, 0.7);
        assert_eq!(config.decision.buy_threshold, 0.1);
        assert_eq!(config.market_hours.open, "09:30");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.risk.min_confidence = 2.0;
        assert!(config.validate().unwrap_err().is_configuration());

        let mut config = AppConfig::default();
        config.market_hours.timezone = "Nowhere/Special".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.signal.kind = SignalSourceKind::Policy;
        assert!(config.validate().is_err());
        config.signal.fallback_to_heuristic = true;
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.universe.symbols.clear();
        assert!(config.validate().is_err());
        config.universe.csv_url = Some("https://example.com/sp500.csv".into());
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
    }
}
