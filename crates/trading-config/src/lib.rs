//! Configuration management.

mod settings;

pub use settings::{
    AlpacaSettings, AppConfig, AppSettings, DataSettings, LoggingConfig, PaperSettings,
    PolygonSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

fn environment() -> Environment {
    Environment::with_prefix("TRADING")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("universe.symbols")
}

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(environment())
        .build()?;

    config.try_deserialize()
}

/// Load configuration from defaults and environment only.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(environment())
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_file() {
        let path = write_temp(
            "quant-trader-load",
            r#"
[universe]
symbols = ["nvda", "AMD"]

[trading_loop]
pacing_secs = 1
cycle_interval_secs = 5

[market_hours]
timezone = "America/Chicago"
open = "08:30"
close = "15:00"

[signal]
kind = "random"
seed = 7
"#,
        );

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.universe.symbols, vec!["nvda", "AMD"]);
        assert_eq!(config.trading_loop.pacing_secs, 1);
        assert_eq!(config.trading_loop.market_closed_poll_secs, 180);
        assert_eq!(config.market_hours.timezone, "America/Chicago");
        assert_eq!(config.signal.seed, Some(7));
        assert_eq!(config.decision.size_multiplier, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shipped_default_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = load_config(&path).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.risk.min_confidence, 0.7);
        assert_eq!(config.trading_loop.pacing_secs, 15);
        assert_eq!(config.market_hours.open, "09:30");
        assert_eq!(config.universe.symbols.len(), 5);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_config(Path::new("/nonexistent/quant-trader.toml")).is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = AppConfig::default();
        let path = write_temp("quant-trader-roundtrip", &config.to_toml().unwrap());

        let loaded = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.universe, config.universe);
        assert_eq!(loaded.decision, config.decision);
        assert_eq!(loaded.paper.initial_cash, config.paper.initial_cash);
    }
}
