//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use trading_config::{load_config, load_from_env, AppConfig};
use trading_core::error::TradingError;
use trading_data::DataProviderKind;
use trading_strategies::SignalSourceKind;

/// Config file used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "quant-trader")]
#[command(author, version, about = "Automated equities trading loop")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "QUANT_TRADER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    /// Also log to a daily-rolling file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the trading loop
    Run(RunArgs),
    /// Make a one-off decision for a symbol
    Decide(DecideArgs),
    /// Show whether the market is open now
    MarketStatus,
    /// List available signal sources
    Sources,
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Symbols to trade (comma-separated), replaces the configured universe
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Trade against the in-memory paper broker
    #[arg(long)]
    pub dry_run: bool,

    /// Signal source (heuristic, random, policy, fixed)
    #[arg(long)]
    pub signal_source: Option<SignalSourceKind>,

    /// Market data provider (polygon, alpaca)
    #[arg(long)]
    pub provider: Option<DataProviderKind>,

    /// Run a single cycle now, regardless of market hours
    #[arg(long)]
    pub once: bool,

    /// Report format for --once
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct DecideArgs {
    /// Symbol to decide on
    #[arg(short = 'S', long)]
    pub symbol: String,

    /// Last trade price
    #[arg(short, long)]
    pub price: f64,

    /// Day volume
    #[arg(long)]
    pub volume: Option<f64>,

    /// Currently held quantity
    #[arg(long, default_value = "0")]
    pub position: f64,

    /// Signal source (heuristic, random, policy, fixed)
    #[arg(long)]
    pub signal_source: Option<SignalSourceKind>,

    /// Force a signal value; implies the fixed source
    #[arg(long, allow_negative_numbers = true)]
    pub signal: Option<f64>,
}

/// Load configuration from the given file, the default file, or the
/// environment alone.
pub fn load_settings(path: Option<&Path>) -> Result<AppConfig, TradingError> {
    let result = match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => load_config(Path::new(DEFAULT_CONFIG)),
        None => load_from_env(),
    };
    result.map_err(|e| TradingError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from([
            "quant-trader",
            "--log-level",
            "debug",
            "run",
            "--symbols",
            "AAPL,MSFT",
            "--dry-run",
            "--signal-source",
            "random",
            "--once",
        ])
        .unwrap();

        assert_eq!(cli.log_level.map(|l| l.as_str()), Some("debug"));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.symbols, vec!["AAPL", "MSFT"]);
                assert!(args.dry_run);
                assert!(args.once);
                assert_eq!(args.signal_source, Some(SignalSourceKind::Random));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_decide_args() {
        let cli = Cli::try_parse_from([
            "quant-trader",
            "decide",
            "--symbol",
            "aapl",
            "--price",
            "150",
            "--position",
            "5",
            "--signal",
            "-0.6",
        ])
        .unwrap();

        match cli.command {
            Commands::Decide(args) => {
                assert_eq!(args.price, 150.0);
                assert_eq!(args.position, 5.0);
                assert_eq!(args.signal, Some(-0.6));
            }
            _ => panic!("expected decide"),
        }
    }

    #[test]
    fn test_unknown_signal_source_rejected() {
        let result = Cli::try_parse_from(["quant-trader", "run", "--signal-source", "oracle"]);
        assert!(result.is_err());
    }
}
