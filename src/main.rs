//! Automated equities trading loop.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;
use trading_core::error::TradingError;
use trading_monitor::{setup_logging, LoggingOptions};

/// Exit code for configuration and credential errors.
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Fatal error");
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli::load_settings(cli.config.as_deref())?;

    let options = LoggingOptions {
        level: cli
            .log_level
            .map(|l| l.as_str().to_string())
            .unwrap_or_else(|| config.logging.level.clone()),
        json: cli.json_logs || config.logging.is_json(),
        file: cli.log_file.clone().or_else(|| config.logging.file.clone()),
    };
    let _guard = setup_logging(&options)?;

    match cli.command {
        Commands::Run(args) => cli::commands::run::run(args, config).await,
        Commands::Decide(args) => cli::commands::decide::run(args, config).await,
        Commands::MarketStatus => cli::commands::market_status::run(&config).await,
        Commands::Sources => cli::commands::sources::run().await,
        Commands::ValidateConfig => cli::commands::validate::run(&config).await,
    }
}

/// Map an error to the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    let is_config = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<TradingError>())
        .any(TradingError::is_configuration);
    if is_config {
        EXIT_CONFIG
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use trading_core::error::BrokerError;

    #[test]
    fn test_exit_codes() {
        let err: anyhow::Error = TradingError::from(BrokerError::Configuration(
            "ALPACA_API_KEY not set".into(),
        ))
        .into();
        assert_eq!(exit_code(&err), EXIT_CONFIG);

        let err = Err::<(), _>(TradingError::Config("bad".into()))
            .context("loading settings")
            .unwrap_err();
        assert_eq!(exit_code(&err), EXIT_CONFIG);

        let err: anyhow::Error =
            TradingError::from(BrokerError::Configuration("invalid header value".into()))
                .into();
        assert_eq!(exit_code(&err), EXIT_CONFIG);

        let err: anyhow::Error = BrokerError::Connection("reset".into()).into();
        assert_eq!(exit_code(&err), 1);

        let err: anyhow::Error = TradingError::Halted { consecutive_faults: 3 }.into();
        assert_eq!(exit_code(&err), 1);
    }
}
