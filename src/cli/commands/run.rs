//! Trading loop command.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use trading_broker::{AlpacaBroker, AlpacaConfig, MarkingProvider, PaperBroker};
use trading_config::AppConfig;
use trading_core::error::{DataError, TradingError};
use trading_core::traits::{MarketDataProvider, OrderRouter, PositionTracker};
use trading_data::{
    AlpacaDataConfig, AlpacaDataProvider, DataProviderKind, PolygonConfig, PolygonProvider,
    SymbolUniverse,
};
use trading_risk::OrderGate;
use trading_runner::{MarketHours, SystemClock, TradingLoop, TradingLoopParts};
use trading_strategies::{DecisionEngine, SignalSourceRegistry};

use crate::cli::{OutputFormat, RunArgs};

pub async fn run(args: RunArgs, mut config: AppConfig) -> Result<()> {
    if !args.symbols.is_empty() {
        config.universe.symbols = args.symbols.clone();
        config.universe.csv_path = None;
        config.universe.csv_url = None;
    }
    if let Some(kind) = args.signal_source {
        config.signal.kind = kind;
    }
    if let Some(provider) = args.provider {
        config.data.provider = provider;
    }
    config.validate()?;

    info!(
        environment = %config.app.environment,
        provider = %config.data.provider,
        source = %config.signal.kind,
        dry_run = args.dry_run,
        "Starting quant-trader"
    );

    let source = SignalSourceRegistry::new()
        .build(&config.signal)
        .map_err(TradingError::from)?;
    let engine = DecisionEngine::new(config.decision.clone(), source);
    let market_hours = MarketHours::from_config(&config.market_hours)?;
    let provider = build_provider(&config)?;

    let (market_data, positions, router): (
        Arc<dyn MarketDataProvider>,
        Arc<dyn PositionTracker>,
        Arc<dyn OrderRouter>,
    ) = if args.dry_run {
        info!(cash = %config.paper.initial_cash, "Dry run against the paper broker");
        let paper = PaperBroker::new(config.paper.initial_cash);
        let marking: Arc<dyn MarketDataProvider> =
            Arc::new(MarkingProvider::new(provider, paper.clone()));
        let positions: Arc<dyn PositionTracker> = Arc::new(paper.clone());
        let router: Arc<dyn OrderRouter> = Arc::new(paper);
        (marking, positions, router)
    } else {
        let broker = Arc::new(connect_alpaca(alpaca_config(&config)?)?);
        info!(paper = config.alpaca.paper, "Connected to Alpaca");
        let positions: Arc<dyn PositionTracker> = broker.clone();
        let router: Arc<dyn OrderRouter> = broker;
        (provider, positions, router)
    };

    let mut universe = SymbolUniverse::load(&config.universe)
        .await
        .map_err(TradingError::from)?;
    if config.universe.filter_tradeable {
        universe = universe.filter_tradeable(router.as_ref()).await;
    }
    if universe.is_empty() {
        return Err(TradingError::Config("no tradeable symbols in the universe".to_string()).into());
    }
    info!(symbols = ?universe.symbols(), "Universe loaded");

    let mut trading_loop = TradingLoop::new(TradingLoopParts {
        universe,
        market_data,
        positions,
        router,
        engine,
        gate: OrderGate::new(&config.risk),
        market_hours,
        clock: Arc::new(SystemClock),
        config: config.trading_loop.clone(),
        max_consecutive_faults: config.risk.max_consecutive_faults,
    });

    if args.once {
        let report = trading_loop.run_cycle().await?;
        match args.output {
            OutputFormat::Text => println!("{}", report.summary()),
            OutputFormat::Json => println!("{}", report.to_json()?),
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!(error = %e, "Unable to listen for Ctrl-C"),
        }
    });

    let summary = trading_loop.run(shutdown_rx).await?;

    println!();
    println!("Run Summary");
    println!("═══════════════════════════════════════════════════════════");
    println!("  Cycles:            {}", summary.cycles);
    println!("  Faulted cycles:    {}", summary.faulted_cycles);
    println!("  Interrupted:       {}", summary.interrupted_cycles);
    println!("  Closed checks:     {}", summary.closed_checks);
    println!("  Orders submitted:  {}", summary.orders_submitted);
    println!("  Orders failed:     {}", summary.orders_failed);

    Ok(())
}

/// Build the configured market data provider.
fn build_provider(config: &AppConfig) -> Result<Arc<dyn MarketDataProvider>, TradingError> {
    let provider: Arc<dyn MarketDataProvider> = match config.data.provider {
        DataProviderKind::Polygon => {
            let polygon = PolygonConfig::from_env(&config.polygon.api_key_env)?
                .with_base_url(config.polygon.base_url.as_str());
            Arc::new(PolygonProvider::new(polygon)?)
        }
        DataProviderKind::Alpaca => {
            let key = require_env(&config.alpaca.api_key_env)?;
            let secret = require_env(&config.alpaca.api_secret_env)?;
            let alpaca = AlpacaDataConfig::new(key, secret)
                .with_data_url(config.alpaca.data_url.as_str())
                .with_feed(config.alpaca.feed.as_str());
            Arc::new(AlpacaDataProvider::new(alpaca)?)
        }
    };
    Ok(provider)
}

fn alpaca_config(config: &AppConfig) -> Result<AlpacaConfig, TradingError> {
    let mut alpaca = AlpacaConfig::from_env(
        &config.alpaca.api_key_env,
        &config.alpaca.api_secret_env,
        config.alpaca.paper,
    )?;
    if let Some(base_url) = &config.alpaca.base_url {
        alpaca = alpaca.with_base_url(base_url.as_str());
    }
    Ok(alpaca)
}

fn connect_alpaca(alpaca: AlpacaConfig) -> Result<AlpacaBroker, TradingError> {
    AlpacaBroker::new(alpaca).map_err(TradingError::from)
}

fn require_env(var: &str) -> Result<String, DataError> {
    std::env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| DataError::Configuration(format!("{} not set", var)))
}
