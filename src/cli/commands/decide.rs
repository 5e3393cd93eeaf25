//! One-off decision command.

use anyhow::Result;
use serde::Serialize;
use trading_config::AppConfig;
use trading_core::error::TradingError;
use trading_core::types::{Decision, MarketSnapshot};
use trading_risk::{GateOutcome, OrderGate};
use trading_strategies::{DecisionEngine, SignalSourceKind, SignalSourceRegistry};

use crate::cli::DecideArgs;

#[derive(Debug, Serialize)]
struct DecideOutput<'a> {
    symbol: &'a str,
    source: &'a str,
    decision: Decision,
    order: GateOutcome,
}

pub async fn run(args: DecideArgs, mut config: AppConfig) -> Result<()> {
    if let Some(kind) = args.signal_source {
        config.signal.kind = kind;
    }
    if let Some(signal) = args.signal {
        config.signal.kind = SignalSourceKind::Fixed;
        config.signal.fixed_signal = signal;
    }
    config.decision.validate().map_err(TradingError::from)?;
    config.risk.validate()?;

    let source = SignalSourceRegistry::new()
        .build(&config.signal)
        .map_err(TradingError::from)?;
    let engine = DecisionEngine::new(config.decision.clone(), source);

    let symbol = args.symbol.trim().to_uppercase();
    let snapshot = MarketSnapshot::new(symbol.as_str(), Some(args.price), args.volume);
    let decision = engine.decide(&symbol, &snapshot, args.position);
    let order = OrderGate::new(&config.risk).evaluate(&symbol, &decision, args.position);

    let output = DecideOutput {
        symbol: &symbol,
        source: engine.source_name(),
        decision,
        order,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
