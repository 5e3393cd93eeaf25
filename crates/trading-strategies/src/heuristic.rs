//! Exposure-based heuristic.
//!
//! The signal falls linearly with the notional value already held:
//! a flat book is a strong buy, a book at or above `max_notional` is a
//! strong sell, and half the limit is neutral.

use serde::{Deserialize, Serialize};
use trading_core::{error::StrategyError, traits::SignalSource, types::MarketSnapshot};

/// Configuration for the position heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Notional exposure (position * price) treated as fully loaded
    pub max_notional: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            max_notional: 10_000.0,
        }
    }
}

impl HeuristicConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), StrategyError> {
        if !self.max_notional.is_finite() || self.max_notional <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "max_notional must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Rule-based source over the current position and price.
#[derive(Debug, Clone)]
pub struct PositionHeuristic {
    config: HeuristicConfig,
}

impl PositionHeuristic {
    /// Create a new heuristic source.
    pub fn new(config: HeuristicConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl SignalSource for PositionHeuristic {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn signal(&self, symbol: &str, snapshot: &MarketSnapshot, current_position: f64) -> Result<f64, StrategyError> {
        let price = snapshot
            .usable_price()
            .ok_or_else(|| StrategyError::Internal(format!("no usable price for {}", symbol)))?;

        let exposure = (current_position * price / self.config.max_notional).clamp(0.0, 1.0);
        Ok(1.0 - 2.0 * exposure)
    }

    fn description(&self) -> &str {
        "Buys when exposure is low, sells as it approaches the notional limit"
    }
}
