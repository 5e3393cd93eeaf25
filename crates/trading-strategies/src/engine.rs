//! Decision engine.
//!
//! Maps a signal in `[-1, 1]` to an action, a confidence and a target
//! holding. The engine never fails: missing data and source faults both
//! degrade to holding the current position.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};
use trading_core::{
    error::StrategyError,
    traits::SignalSource,
    types::{Action, Decision, MarketSnapshot},
};

/// Thresholds and sizing constants for signal-to-decision mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Signals strictly above this are BUY
    pub buy_threshold: f64,
    /// Signals strictly below this are SELL
    pub sell_threshold: f64,
    /// Shares traded per unit of `confidence * |signal|`
    pub size_multiplier: f64,
    /// Confidence is `min(1, confidence_scale * |signal|)`
    pub confidence_scale: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            buy_threshold: 0.1,
            sell_threshold: -0.1,
            size_multiplier: 10.0,
            confidence_scale: 2.0,
        }
    }
}

impl DecisionConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), StrategyError> {
        let values = [
            self.buy_threshold,
            self.sell_threshold,
            self.size_multiplier,
            self.confidence_scale,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(StrategyError::InvalidConfig(
                "Decision thresholds must be finite".into(),
            ));
        }
        if self.sell_threshold > self.buy_threshold {
            return Err(StrategyError::InvalidConfig(
                "Sell threshold must not exceed buy threshold".into(),
            ));
        }
        if self.buy_threshold < -1.0 || self.buy_threshold > 1.0 {
            return Err(StrategyError::InvalidConfig(
                "Buy threshold must be within [-1, 1]".into(),
            ));
        }
        if self.sell_threshold < -1.0 || self.sell_threshold > 1.0 {
            return Err(StrategyError::InvalidConfig(
                "Sell threshold must be within [-1, 1]".into(),
            ));
        }
        if self.size_multiplier < 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Size multiplier must not be negative".into(),
            ));
        }
        if self.confidence_scale <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Confidence scale must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Stateless decision engine over a pluggable signal source.
#[derive(Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
    source: Arc<dyn SignalSource>,
}

impl DecisionEngine {
    /// Create a new decision engine.
    pub fn new(config: DecisionConfig, source: Arc<dyn SignalSource>) -> Self {
        Self { config, source }
    }

    /// Name of the active signal source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Get the configuration.
    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Decide what to do with a symbol.
    ///
    /// Returns `HOLD` with zero confidence when the snapshot has no usable
    /// price, when the position is not finite, or when the signal source
    /// fails.
    pub fn decide(&self, symbol: &str, snapshot: &MarketSnapshot, current_position: f64) -> Decision {
        if !current_position.is_finite() {
            warn!(symbol, current_position, "Position is not finite, recommending HOLD");
            return Decision::hold(current_position);
        }

        if !snapshot.is_usable() {
            warn!(symbol, "No price data, recommending HOLD");
            return Decision::hold(current_position);
        }

        let signal = match self.source.signal(symbol, snapshot, current_position) {
            Ok(signal) if signal.is_finite() => signal.clamp(-1.0, 1.0),
            Ok(signal) => {
                error!(symbol, source = self.source.name(), signal, "Signal is not finite");
                return Decision::hold(current_position);
            }
            Err(e) => {
                error!(symbol, source = self.source.name(), error = %e, "Error determining action");
                return Decision::hold(current_position);
            }
        };

        let decision = self.map_signal(signal, current_position);
        debug!(
            symbol,
            action = %decision.action,
            confidence = decision.confidence,
            target_quantity = decision.target_quantity,
            signal,
            "Decision"
        );
        decision
    }

    /// Map a signal to a decision relative to `current_position`.
    pub fn map_signal(&self, signal: f64, current_position: f64) -> Decision {
        let magnitude = signal.abs();
        let confidence = (self.config.confidence_scale * magnitude).min(1.0);
        let step = (self.config.size_multiplier * confidence * magnitude).round_ties_even();

        let (action, target_quantity) = if signal > self.config.buy_threshold {
            (Action::Buy, current_position + step)
        } else if signal < self.config.sell_threshold {
            (Action::Sell, (current_position - step).max(0.0))
        } else {
            (Action::Hold, current_position)
        };

        Decision {
            action,
            confidence,
            target_quantity,
            signal,
        }
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("config", &self.config)
            .field("source", &self.source.name())
            .finish()
    }
}
