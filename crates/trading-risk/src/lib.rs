//! Risk controls for the trading loop.
//!
//! Provides the order-submission gate and a consecutive-failure breaker.

mod breaker;
mod gate;

pub use breaker::FailureBreaker;
pub use gate::{GateOutcome, OrderGate};

use serde::{Deserialize, Serialize};
use trading_core::error::TradingError;

/// Risk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Orders are submitted only when confidence is strictly above this
    pub min_confidence: f64,
    /// Stop the loop after this many consecutive faulted cycles (0 = never)
    pub max_consecutive_faults: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            max_consecutive_faults: 0,
        }
    }
}

impl RiskConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), TradingError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(TradingError::Validation(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }
}
