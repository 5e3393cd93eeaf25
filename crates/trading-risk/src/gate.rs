//! Order-submission gate.

use serde::{Deserialize, Serialize};
use trading_core::types::{Action, Decision, OrderIntent, Side};

use crate::RiskConfig;

/// Result of gating a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    /// Decision was HOLD
    Hold,
    /// Confidence did not clear the threshold
    LowConfidence { confidence: f64 },
    /// Computed delta was zero or negative
    NoDelta { delta: f64 },
    /// Order should be submitted
    Submit(OrderIntent),
}

impl GateOutcome {
    /// The intent to submit, if any.
    pub fn intent(&self) -> Option<&OrderIntent> {
        match self {
            GateOutcome::Submit(intent) => Some(intent),
            _ => None,
        }
    }
}

/// Converts decisions into order intents.
#[derive(Debug, Clone)]
pub struct OrderGate {
    min_confidence: f64,
}

impl OrderGate {
    /// Create a new gate.
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
        }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Gate a decision against the current position.
    ///
    /// BUY trades `target - current`, SELL trades `current - target`.
    /// Confidence must be strictly above the threshold and the delta
    /// strictly positive.
    pub fn evaluate(&self, symbol: &str, decision: &Decision, current_position: f64) -> GateOutcome {
        let (side, delta) = match decision.action {
            Action::Hold => return GateOutcome::Hold,
            Action::Buy => (Side::Buy, decision.target_quantity - current_position),
            Action::Sell => (Side::Sell, current_position - decision.target_quantity),
        };

        if !(decision.confidence > self.min_confidence) {
            return GateOutcome::LowConfidence {
                confidence: decision.confidence,
            };
        }

        if !(delta.is_finite() && delta > 0.0) {
            return GateOutcome::NoDelta { delta };
        }

        GateOutcome::Submit(OrderIntent {
            symbol: symbol.to_string(),
            side,
            quantity: delta,
        })
    }
}

impl Default for OrderGate {
    fn default() -> Self {
        Self::new(&RiskConfig::default())
    }
}
