//! Trading decisions and the order intents derived from them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderRequest, Side};
use crate::error::TradingError;

/// Recommended action for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// The order side this action trades on, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            Action::Buy => Some(Side::Buy),
            Action::Sell => Some(Side::Sell),
            Action::Hold => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

/// A bounded, confidence-weighted trade instruction for one symbol.
///
/// `target_quantity` is the desired holding after the trade, expressed
/// relative to the position the decision was made against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Recommended action
    pub action: Action,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Desired post-trade holding
    pub target_quantity: f64,
    /// Raw signal in [-1, 1] the decision was derived from
    pub signal: f64,
}

impl Decision {
    /// The no-op decision: hold the current position with zero confidence.
    pub fn hold(current_position: f64) -> Self {
        Self {
            action: Action::Hold,
            confidence: 0.0,
            target_quantity: current_position,
            signal: 0.0,
        }
    }

    /// Whether this decision leaves the position unchanged.
    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

/// An order the loop intends to submit this cycle.
///
/// Never persisted: intents are recomputed from scratch every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Symbol to trade
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Strictly positive quantity
    pub quantity: f64,
}

impl OrderIntent {
    /// Convert into a market order request.
    pub fn to_market_request(&self) -> Result<OrderRequest, TradingError> {
        let quantity = Decimal::try_from(self.quantity).map_err(|e| {
            TradingError::Validation(format!(
                "quantity {} for {} is not representable: {}",
                self.quantity, self.symbol, e
            ))
        })?;
        if quantity <= Decimal::ZERO {
            return Err(TradingError::Validation(format!(
                "quantity for {} must be positive, got {}",
                self.symbol, quantity
            )));
        }
        Ok(OrderRequest::market(&self.symbol, self.side, quantity))
    }
}
