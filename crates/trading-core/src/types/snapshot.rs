//! Point-in-time market reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time market read for one symbol.
///
/// Produced fresh every cycle. A missing price marks the symbol unusable
/// for the cycle; it is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Symbol
    pub symbol: String,
    /// Last trade price
    pub price: Option<f64>,
    /// Day volume
    pub volume: Option<f64>,
    /// Market capitalization
    pub market_cap: Option<f64>,
    /// Display name
    pub name: Option<String>,
    /// When the snapshot was taken
    pub observed_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Create a snapshot with a price and volume.
    pub fn new(symbol: impl Into<String>, price: Option<f64>, volume: Option<f64>) -> Self {
        let symbol = symbol.into();
        Self {
            name: Some(symbol.clone()),
            symbol,
            price,
            volume,
            market_cap: None,
            observed_at: Utc::now(),
        }
    }

    /// A snapshot with every field null, used when the provider fails.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: None,
            volume: None,
            market_cap: None,
            name: None,
            observed_at: Utc::now(),
        }
    }

    /// The price if it can be traded on: present, finite and positive.
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Whether the symbol can take part in this cycle's decisions.
    pub fn is_usable(&self) -> bool {
        self.usable_price().is_some()
    }
}
