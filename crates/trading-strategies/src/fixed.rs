//! Constant signal source.

use trading_core::{error::StrategyError, traits::SignalSource, types::MarketSnapshot};

/// Always returns the same signal.
#[derive(Debug, Clone, Copy)]
pub struct FixedSignal {
    value: f64,
}

impl FixedSignal {
    /// Create a fixed source. The value must lie in `[-1, 1]`.
    pub fn new(value: f64) -> Result<Self, StrategyError> {
        if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
            return Err(StrategyError::InvalidConfig(format!(
                "Fixed signal must be within [-1, 1], got {}",
                value
            )));
        }
        Ok(Self { value })
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl SignalSource for FixedSignal {
    fn name(&self) -> &str {
        "fixed"
    }

    fn signal(&self, _symbol: &str, _snapshot: &MarketSnapshot, _current_position: f64) -> Result<f64, StrategyError> {
        Ok(self.value)
    }

    fn description(&self) -> &str {
        "Constant signal, for demos and dry runs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_signal_bounds() {
        assert!(FixedSignal::new(0.6).is_ok());
        assert!(FixedSignal::new(-1.0).is_ok());
        assert!(FixedSignal::new(1.5).is_err());
        assert!(FixedSignal::new(f64::NAN).is_err());
    }
}
