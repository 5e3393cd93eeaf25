//! Signal source and policy scoring traits.

use crate::error::StrategyError;
use crate::types::MarketSnapshot;

/// Produces a scalar trading signal in `[-1, 1]` for one symbol.
///
/// Positive values lean towards buying, negative towards selling.
/// Implementations must be safe to call from several tasks at once.
pub trait SignalSource: Send + Sync {
    /// Get the unique name of this source.
    fn name(&self) -> &str;

    /// Compute the signal for a symbol.
    ///
    /// # Arguments
    /// * `symbol` - The symbol being decided on
    /// * `snapshot` - Snapshot with a usable price
    /// * `current_position` - Currently held quantity
    fn signal(
        &self,
        symbol: &str,
        snapshot: &MarketSnapshot,
        current_position: f64,
    ) -> Result<f64, StrategyError>;

    /// Get a description of the source.
    fn description(&self) -> &str {
        ""
    }
}

/// A trained policy that scores an observation vector.
pub trait PolicyScorer: Send + Sync {
    /// Number of features the policy expects.
    fn observation_dim(&self) -> usize;

    /// Score an observation, returning a signal in `[-1, 1]`.
    fn score(&self, observation: &[f64]) -> Result<f64, StrategyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstantSource(f64);

    impl SignalSource for ConstantSource {
        fn name(&self) -> &str {
            "constant"
        }

        fn signal(&self, _: &str, _: &MarketSnapshot, _: f64) -> Result<f64, StrategyError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_default_description() {
        let source = ConstantSource(0.5);
        assert_eq!(source.description(), "");
        let snapshot = MarketSnapshot::new("AAPL", Some(1.0), None);
        assert_eq!(source.signal("AAPL", &snapshot, 0.0).unwrap(), 0.5);
    }
}
