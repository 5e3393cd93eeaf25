//! Policy-backed signal source.
//!
//! ## Observation schema (v1)
//!
//! | index | feature |
//! |---|---|
//! | 0 | last trade price |
//! | 1 | day volume / 1,000,000 (0 when unknown) |
//! | 2 | current position / 100 |
//!
//! The policy artifact is trained offline; this module only loads and
//! scores it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use trading_core::{
    error::StrategyError,
    traits::{PolicyScorer, SignalSource},
    types::MarketSnapshot,
};

/// Number of features in the observation vector.
pub const OBSERVATION_DIM: usize = 3;

const VOLUME_SCALE: f64 = 1_000_000.0;
const POSITION_SCALE: f64 = 100.0;

/// Build the policy observation for a symbol.
pub fn build_observation(snapshot: &MarketSnapshot, current_position: f64) -> Result<Vec<f64>, StrategyError> {
    let price = snapshot
        .usable_price()
        .ok_or_else(|| StrategyError::Internal(format!("no usable price for {}", snapshot.symbol)))?;
    let volume = snapshot.volume.filter(|v| v.is_finite()).unwrap_or(0.0);

    let observation = vec![price, volume / VOLUME_SCALE, current_position / POSITION_SCALE];
    if observation.iter().any(|v| !v.is_finite()) {
        return Err(StrategyError::NonFinite(format!(
            "observation for {}: {:?}",
            snapshot.symbol, observation
        )));
    }
    Ok(observation)
}

/// Linear policy artifact scored as `tanh(w . x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPolicy {
    /// Artifact format version
    pub version: u32,
    /// One weight per observation feature
    pub weights: Vec<f64>,
    /// Bias term
    pub bias: f64,
}

impl LinearPolicy {
    /// Artifact format version this build understands.
    pub const VERSION: u32 = 1;

    /// Create a policy from weights and bias.
    pub fn new(weights: Vec<f64>, bias: f64) -> Result<Self, StrategyError> {
        let policy = Self {
            version: Self::VERSION,
            weights,
            bias,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self, StrategyError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StrategyError::Policy(format!("{}: {}", path.display(), e)))?;
        let policy: LinearPolicy = serde_json::from_str(&raw)
            .map_err(|e| StrategyError::Policy(format!("{}: {}", path.display(), e)))?;
        policy.validate()?;

        info!(path = %path.display(), features = policy.weights.len(), "Policy loaded");
        Ok(policy)
    }

    fn validate(&self) -> Result<(), StrategyError> {
        if self.version != Self::VERSION {
            return Err(StrategyError::Policy(format!(
                "unsupported artifact version {} (expected {})",
                self.version,
                Self::VERSION
            )));
        }
        if self.weights.is_empty() {
            return Err(StrategyError::Policy("policy has no weights".into()));
        }
        if self.weights.iter().chain(std::iter::once(&self.bias)).any(|w| !w.is_finite()) {
            return Err(StrategyError::Policy("policy parameters must be finite".into()));
        }
        Ok(())
    }
}

impl PolicyScorer for LinearPolicy {
    fn observation_dim(&self) -> usize {
        self.weights.len()
    }

    fn score(&self, observation: &[f64]) -> Result<f64, StrategyError> {
        if observation.len() != self.weights.len() {
            return Err(StrategyError::ObservationShape {
                expected: self.weights.len(),
                actual: observation.len(),
            });
        }

        let activation: f64 = self
            .weights
            .iter()
            .zip(observation)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;

        Ok(activation.tanh())
    }
}

/// Signal source backed by a trained policy.
pub struct PolicySignal {
    scorer: Arc<dyn PolicyScorer>,
}

impl PolicySignal {
    /// Wrap a scorer. Its observation size must match [`OBSERVATION_DIM`].
    pub fn new(scorer: Arc<dyn PolicyScorer>) -> Result<Self, StrategyError> {
        if scorer.observation_dim() != OBSERVATION_DIM {
            return Err(StrategyError::ObservationShape {
                expected: OBSERVATION_DIM,
                actual: scorer.observation_dim(),
            });
        }
        Ok(Self { scorer })
    }
}

impl SignalSource for PolicySignal {
    fn name(&self) -> &str {
        "policy"
    }

    fn signal(&self, _symbol: &str, snapshot: &MarketSnapshot, current_position: f64) -> Result<f64, StrategyError> {
        let observation = build_observation(snapshot, current_position)?;
        self.scorer.score(&observation)
    }

    fn description(&self) -> &str {
        "Trained policy scoring price, volume and position"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_observation_normalization() {
        let snapshot = MarketSnapshot::new("AAPL", Some(150.0), Some(2_500_000.0));
        let observation = build_observation(&snapshot, 50.0).unwrap();
        assert_eq!(observation, vec![150.0, 2.5, 0.5]);

        let no_volume = MarketSnapshot::new("AAPL", Some(150.0), None);
        assert_eq!(build_observation(&no_volume, 0.0).unwrap(), vec![150.0, 0.0, 0.0]);
    }

    #[test]
    fn test_linear_policy_scores_within_bounds() {
        let policy = LinearPolicy::new(vec![0.0, 1.0, -1.0], 0.0).unwrap();
        let score = policy.score(&[150.0, 2.0, 0.0]).unwrap();
        assert!((score - 2.0_f64.tanh()).abs() < 1e-12);

        let extreme = policy.score(&[0.0, 1e9, 0.0]).unwrap();
        assert!(extreme <= 1.0);
    }

    #[test]
    fn test_policy_shape_mismatch() {
        let policy = LinearPolicy::new(vec![1.0, 1.0], 0.0).unwrap();
        assert!(matches!(
            policy.score(&[1.0, 2.0, 3.0]),
            Err(StrategyError::ObservationShape { expected: 2, actual: 3 })
        ));
        assert!(PolicySignal::new(Arc::new(policy)).is_err());
    }

    #[test]
    fn test_policy_signal() {
        let policy = LinearPolicy::new(vec![0.0, 0.0, -1.0], 0.5).unwrap();
        let source = PolicySignal::new(Arc::new(policy)).unwrap();
        let snapshot = MarketSnapshot::new("AAPL", Some(150.0), Some(1e6));

        let signal = source.signal("AAPL", &snapshot, 0.0).unwrap();
        assert!((signal - 0.5_f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_load_artifact() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("policy-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"version": 1, "weights": [0.001, 0.2, -0.5], "bias": 0.0}}"#).unwrap();

        let policy = LinearPolicy::load(&path).unwrap();
        assert_eq!(policy.weights, vec![0.001, 0.2, -0.5]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let path = std::env::temp_dir().join(format!("policy-v9-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"version": 9, "weights": [1.0, 1.0, 1.0], "bias": 0.0}"#).unwrap();

        assert!(LinearPolicy::load(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
