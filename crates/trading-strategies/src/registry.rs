//! Registry of signal sources.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use trading_core::{error::StrategyError, traits::SignalSource};

use crate::{FixedSignal, HeuristicConfig, LinearPolicy, PolicySignal, PositionHeuristic, RandomSignal};

/// Selectable signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignalSourceKind {
    #[default]
    Heuristic,
    Random,
    Policy,
    Fixed,
}

impl SignalSourceKind {
    pub const ALL: [SignalSourceKind; 4] = [
        SignalSourceKind::Heuristic,
        SignalSourceKind::Random,
        SignalSourceKind::Policy,
        SignalSourceKind::Fixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSourceKind::Heuristic => "heuristic",
            SignalSourceKind::Random => "random",
            SignalSourceKind::Policy => "policy",
            SignalSourceKind::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for SignalSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("unknown signal source '{}'", s))
    }
}

/// Signal source selection and per-source parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    /// Active source
    pub kind: SignalSourceKind,
    /// Seed for the random source; unseeded when absent
    pub seed: Option<u64>,
    /// Value returned by the fixed source
    pub fixed_signal: f64,
    /// Path to the policy artifact
    pub policy_path: Option<PathBuf>,
    /// Use the heuristic when the policy cannot be loaded
    pub fallback_to_heuristic: bool,
    /// Heuristic parameters
    pub heuristic: HeuristicConfig,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            kind: SignalSourceKind::Heuristic,
            seed: None,
            fixed_signal: 0.0,
            policy_path: None,
            fallback_to_heuristic: false,
            heuristic: HeuristicConfig::default(),
        }
    }
}

/// Information about a registered signal source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSourceInfo {
    /// Source kind
    pub kind: SignalSourceKind,
    /// Short description
    pub description: String,
}

/// Registry for available signal sources.
pub struct SignalSourceRegistry {
    sources: Vec<SignalSourceInfo>,
}

impl SignalSourceRegistry {
    /// Create a registry with all built-in sources.
    pub fn new() -> Self {
        let describe = |kind, description: &str| SignalSourceInfo {
            kind,
            description: description.to_string(),
        };

        Self {
            sources: vec![
                describe(
                    SignalSourceKind::Heuristic,
                    "Buys when exposure is low, sells as it approaches the notional limit",
                ),
                describe(
                    SignalSourceKind::Random,
                    "Uniform random signal in [-1, 1], seedable for reproducible runs",
                ),
                describe(
                    SignalSourceKind::Policy,
                    "Trained policy artifact scoring price, volume and position",
                ),
                describe(SignalSourceKind::Fixed, "Constant signal, for demos and dry runs"),
            ],
        }
    }

    /// List all available sources.
    pub fn list(&self) -> &[SignalSourceInfo] {
        &self.sources
    }

    /// Get source info by kind.
    pub fn get(&self, kind: SignalSourceKind) -> Option<&SignalSourceInfo> {
        self.sources.iter().find(|info| info.kind == kind)
    }

    /// Build the configured source.
    pub fn build(&self, settings: &SignalSettings) -> Result<Arc<dyn SignalSource>, StrategyError> {
        let source: Arc<dyn SignalSource> = match settings.kind {
            SignalSourceKind::Heuristic => Arc::new(PositionHeuristic::new(settings.heuristic.clone())?),
            SignalSourceKind::Random => Arc::new(RandomSignal::new(settings.seed)),
            SignalSourceKind::Fixed => Arc::new(FixedSignal::new(settings.fixed_signal)?),
            SignalSourceKind::Policy => match Self::load_policy(settings) {
                Ok(source) => source,
                Err(e) if settings.fallback_to_heuristic => {
                    warn!(error = %e, "Policy unavailable, falling back to heuristic");
                    Arc::new(PositionHeuristic::new(settings.heuristic.clone())?)
                }
                Err(e) => return Err(e),
            },
        };

        info!(source = source.name(), "Signal source ready");
        Ok(source)
    }

    fn load_policy(settings: &SignalSettings) -> Result<Arc<dyn SignalSource>, StrategyError> {
        let path = settings
            .policy_path
            .as_ref()
            .ok_or_else(|| StrategyError::InvalidConfig("policy source requires policy_path".into()))?;
        let policy = LinearPolicy::load(path)?;
        Ok(Arc::new(PolicySignal::new(Arc::new(policy))?))
    }
}

impl Default for SignalSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_list() {
        let registry = SignalSourceRegistry::new();
        assert_eq!(registry.list().len(), 4);
        assert!(registry.get(SignalSourceKind::Policy).is_some());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("random".parse::<SignalSourceKind>(), Ok(SignalSourceKind::Random));
        assert_eq!("Policy".parse::<SignalSourceKind>(), Ok(SignalSourceKind::Policy));
        assert!("ppo".parse::<SignalSourceKind>().is_err());
    }

    #[test]
    fn test_build_default_is_heuristic() {
        let registry = SignalSourceRegistry::new();
        let source = registry.build(&SignalSettings::default()).unwrap();
        assert_eq!(source.name(), "heuristic");
    }

    #[test]
    fn test_build_fixed() {
        let registry = SignalSourceRegistry::new();
        let settings = SignalSettings {
            kind: SignalSourceKind::Fixed,
            fixed_signal: 0.6,
            ..Default::default()
        };
        assert_eq!(registry.build(&settings).unwrap().name(), "fixed");
    }

    #[test]
    fn test_policy_without_artifact() {
        let registry = SignalSourceRegistry::new();
        let settings = SignalSettings {
            kind: SignalSourceKind::Policy,
            policy_path: Some(PathBuf::from("/nonexistent/policy.json")),
            ..Default::default()
        };
        assert!(registry.build(&settings).is_err());

        let settings = SignalSettings {
            fallback_to_heuristic: true,
            ..settings
        };
        assert_eq!(registry.build(&settings).unwrap().name(), "heuristic");
    }
}
