//! Seedable random signal for exploratory runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use trading_core::{error::StrategyError, traits::SignalSource, types::MarketSnapshot};

/// Uniform random signal in `[-1, 1]`.
///
/// With a seed the sequence is reproducible across runs.
pub struct RandomSignal {
    rng: Mutex<StdRng>,
    seed: Option<u64>,
}

impl RandomSignal {
    /// Create a random source, seeded when `seed` is given.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            seed,
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl SignalSource for RandomSignal {
    fn name(&self) -> &str {
        "random"
    }

    fn signal(&self, _symbol: &str, _snapshot: &MarketSnapshot, _current_position: f64) -> Result<f64, StrategyError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| StrategyError::Internal("random source lock poisoned".into()))?;
        Ok(rng.gen_range(-1.0..=1.0))
    }

    fn description(&self) -> &str {
        "Uniform random signal, for exploratory runs"
    }
}
