//! Consecutive-failure breaker.

use tracing::warn;

/// Trips after a run of consecutive failures.
///
/// A limit of zero never trips.
#[derive(Debug, Clone)]
pub struct FailureBreaker {
    limit: u32,
    consecutive: u32,
    total: u64,
}

impl FailureBreaker {
    /// Create a new breaker.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            consecutive: 0,
            total: 0,
        }
    }

    /// Record a success, resetting the consecutive count.
    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Record a failure. Returns `true` if the breaker is now tripped.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.total += 1;

        let tripped = self.is_tripped();
        if tripped {
            warn!(consecutive = self.consecutive, limit = self.limit, "Failure breaker tripped");
        }
        tripped
    }

    /// Check whether the limit has been reached.
    pub fn is_tripped(&self) -> bool {
        self.limit > 0 && self.consecutive >= self.limit
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trips_at_limit() {
        let mut breaker = FailureBreaker::new(3);
        assert!(!breaker.record_failure());
        assert!(!breaker.record_failure());
        assert!(breaker.record_failure());
        assert_eq!(breaker.consecutive(), 3);
    }

    #[test]
    fn test_success_resets() {
        let mut breaker = FailureBreaker::new(2);
        breaker.record_failure();
        breaker.record_success();
        assert!(!breaker.record_failure());
        assert_eq!(breaker.total(), 2);
    }

    #[test]
    fn test_zero_limit_never_trips() {
        let mut breaker = FailureBreaker::new(0);
        for _ in 0..100 {
            assert!(!breaker.record_failure());
        }
    }
}
