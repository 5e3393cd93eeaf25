//! Market data provider trait.

use crate::error::DataError;
use crate::types::MarketSnapshot;
use async_trait::async_trait;

/// Source of per-symbol market snapshots.
///
/// Implementations translate a vendor response into [`MarketSnapshot`].
/// Fields the vendor does not report are left as `None`; a failed request
/// is returned as an error and the caller decides how to degrade.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the latest snapshot for a symbol.
    async fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, DataError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider;

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        async fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, DataError> {
            if symbol == "BAD" {
                return Err(DataError::SymbolNotFound(symbol.to_string()));
            }
            Ok(MarketSnapshot::new(symbol, Some(10.0), Some(500.0)))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_provider_object_safety() {
        let provider: Box<dyn MarketDataProvider> = Box::new(FixedProvider);
        let snapshot = provider.get_snapshot("AAPL").await.unwrap();
        assert_eq!(snapshot.price, Some(10.0));
        assert!(provider.get_snapshot("BAD").await.is_err());
    }
}
