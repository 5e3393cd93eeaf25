//! Error types for the trading system.

use thiserror::Error;

/// Top-level trading system error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Trading halted after {consecutive_faults} consecutive faulted cycles")]
    Halted { consecutive_faults: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TradingError {
    /// Whether the error stems from configuration or missing credentials.
    pub fn is_configuration(&self) -> bool {
        match self {
            TradingError::Config(_) | TradingError::Validation(_) => true,
            TradingError::Broker(BrokerError::Configuration(_)) => true,
            TradingError::Data(DataError::Configuration(_)) => true,
            TradingError::Strategy(StrategyError::InvalidConfig(_)) => true,
            _ => false,
        }
    }
}

/// Strategy and decision errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Signal source not found: {0}")]
    NotFound(String),

    #[error("Policy artifact error: {0}")]
    Policy(String),

    #[error("Observation has {actual} features, policy expects {expected}")]
    ObservationShape { expected: usize, actual: usize },

    #[error("Non-finite value: {0}")]
    NonFinite(String),

    #[error("Strategy error: {0}")]
    Internal(String),
}

/// Broker-specific errors.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("Insufficient position in {symbol}: requested {requested}, held {held}")]
    InsufficientPosition {
        symbol: String,
        requested: rust_decimal::Decimal,
        held: rust_decimal::Decimal,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error: {0}")]
    ApiError(String),
}

/// Market data errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Rate limited by data provider")]
    RateLimited,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Data source error: {0}")]
    Internal(String),
}

/// Result type alias for trading operations.
pub type TradingResult<T> = Result<T, TradingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        let err = TradingError::from(BrokerError::Configuration("ALPACA_API_KEY not set".into()));
        assert!(err.is_configuration());

        let err = TradingError::from(DataError::ConnectionError("timeout".into()));
        assert!(!err.is_configuration());

        let err = TradingError::Halted { consecutive_faults: 3 };
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("3 consecutive"));
    }
}
