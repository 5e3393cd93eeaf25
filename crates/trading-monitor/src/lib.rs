//! Logging setup for the trading loop.

mod logging;

pub use logging::{setup_logging, LoggingGuard, LoggingOptions};
