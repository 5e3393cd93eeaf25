//! Core types and traits for the trading system.
//!
//! This crate provides the shared data contract between the trading loop
//! and its collaborators:
//! - Market snapshots, positions and account information
//! - Decisions, order intents and brokerage order types
//! - Collaborator traits for market data, position tracking, order routing,
//!   signal sources and policy scoring

pub mod types;
pub mod traits;
pub mod error;

pub use error::{TradingError, TradingResult};
pub use types::*;
pub use traits::*;
