//! Core traits for the trading system.

mod broker;
mod data_source;
mod strategy;

pub use broker::{OrderRouter, PositionTracker};
pub use data_source::MarketDataProvider;
pub use strategy::{PolicyScorer, SignalSource};
