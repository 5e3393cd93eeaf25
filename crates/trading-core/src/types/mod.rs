//! Core data types for the trading system.
//!
//! These structs are the fixed contract between the trading loop and the
//! vendor adapters. Adapters translate vendor payloads into them; nothing
//! vendor-specific crosses this boundary.

mod decision;
mod order;
mod position;
mod snapshot;

pub use decision::{Action, Decision, OrderIntent};
pub use order::{Fill, Order, OrderClass, OrderRequest, OrderStatus, OrderType, Side, TimeInForce};
pub use position::{Account, Position};
pub use snapshot::MarketSnapshot;

/// Version of the snapshot/position/order contract exposed by this crate.
pub const CONTRACT_VERSION: u32 = 1;
