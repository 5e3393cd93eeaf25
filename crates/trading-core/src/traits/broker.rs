//! Brokerage traits.
//!
//! The brokerage is split along the two roles the trading loop uses it for:
//! reading holdings and routing orders. One adapter usually implements both.

use crate::error::BrokerError;
use crate::types::{Account, Order, OrderRequest, Position};
use async_trait::async_trait;

/// Read access to account and holdings.
#[async_trait]
pub trait PositionTracker: Send + Sync {
    /// Get account information.
    async fn get_account(&self) -> Result<Account, BrokerError>;

    /// Get the position for a symbol.
    ///
    /// # Returns
    /// `None` when nothing is held.
    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError>;

    /// Get all open positions.
    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Get the tracker name.
    fn name(&self) -> &str;
}

/// Order submission and asset lookups.
#[async_trait]
pub trait OrderRouter: Send + Sync {
    /// Submit a new order.
    ///
    /// # Returns
    /// The order record as acknowledged by the brokerage.
    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError>;

    /// Check whether a symbol can be traded.
    async fn is_tradeable(&self, symbol: &str) -> Result<bool, BrokerError>;

    /// Get the router name.
    fn name(&self) -> &str;
}
