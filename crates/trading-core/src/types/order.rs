//! Order types and structures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Execute immediately at best available price
    Market,
    /// Execute at specified price or better
    Limit,
    /// Becomes a market order when the stop price is reached
    Stop,
    /// Becomes a limit order when the stop price is reached
    StopLimit,
    /// Stop price trails the market by a percent or price offset
    TrailingStop,
}

impl OrderType {
    /// Wire name used by the brokerage API.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::Stop => "stop",
            OrderType::StopLimit => "stop_limit",
            OrderType::TrailingStop => "trailing_stop",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Order class: a single order or a linked group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderClass {
    #[default]
    Simple,
    /// Entry with attached take-profit and stop-loss legs
    Bracket,
    /// One-cancels-other exit pair
    Oco,
    /// One-triggers-other
    Oto,
}

impl OrderClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderClass::Simple => "simple",
            OrderClass::Bracket => "bracket",
            OrderClass::Oco => "oco",
            OrderClass::Oto => "oto",
        }
    }
}

/// Time in force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Valid for the trading day only
    #[default]
    Day,
    /// Good til canceled
    #[serde(rename = "gtc")]
    GTC,
    /// Immediate or cancel
    #[serde(rename = "ioc")]
    IOC,
    /// Fill or kill
    #[serde(rename = "fok")]
    FOK,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Day => "day",
            TimeInForce::GTC => "gtc",
            TimeInForce::IOC => "ioc",
            TimeInForce::FOK => "fok",
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order created but not yet acknowledged
    Pending,
    /// Order accepted by broker/exchange
    Accepted,
    /// Order partially filled
    PartiallyFilled,
    /// Order completely filled
    Filled,
    /// Order canceled
    Canceled,
    /// Order rejected
    Rejected,
    /// Order expired
    Expired,
}

impl OrderStatus {
    /// Map a brokerage status string.
    pub fn from_api(status: &str) -> Self {
        match status {
            "new" | "accepted" | "pending_new" | "accepted_for_bidding" => OrderStatus::Accepted,
            "partially_filled" => OrderStatus::PartiallyFilled,
            "filled" => OrderStatus::Filled,
            "canceled" | "pending_cancel" | "done_for_day" => OrderStatus::Canceled,
            "rejected" => OrderStatus::Rejected,
            "expired" => OrderStatus::Expired,
            _ => OrderStatus::Pending,
        }
    }

    /// Check if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }

    /// Check if the order is active (can still be filled).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Order request for submitting new orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol to trade
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Type of order
    pub order_type: OrderType,
    /// Simple or linked order group
    pub order_class: OrderClass,
    /// Quantity to trade
    pub quantity: Decimal,
    /// Limit price (limit orders)
    pub limit_price: Option<Decimal>,
    /// Take-profit limit price (bracket orders)
    pub take_profit: Option<Decimal>,
    /// Stop-loss stop price (bracket orders)
    pub stop_loss: Option<Decimal>,
    /// Trailing offset in percent (trailing stop orders)
    pub trail_percent: Option<Decimal>,
    /// Trailing offset in price (trailing stop orders)
    pub trail_price: Option<Decimal>,
    /// Time in force
    pub time_in_force: TimeInForce,
    /// Client-provided order ID, unique per order
    pub client_order_id: String,
}

impl OrderRequest {
    fn base(symbol: impl Into<String>, side: Side, quantity: Decimal, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type,
            order_class: OrderClass::Simple,
            quantity,
            limit_price: None,
            take_profit: None,
            stop_loss: None,
            trail_percent: None,
            trail_price: None,
            time_in_force: TimeInForce::Day,
            client_order_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a market order request.
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self::base(symbol, side, quantity, OrderType::Market)
    }

    /// Create a limit order request.
    pub fn limit(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Self {
        let mut request = Self::base(symbol, side, quantity, OrderType::Limit);
        request.limit_price = Some(limit_price);
        request
    }

    /// Create a bracket order: a market entry with take-profit and stop-loss legs.
    pub fn bracket(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        take_profit: Decimal,
        stop_loss: Decimal,
    ) -> Self {
        let mut request = Self::base(symbol, side, quantity, OrderType::Market);
        request.order_class = OrderClass::Bracket;
        request.take_profit = Some(take_profit);
        request.stop_loss = Some(stop_loss);
        request
    }

    /// Create a trailing stop order with a percent offset.
    pub fn trailing_percent(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        trail_percent: Decimal,
    ) -> Self {
        let mut request = Self::base(symbol, side, quantity, OrderType::TrailingStop);
        request.trail_percent = Some(trail_percent);
        request.time_in_force = TimeInForce::GTC;
        request
    }

    /// Create a trailing stop order with a price offset.
    pub fn trailing_price(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        trail_price: Decimal,
    ) -> Self {
        let mut request = Self::base(symbol, side, quantity, OrderType::TrailingStop);
        request.trail_price = Some(trail_price);
        request.time_in_force = TimeInForce::GTC;
        request
    }

    /// Set the time in force.
    pub fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Set a client order ID.
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = id.into();
        self
    }
}

/// A partial or complete execution of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    /// Quantity filled
    pub quantity: Decimal,
    /// Price at which the fill occurred
    pub price: Decimal,
    /// Timestamp of the fill
    pub timestamp: DateTime<Utc>,
}

/// Order record returned by the brokerage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Broker order ID
    pub id: String,
    /// Client-provided order ID
    pub client_order_id: String,
    /// Symbol traded
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Type of order
    pub order_type: OrderType,
    /// Simple or linked order group
    pub order_class: OrderClass,
    /// Original quantity
    pub quantity: Decimal,
    /// Limit price
    pub limit_price: Option<Decimal>,
    /// Time in force
    pub time_in_force: TimeInForce,
    /// Current status
    pub status: OrderStatus,
    /// Quantity filled so far
    pub filled_quantity: Decimal,
    /// Average fill price
    pub filled_avg_price: Option<Decimal>,
    /// List of fills
    pub fills: Vec<Fill>,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the order was filled
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a new pending order from a request.
    pub fn from_request(request: &OrderRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_order_id: request.client_order_id.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            order_class: request.order_class,
            quantity: request.quantity,
            limit_price: request.limit_price,
            time_in_force: request.time_in_force,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            filled_avg_price: None,
            fills: Vec::new(),
            created_at: Utc::now(),
            filled_at: None,
        }
    }

    /// Add a fill to the order.
    pub fn add_fill(&mut self, fill: Fill) {
        let total_qty = self.filled_quantity + fill.quantity;
        let total_value = self.filled_avg_price.unwrap_or(Decimal::ZERO) * self.filled_quantity
            + fill.price * fill.quantity;

        if total_qty > Decimal::ZERO {
            self.filled_avg_price = Some(total_value / total_qty);
        }
        self.filled_quantity = total_qty;
        self.fills.push(fill);

        if self.filled_quantity >= self.quantity {
            self.status = OrderStatus::Filled;
            self.filled_at = Some(Utc::now());
        } else {
            self.status = OrderStatus::PartiallyFilled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_request_market() {
        let request = OrderRequest::market("AAPL", Side::Buy, dec!(100));
        assert_eq!(request.symbol, "AAPL");
        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.order_type, OrderType::Market);
        assert_eq!(request.order_class, OrderClass::Simple);
        assert_eq!(request.quantity, dec!(100));
    }

    #[test]
    fn test_client_order_ids_are_unique() {
        let a = OrderRequest::market("AAPL", Side::Buy, dec!(1));
        let b = OrderRequest::market("AAPL", Side::Buy, dec!(1));
        assert_ne!(a.client_order_id, b.client_order_id);
    }

    #[test]
    fn test_bracket_and_trailing_requests() {
        let bracket = OrderRequest::bracket("MSFT", Side::Buy, dec!(10), dec!(420), dec!(390));
        assert_eq!(bracket.order_class, OrderClass::Bracket);
        assert_eq!(bracket.take_profit, Some(dec!(420)));
        assert_eq!(bracket.stop_loss, Some(dec!(390)));

        let trailing = OrderRequest::trailing_percent("MSFT", Side::Sell, dec!(10), dec!(1.5));
        assert_eq!(trailing.order_type, OrderType::TrailingStop);
        assert_eq!(trailing.time_in_force, TimeInForce::GTC);
        assert_eq!(trailing.trail_percent, Some(dec!(1.5)));
        assert!(trailing.trail_price.is_none());
    }

    #[test]
    fn test_order_add_fill() {
        let request = OrderRequest::market("AAPL", Side::Buy, dec!(100));
        let mut order = Order::from_request(&request);

        order.add_fill(Fill {
            quantity: dec!(50),
            price: dec!(150.00),
            timestamp: Utc::now(),
        });
        assert_eq!(order.filled_quantity, dec!(50));
        assert_eq!(order.status, OrderStatus::PartiallyFilled);

        order.add_fill(Fill {
            quantity: dec!(50),
            price: dec!(152.00),
            timestamp: Utc::now(),
        });
        assert_eq!(order.filled_quantity, dec!(100));
        assert_eq!(order.filled_avg_price, Some(dec!(151)));
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(OrderStatus::from_api("new"), OrderStatus::Accepted);
        assert_eq!(OrderStatus::from_api("filled"), OrderStatus::Filled);
        assert!(OrderStatus::from_api("expired").is_terminal());
        assert!(OrderStatus::from_api("partially_filled").is_active());
    }
}
