//! Alpaca broker integration for paper and live trading.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Response, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::error::BrokerError;
use trading_core::traits::{OrderRouter, PositionTracker};
use trading_core::types::{
    Account, Fill, Order, OrderClass, OrderRequest, OrderStatus, OrderType, Position, Side,
    TimeInForce,
};
use tracing::{debug, info};

/// Alpaca API configuration.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: String,
    pub paper: bool,
    /// Overrides the paper/live trading endpoint when set
    pub base_url: Option<String>,
}

impl AlpacaConfig {
    /// Create config directly with key and secret.
    pub fn new(api_key: String, api_secret: String, paper: bool) -> Self {
        Self {
            api_key,
            api_secret,
            paper,
            base_url: None,
        }
    }

    /// Load credentials from the named environment variables.
    pub fn from_env(key_var: &str, secret_var: &str, paper: bool) -> Result<Self, BrokerError> {
        let api_key = std::env::var(key_var)
            .map_err(|_| BrokerError::Configuration(format!("{} not set", key_var)))?;
        let api_secret = std::env::var(secret_var)
            .map_err(|_| BrokerError::Configuration(format!("{} not set", secret_var)))?;

        Ok(Self::new(api_key, api_secret, paper))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.base_url {
            return url;
        }
        if self.paper {
            "https://paper-api.alpaca.markets"
        } else {
            "https://api.alpaca.markets"
        }
    }
}

/// Alpaca API response types
#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    id: String,
    status: String,
    currency: String,
    cash: String,
    buying_power: String,
    equity: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaPosition {
    symbol: String,
    qty: String,
    avg_entry_price: String,
    market_value: Option<String>,
    unrealized_pl: Option<String>,
    current_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrder {
    id: String,
    client_order_id: String,
    status: String,
    symbol: String,
    qty: Option<String>,
    filled_qty: String,
    #[serde(rename = "type")]
    order_type: String,
    #[serde(default)]
    order_class: String,
    side: String,
    time_in_force: String,
    limit_price: Option<String>,
    filled_avg_price: Option<String>,
    created_at: String,
    filled_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaAsset {
    tradable: bool,
}

#[derive(Debug, Serialize)]
struct TakeProfit {
    limit_price: String,
}

#[derive(Debug, Serialize)]
struct StopLoss {
    stop_price: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    symbol: String,
    qty: String,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    time_in_force: &'static str,
    client_order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    take_profit: Option<TakeProfit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_loss: Option<StopLoss>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trail_percent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trail_price: Option<String>,
}

impl From<&OrderRequest> for CreateOrderRequest {
    fn from(request: &OrderRequest) -> Self {
        let side = match request.side {
            Side::Buy => "buy",
            Side::Sell => "sell",
        };
        let order_class = match request.order_class {
            OrderClass::Simple => None,
            other => Some(other.as_str()),
        };

        Self {
            symbol: request.symbol.clone(),
            qty: request.quantity.normalize().to_string(),
            side,
            order_type: request.order_type.as_str(),
            time_in_force: request.time_in_force.as_str(),
            client_order_id: request.client_order_id.clone(),
            order_class,
            limit_price: request.limit_price.map(|p| p.to_string()),
            take_profit: request.take_profit.map(|p| TakeProfit {
                limit_price: p.to_string(),
            }),
            stop_loss: request.stop_loss.map(|p| StopLoss {
                stop_price: p.to_string(),
            }),
            trail_percent: request.trail_percent.map(|p| p.to_string()),
            trail_price: request.trail_price.map(|p| p.to_string()),
        }
    }
}

/// Turn a non-success response into a broker error.
async fn api_error(resp: Response) -> BrokerError {
    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        return BrokerError::RateLimited { retry_after_secs };
    }
    let text = resp.text().await.unwrap_or_default();
    BrokerError::ApiError(format!("{}: {}", status, text))
}

fn parse_decimal(value: &str) -> Decimal {
    value.parse().unwrap_or(dec!(0))
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Alpaca broker client.
pub struct AlpacaBroker {
    config: AlpacaConfig,
    client: Client,
}

impl AlpacaBroker {
    /// Create a new Alpaca broker client.
    pub fn new(config: AlpacaConfig) -> Result<Self, BrokerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(&config.api_secret)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn get(&self, path: &str) -> Result<Response, BrokerError> {
        let url = format!("{}{}", self.config.base_url(), path);
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))
    }

    /// Get recently closed orders, newest first.
    pub async fn get_closed_orders(&self, limit: usize) -> Result<Vec<Order>, BrokerError> {
        let url = format!("{}/v2/orders", self.config.base_url());
        let resp = self
            .client
            .get(&url)
            .query(&[("status", "closed".to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let orders: Vec<AlpacaOrder> = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        orders.into_iter().map(parse_order).collect()
    }
}

fn parse_order(order: AlpacaOrder) -> Result<Order, BrokerError> {
    let side = match order.side.as_str() {
        "buy" => Side::Buy,
        "sell" => Side::Sell,
        _ => return Err(BrokerError::ApiError(format!("Unknown side: {}", order.side))),
    };

    let order_type = match order.order_type.as_str() {
        "limit" => OrderType::Limit,
        "stop" => OrderType::Stop,
        "stop_limit" => OrderType::StopLimit,
        "trailing_stop" => OrderType::TrailingStop,
        _ => OrderType::Market,
    };

    let order_class = match order.order_class.as_str() {
        "bracket" => OrderClass::Bracket,
        "oco" => OrderClass::Oco,
        "oto" => OrderClass::Oto,
        _ => OrderClass::Simple,
    };

    let time_in_force = match order.time_in_force.as_str() {
        "gtc" => TimeInForce::GTC,
        "ioc" => TimeInForce::IOC,
        "fok" => TimeInForce::FOK,
        _ => TimeInForce::Day,
    };

    let status = OrderStatus::from_api(&order.status);
    let quantity = order.qty.as_deref().map(parse_decimal).unwrap_or(dec!(0));
    let filled_quantity = parse_decimal(&order.filled_qty);
    let filled_avg_price = order.filled_avg_price.as_ref().and_then(|p| p.parse().ok());
    let created_at = parse_time(&order.created_at).unwrap_or_else(Utc::now);
    let filled_at = order.filled_at.as_deref().and_then(parse_time);

    let mut fills = Vec::new();
    if matches!(status, OrderStatus::Filled | OrderStatus::PartiallyFilled) {
        if let Some(price) = filled_avg_price {
            fills.push(Fill {
                quantity: filled_quantity,
                price,
                timestamp: filled_at.unwrap_or(created_at),
            });
        }
    }

    Ok(Order {
        id: order.id,
        client_order_id: order.client_order_id,
        symbol: order.symbol,
        side,
        order_type,
        order_class,
        quantity,
        limit_price: order.limit_price.as_ref().and_then(|p| p.parse().ok()),
        time_in_force,
        status,
        filled_quantity,
        filled_avg_price,
        fills,
        created_at,
        filled_at,
    })
}

fn parse_position(p: AlpacaPosition) -> Position {
    let quantity = parse_decimal(&p.qty);
    let avg_entry_price = parse_decimal(&p.avg_entry_price);
    let current_price = p.current_price.as_deref().map(parse_decimal).unwrap_or(avg_entry_price);

    Position {
        symbol: p.symbol,
        quantity,
        avg_entry_price,
        current_price,
        market_value: p
            .market_value
            .as_deref()
            .map(parse_decimal)
            .unwrap_or(quantity * current_price),
        unrealized_pnl: p.unrealized_pl.as_deref().map(parse_decimal).unwrap_or(dec!(0)),
    }
}

#[async_trait]
impl PositionTracker for AlpacaBroker {
    async fn get_account(&self) -> Result<Account, BrokerError> {
        let resp = self.get("/v2/account").await?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let account: AlpacaAccount = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        Ok(Account {
            id: account.id,
            status: account.status,
            currency: account.currency,
            cash: parse_decimal(&account.cash),
            buying_power: parse_decimal(&account.buying_power),
            equity: parse_decimal(&account.equity),
        })
    }

    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError> {
        let resp = self.get(&format!("/v2/positions/{}", symbol)).await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let p: AlpacaPosition = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        Ok(Some(parse_position(p)))
    }

    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError> {
        let resp = self.get("/v2/positions").await?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let positions: Vec<AlpacaPosition> = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        Ok(positions.into_iter().map(parse_position).collect())
    }

    fn name(&self) -> &str {
        if self.config.paper {
            "Alpaca Paper"
        } else {
            "Alpaca Live"
        }
    }
}

#[async_trait]
impl OrderRouter for AlpacaBroker {
    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError> {
        let url = format!("{}/v2/orders", self.config.base_url());
        let create_req = CreateOrderRequest::from(&request);

        debug!(?create_req, "Submitting order");

        let resp = self
            .client
            .post(&url)
            .json(&create_req)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        match resp.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(api_error(resp).await),
            status if !status.is_success() => {
                let text = resp.text().await.unwrap_or_default();
                return Err(BrokerError::OrderRejected(format!("{}: {}", status, text)));
            }
            _ => {}
        }

        let order: AlpacaOrder = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        info!(
            order_id = %order.id,
            symbol = %order.symbol,
            side = %order.side,
            qty = ?order.qty,
            "Order submitted"
        );
        parse_order(order)
    }

    async fn is_tradeable(&self, symbol: &str) -> Result<bool, BrokerError> {
        let resp = self.get(&format!("/v2/assets/{}", symbol)).await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let asset: AlpacaAsset = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        Ok(asset.tradable)
    }

    fn name(&self) -> &str {
        PositionTracker::name(self)
    }
}
