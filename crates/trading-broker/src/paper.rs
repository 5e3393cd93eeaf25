//! Paper broker for dry runs and simulation.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use trading_core::error::{BrokerError, DataError};
use trading_core::traits::{MarketDataProvider, OrderRouter, PositionTracker};
use trading_core::types::{
    Account, Fill, MarketSnapshot, Order, OrderClass, OrderRequest, OrderType, Position, Side,
};

#[derive(Debug, Default)]
struct PaperState {
    cash: Decimal,
    positions: HashMap<String, Position>,
    marks: HashMap<String, Decimal>,
    orders: Vec<Order>,
    untradeable: HashSet<String>,
}

impl PaperState {
    fn equity(&self) -> Decimal {
        self.cash + self.positions.values().map(|p| p.market_value).sum::<Decimal>()
    }
}

/// In-memory broker that fills market orders at the last mark.
///
/// Clones share state, so a clone can be handed to a [`MarkingProvider`].
#[derive(Debug, Clone)]
pub struct PaperBroker {
    state: Arc<Mutex<PaperState>>,
}

impl PaperBroker {
    /// Create a new paper broker with starting cash.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            state: Arc::new(Mutex::new(PaperState {
                cash: initial_cash,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PaperState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a holding.
    pub fn with_position(self, symbol: &str, quantity: Decimal, price: Decimal) -> Self {
        {
            let mut state = self.lock();
            state
                .positions
                .insert(symbol.to_string(), Position::new(symbol, quantity, price));
            state.marks.insert(symbol.to_string(), price);
        }
        self
    }

    /// Mark a symbol as not tradeable.
    pub fn with_untradeable(self, symbol: &str) -> Self {
        self.lock().untradeable.insert(symbol.to_string());
        self
    }

    /// Record the latest observed price for a symbol.
    pub fn set_mark(&self, symbol: &str, price: Decimal) {
        let mut state = self.lock();
        state.marks.insert(symbol.to_string(), price);
        if let Some(position) = state.positions.get_mut(symbol) {
            position.update_price(price);
        }
    }

    pub fn mark(&self, symbol: &str) -> Option<Decimal> {
        self.lock().marks.get(symbol).copied()
    }

    pub fn cash(&self) -> Decimal {
        self.lock().cash
    }

    /// Orders filled so far, oldest first.
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }
}

#[async_trait]
impl PositionTracker for PaperBroker {
    async fn get_account(&self) -> Result<Account, BrokerError> {
        let state = self.lock();
        let mut account = Account::with_cash(state.cash);
        account.equity = state.equity();
        Ok(account)
    }

    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError> {
        Ok(self.lock().positions.get(symbol).cloned())
    }

    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError> {
        let state = self.lock();
        let mut positions: Vec<Position> = state.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    fn name(&self) -> &str {
        "Paper Broker"
    }
}

#[async_trait]
impl OrderRouter for PaperBroker {
    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError> {
        if request.order_type != OrderType::Market || request.order_class != OrderClass::Simple {
            return Err(BrokerError::OrderRejected(format!(
                "paper broker fills simple market orders only, got {} {}",
                request.order_class.as_str(),
                request.order_type.as_str()
            )));
        }
        if request.quantity <= Decimal::ZERO {
            return Err(BrokerError::OrderRejected(format!(
                "quantity must be positive, got {}",
                request.quantity
            )));
        }

        let mut state = self.lock();
        if state.untradeable.contains(&request.symbol) {
            return Err(BrokerError::OrderRejected(format!(
                "{} is not tradeable",
                request.symbol
            )));
        }

        let price = state.marks.get(&request.symbol).copied().ok_or_else(|| {
            BrokerError::OrderRejected(format!("no price observed for {}", request.symbol))
        })?;
        let value = price * request.quantity;

        match request.side {
            Side::Buy => {
                if value > state.cash {
                    return Err(BrokerError::InsufficientFunds {
                        required: value,
                        available: state.cash,
                    });
                }
                state.cash -= value;
            }
            Side::Sell => {
                let held = state
                    .positions
                    .get(&request.symbol)
                    .map(|p| p.quantity)
                    .unwrap_or(Decimal::ZERO);
                if request.quantity > held {
                    return Err(BrokerError::InsufficientPosition {
                        symbol: request.symbol.clone(),
                        requested: request.quantity,
                        held,
                    });
                }
                state.cash += value;
            }
        }

        let position = state
            .positions
            .entry(request.symbol.clone())
            .or_insert_with(|| Position::new(&request.symbol, Decimal::ZERO, Decimal::ZERO));
        let realized = position.apply_fill(request.side, request.quantity, price);
        if position.is_flat() {
            state.positions.remove(&request.symbol);
        }

        let mut order = Order::from_request(&request);
        order.add_fill(Fill {
            quantity: request.quantity,
            price,
            timestamp: Utc::now(),
        });
        state.orders.push(order.clone());

        info!(
            symbol = %order.symbol,
            side = %order.side,
            quantity = %order.quantity,
            price = %price,
            realized = %realized,
            "Paper order filled"
        );
        Ok(order)
    }

    async fn is_tradeable(&self, symbol: &str) -> Result<bool, BrokerError> {
        Ok(!self.lock().untradeable.contains(symbol))
    }

    fn name(&self) -> &str {
        "Paper Broker"
    }
}

/// Data provider wrapper that feeds observed prices into a [`PaperBroker`].
pub struct MarkingProvider {
    inner: Arc<dyn MarketDataProvider>,
    broker: PaperBroker,
}

impl MarkingProvider {
    pub fn new(inner: Arc<dyn MarketDataProvider>, broker: PaperBroker) -> Self {
        Self { inner, broker }
    }
}

#[async_trait]
impl MarketDataProvider for MarkingProvider {
    async fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, DataError> {
        let snapshot = self.inner.get_snapshot(symbol).await?;
        if let Some(price) = snapshot.usable_price() {
            match Decimal::try_from(price) {
                Ok(mark) => self.broker.set_mark(symbol, mark),
                Err(e) => debug!(symbol, price, error = %e, "Price not representable as decimal"),
            }
        }
        Ok(snapshot)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_core::types::OrderStatus;

    #[tokio::test]
    async fn test_market_buy_fills_at_mark() {
        let broker = PaperBroker::new(dec!(10000));
        broker.set_mark("AAPL", dec!(150));

        let order = broker
            .submit_order(OrderRequest::market("AAPL", Side::Buy, dec!(10)))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_avg_price, Some(dec!(150)));

        assert_eq!(broker.cash(), dec!(8500));
        let position = broker.get_position("AAPL").await.unwrap().unwrap();
        assert_eq!(position.quantity, dec!(10));
        assert_eq!(broker.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_sell_closes_position() {
        let broker = PaperBroker::new(dec!(0)).with_position("AAPL", dec!(5), dec!(100));
        broker.set_mark("AAPL", dec!(110));

        broker
            .submit_order(OrderRequest::market("AAPL", Side::Sell, dec!(5)))
            .await
            .unwrap();

        assert!(broker.get_position("AAPL").await.unwrap().is_none());
        assert_eq!(broker.cash(), dec!(550));
    }

    #[tokio::test]
    async fn test_rejections() {
        let broker = PaperBroker::new(dec!(100)).with_position("MSFT", dec!(2), dec!(10));

        let no_mark = broker
            .submit_order(OrderRequest::market("AAPL", Side::Buy, dec!(1)))
            .await;
        assert!(matches!(no_mark, Err(BrokerError::OrderRejected(_))));

        let oversell = broker
            .submit_order(OrderRequest::market("MSFT", Side::Sell, dec!(3)))
            .await;
        assert!(matches!(oversell, Err(BrokerError::InsufficientPosition { .. })));

        let too_big = broker
            .submit_order(OrderRequest::market("MSFT", Side::Buy, dec!(50)))
            .await;
        assert!(matches!(too_big, Err(BrokerError::InsufficientFunds { .. })));

        let limit = broker
            .submit_order(OrderRequest::limit("MSFT", Side::Buy, dec!(1), dec!(9)))
            .await;
        assert!(matches!(limit, Err(BrokerError::OrderRejected(_))));

        assert!(broker.orders().is_empty());
    }

    #[tokio::test]
    async fn test_account_equity_tracks_marks() {
        let broker = PaperBroker::new(dec!(1000)).with_position("AAPL", dec!(10), dec!(100));
        broker.set_mark("AAPL", dec!(120));

        let account = broker.get_account().await.unwrap();
        assert_eq!(account.cash, dec!(1000));
        assert_eq!(account.equity, dec!(2200));
    }

    struct StaticProvider;

    #[async_trait]
    impl MarketDataProvider for StaticProvider {
        async fn get_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, DataError> {
            Ok(MarketSnapshot::new(symbol, Some(42.5), Some(1000.0)))
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    #[tokio::test]
    async fn test_marking_provider_updates_marks() {
        let broker = PaperBroker::new(dec!(1000)).with_untradeable("OTC");
        let provider = MarkingProvider::new(Arc::new(StaticProvider), broker.clone());

        let snapshot = provider.get_snapshot("AAPL").await.unwrap();
        assert_eq!(snapshot.price, Some(42.5));
        assert_eq!(broker.mark("AAPL"), Some(dec!(42.5)));
        assert_eq!(provider.name(), "static");

        assert!(broker.is_tradeable("AAPL").await.unwrap());
        assert!(!broker.is_tradeable("OTC").await.unwrap());
    }
}
