//! Position and account types.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// A position in a single security.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Symbol
    pub symbol: String,
    /// Number of shares (positive for long, negative for short)
    pub quantity: Decimal,
    /// Average entry price
    pub avg_entry_price: Decimal,
    /// Current market price
    pub current_price: Decimal,
    /// Market value (quantity * current_price)
    pub market_value: Decimal,
    /// Unrealized profit/loss
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// Create a new position.
    pub fn new(symbol: impl Into<String>, quantity: Decimal, avg_entry_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_entry_price,
            current_price: avg_entry_price,
            market_value: quantity * avg_entry_price,
            unrealized_pnl: Decimal::ZERO,
        }
    }

    /// Check if the position is flat (no shares).
    pub fn is_flat(&self) -> bool {
        self.quantity == Decimal::ZERO
    }

    /// Signed quantity as a float, for the decision path.
    pub fn quantity_f64(&self) -> f64 {
        self.quantity.to_f64().unwrap_or(0.0)
    }

    /// Update the current market price and recalculate values.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.market_value = self.quantity * price;
        self.unrealized_pnl = self.market_value - self.quantity * self.avg_entry_price;
    }

    /// Apply a fill to a long-only position. Returns the realized P&L.
    pub fn apply_fill(&mut self, side: Side, quantity: Decimal, price: Decimal) -> Decimal {
        let realized = match side {
            Side::Buy => {
                let total_cost = self.quantity * self.avg_entry_price + quantity * price;
                self.quantity += quantity;
                if self.quantity != Decimal::ZERO {
                    self.avg_entry_price = total_cost / self.quantity;
                }
                Decimal::ZERO
            }
            Side::Sell => {
                let close_qty = quantity.min(self.quantity);
                self.quantity -= close_qty;
                close_qty * (price - self.avg_entry_price)
            }
        };

        self.update_price(price);
        realized
    }
}

/// Brokerage account summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier
    pub id: String,
    /// Account status as reported by the brokerage
    pub status: String,
    /// Currency of cash balances
    pub currency: String,
    /// Available cash
    pub cash: Decimal,
    /// Buying power (may exceed cash on margin accounts)
    pub buying_power: Decimal,
    /// Cash plus market value of positions
    pub equity: Decimal,
}

impl Account {
    /// Create a cash-only account.
    pub fn with_cash(cash: Decimal) -> Self {
        Self {
            id: "paper".to_string(),
            status: "ACTIVE".to_string(),
            currency: "USD".to_string(),
            cash,
            buying_power: cash,
            equity: cash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_buy_and_sell() {
        let mut position = Position::new("AAPL", Decimal::ZERO, Decimal::ZERO);

        position.apply_fill(Side::Buy, dec!(10), dec!(100));
        position.apply_fill(Side::Buy, dec!(10), dec!(110));
        assert_eq!(position.quantity, dec!(20));
        assert_eq!(position.avg_entry_price, dec!(105));

        let realized = position.apply_fill(Side::Sell, dec!(5), dec!(115));
        assert_eq!(realized, dec!(50));
        assert_eq!(position.quantity, dec!(15));
        assert_eq!(position.quantity_f64(), 15.0);
    }

    #[test]
    fn test_position_sell_never_goes_short() {
        let mut position = Position::new("AAPL", dec!(3), dec!(100));
        position.apply_fill(Side::Sell, dec!(10), dec!(90));
        assert!(position.is_flat());
    }

    #[test]
    fn test_update_price() {
        let mut position = Position::new("AAPL", dec!(10), dec!(100));
        position.update_price(dec!(110));
        assert_eq!(position.market_value, dec!(1100));
        assert_eq!(position.unrealized_pnl, dec!(100));
    }
}
