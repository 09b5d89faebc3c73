use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::order::OrderSide;

/// An executed order. Immutable once appended to the trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u64,
    /// Price the strategy asked for.
    pub reference_price: f64,
    /// Reference price after slippage.
    pub fill_price: f64,
    pub commission: f64,
    /// `|fill_price - reference_price| * quantity`.
    pub slippage_cost: f64,
    /// Timestamp carried on the originating intent.
    pub timestamp: NaiveDate,
    /// Simulated date the fill happened on.
    pub filled_at: NaiveDate,
    /// Realized P&L for sells, `(fill - avg_entry) * quantity`. `None` for buys.
    pub realized_pnl: Option<f64>,
}

impl FilledOrder {
    /// `quantity * fill_price`.
    pub fn gross_value(&self) -> f64 {
        self.quantity as f64 * self.fill_price
    }

    /// Cash consumed by a buy: gross value plus commission.
    pub fn total_cost(&self) -> f64 {
        self.gross_value() + self.commission
    }

    /// Cash received from a sell: gross value minus commission.
    pub fn net_proceeds(&self) -> f64 {
        self.gross_value() - self.commission
    }

    /// Signed cash change produced by this fill.
    pub fn cash_delta(&self) -> f64 {
        match self.side {
            OrderSide::Buy => -self.total_cost(),
            OrderSide::Sell => self.net_proceeds(),
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }
}
