use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long holding in one symbol.
///
/// Only fill application and daily repricing mutate a position. A position
/// whose quantity reaches zero leaves the live set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
    pub avg_entry_price: f64,
    /// Last mark (close, or fill price on the day it was opened/increased).
    pub current_price: f64,
    /// Accumulated from partial sells while the position stays open.
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    /// Open a new position marked at its fill price.
    pub fn open(
        symbol: impl Into<String>,
        quantity: u64,
        fill_price: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_entry_price: fill_price,
            current_price: fill_price,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            entry_date: date,
        }
    }

    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.current_price
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.avg_entry_price
    }

    /// Re-mark at `price` and refresh unrealized P&L.
    pub fn mark(&mut self, price: f64) {
        self.current_price = price;
        self.unrealized_pnl = (price - self.avg_entry_price) * self.quantity as f64;
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }
}
