//! Aggregate state of cash plus all open positions.

use std::collections::BTreeMap;

use super::position::Position;

/// Aggregate portfolio state.
///
/// Tracks cash, open positions, and accumulated costs. The accounting
/// identity holds after every fill and every repricing:
/// `total_value == cash + sum(quantity * current_price)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: BTreeMap<String, Position>,
    pub total_commission: f64,
    pub total_slippage: f64,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
            total_commission: 0.0,
            total_slippage: 0.0,
        }
    }

    /// Sum of open position market values at their current marks.
    pub fn positions_value(&self) -> f64 {
        self.positions.values().map(Position::market_value).sum()
    }

    /// Cash plus positions value.
    pub fn total_value(&self) -> f64 {
        self.cash + self.positions_value()
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.get(symbol).is_some_and(|p| !p.is_flat())
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol).filter(|p| !p.is_flat())
    }

    /// Shares currently held in `symbol` (0 when flat).
    pub fn held(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).map_or(0, |p| p.quantity)
    }
}
