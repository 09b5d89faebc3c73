//! Per-run mutable simulation state.
//!
//! Created fresh inside every `BacktestEngine::run` call and consumed into
//! the result at the end, so no state survives between runs.

use chrono::NaiveDate;

use crate::domain::{
    EquityPoint, FilledOrder, MarketData, OrderIntent, Portfolio, RejectReason, RejectedIntent,
};

#[derive(Debug, Clone)]
pub struct SimulationState {
    pub portfolio: Portfolio,
    pub fills: Vec<FilledOrder>,
    pub rejected: Vec<RejectedIntent>,
    pub equity_curve: Vec<EquityPoint>,
}

impl SimulationState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            portfolio: Portfolio::new(initial_capital),
            fills: Vec::new(),
            rejected: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Re-mark every open position at `date`'s close. Symbols without a bar
    /// on `date` keep their previous mark.
    pub fn reprice(&mut self, data: &MarketData, date: NaiveDate) {
        for (symbol, pos) in self.portfolio.positions.iter_mut() {
            if let Some(bar) = data.get(symbol).and_then(|s| s.bar_on(date)) {
                pos.mark(bar.close);
            }
        }
    }

    pub fn reject(&mut self, date: NaiveDate, intent: OrderIntent, reason: RejectReason) {
        self.rejected.push(RejectedIntent {
            date,
            intent,
            reason,
        });
    }

    /// Append the end-of-day snapshot for `date`.
    pub fn record_equity(&mut self, date: NaiveDate) -> EquityPoint {
        let cash = self.portfolio.cash;
        let positions_value = self.portfolio.positions_value();
        let point = EquityPoint {
            date,
            total_value: cash + positions_value,
            cash,
            positions_value,
        };
        self.equity_curve.push(point);
        point
    }
}
