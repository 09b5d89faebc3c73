//! Result of a complete backtest run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::config::EngineConfig;
use crate::analytics::PortfolioMetrics;
use crate::domain::{ClosedTrade, EquityPoint, FilledOrder, OrderSide, Position, RejectedIntent};

/// Everything a run produced, frozen at the end of the day loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy: String,
    pub config: EngineConfig,
    /// Requested range.
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// One point per trading date, strictly increasing.
    pub equity_curve: Vec<EquityPoint>,
    /// Every fill in chronological order.
    pub fills: Vec<FilledOrder>,
    /// Intents the engine skipped, with the reason.
    pub rejected_intents: Vec<RejectedIntent>,
    pub closed_trades: Vec<ClosedTrade>,
    /// Positions still open after the last date, marked to market.
    pub open_positions: Vec<Position>,
    pub final_cash: f64,
    /// Daily returns of `[initial_capital, equity...]`.
    pub returns: Vec<f64>,
    pub benchmark_returns: Option<Vec<f64>>,
    pub metrics: PortfolioMetrics,
    /// Data problems noticed during the run (empty calendar, missing benchmark).
    pub warnings: Vec<String>,
}

impl BacktestResult {
    /// True when no trading date fell inside the requested range.
    pub fn is_empty(&self) -> bool {
        self.equity_curve.is_empty()
    }

    pub fn trading_days(&self) -> usize {
        self.equity_curve.len()
    }

    /// Last equity value, or the initial capital if nothing was simulated.
    pub fn final_value(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.config.initial_capital, |p| p.total_value)
    }

    pub fn total_return(&self) -> f64 {
        if self.config.initial_capital > 0.0 {
            self.final_value() / self.config.initial_capital - 1.0
        } else {
            0.0
        }
    }

    /// First and last simulated dates.
    pub fn simulated_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.equity_curve.first()?.date, self.equity_curve.last()?.date))
    }

    pub fn total_commission(&self) -> f64 {
        self.fills.iter().map(|f| f.commission).sum()
    }

    pub fn total_slippage(&self) -> f64 {
        self.fills.iter().map(|f| f.slippage_cost).sum()
    }

    pub fn count_side(&self, side: OrderSide) -> usize {
        self.fills.iter().filter(|f| f.side == side).count()
    }

    /// Equity values alone, in date order.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.total_value).collect()
    }
}
