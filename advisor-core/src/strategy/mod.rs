//! Pluggable signal source driving a backtest.
//!
//! A strategy sees the market only through a [`MarketView`] truncated at the
//! current date and the open positions, both by shared reference. It returns
//! order intents; the engine decides what actually fills.

pub mod atr_breakout;
pub mod buy_and_hold;
pub mod factory;
pub mod ma_crossover;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{MarketView, OrderIntent, Position};

pub use atr_breakout::AtrBreakout;
pub use buy_and_hold::BuyAndHold;
pub use factory::{build_strategy, StrategySpec};
pub use ma_crossover::MaCrossover;

/// Generates order intents once per simulated trading date.
///
/// Implementations must be deterministic in their inputs for reproducible
/// backtests.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    fn generate_orders(
        &self,
        date: NaiveDate,
        market: &MarketView<'_>,
        positions: &BTreeMap<String, Position>,
    ) -> Vec<OrderIntent>;
}

/// Plain functions and closures are strategies.
impl<F> Strategy for F
where
    F: Fn(NaiveDate, &MarketView<'_>, &BTreeMap<String, Position>) -> Vec<OrderIntent>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn generate_orders(
        &self,
        date: NaiveDate,
        market: &MarketView<'_>,
        positions: &BTreeMap<String, Position>,
    ) -> Vec<OrderIntent> {
        self(date, market, positions)
    }
}

/// Pin a closure to the strategy signature.
///
/// Passing the closure through this bound lets its reference parameters be
/// inferred as higher-ranked, which a bare `let` binding does not.
pub fn strategy_fn<F>(f: F) -> F
where
    F: Fn(NaiveDate, &MarketView<'_>, &BTreeMap<String, Position>) -> Vec<OrderIntent>
        + Send
        + Sync,
{
    f
}

/// Errors that can occur during strategy construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("{strategy}: {reason}")]
    InvalidParameter {
        strategy: &'static str,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarketData;

    fn noop(_: NaiveDate, _: &MarketView<'_>, _: &BTreeMap<String, Position>) -> Vec<OrderIntent> {
        Vec::new()
    }

    #[test]
    fn functions_are_strategies() {
        let data = MarketData::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let strategy: &dyn Strategy = &noop;
        assert_eq!(strategy.name(), "custom");
        assert!(strategy
            .generate_orders(date, &data.view_at(date), &BTreeMap::new())
            .is_empty());
    }

    #[test]
    fn closures_are_strategies() {
        let data = MarketData::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let buy_spy = strategy_fn(|d, _, _| vec![OrderIntent::buy("SPY", 1, 100.0, d)]);
        let strategy: &dyn Strategy = &buy_spy;
        let orders = strategy.generate_orders(date, &data.view_at(date), &BTreeMap::new());
        assert_eq!(orders.len(), 1);
    }
}
