//! Moving average crossover: golden cross entry, death cross exit.
//!
//! Enters long when the short SMA crosses above the long SMA and exits the
//! whole position when it crosses back below. Long-only.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Strategy, StrategyError};
use crate::domain::{MarketView, OrderIntent, Position};
use crate::indicators::sma;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaCrossover {
    pub short_period: usize,
    pub long_period: usize,
    /// Shares bought on each golden cross.
    pub shares: u64,
}

impl MaCrossover {
    pub fn new(
        short_period: usize,
        long_period: usize,
        shares: u64,
    ) -> Result<Self, StrategyError> {
        if short_period == 0 {
            return Err(invalid("short_period must be >= 1"));
        }
        if long_period <= short_period {
            return Err(invalid("long_period must be > short_period"));
        }
        if shares == 0 {
            return Err(invalid("shares must be >= 1"));
        }
        Ok(Self {
            short_period,
            long_period,
            shares,
        })
    }

    /// `(previous short - previous long, current short - current long)`.
    fn spreads(&self, closes: &[f64]) -> Option<(f64, f64)> {
        if closes.len() < self.long_period + 1 {
            return None;
        }
        let prev = &closes[..closes.len() - 1];
        let now = sma(closes, self.short_period)? - sma(closes, self.long_period)?;
        let before = sma(prev, self.short_period)? - sma(prev, self.long_period)?;
        Some((before, now))
    }
}

fn invalid(reason: &str) -> StrategyError {
    StrategyError::InvalidParameter {
        strategy: "ma_crossover",
        reason: reason.to_string(),
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn generate_orders(
        &self,
        date: NaiveDate,
        market: &MarketView<'_>,
        positions: &BTreeMap<String, Position>,
    ) -> Vec<OrderIntent> {
        let mut orders = Vec::new();
        for symbol in market.symbols() {
            let Some(bar) = market.bar_on(symbol) else {
                continue;
            };
            let Some((before, now)) = self.spreads(&market.closes(symbol)) else {
                continue;
            };
            let held = positions.contains_key(symbol);
            if !held && before <= 0.0 && now > 0.0 {
                orders.push(OrderIntent::buy(symbol, self.shares, bar.close, date));
            } else if held && before >= 0.0 && now < 0.0 {
                orders.push(OrderIntent::close_position(symbol, bar.close, date));
            }
        }
        orders
    }
}
