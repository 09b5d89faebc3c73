//! Channel breakout entries with stops sized by the risk manager.
//!
//! Entry: close above the highest high of the prior `lookback` bars. The
//! intent carries an ATR stop and asks the engine to size it from the stop
//! distance. Exit: close below that stop (measured from the average entry
//! price with the current ATR) or below the prior `lookback` low.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Strategy, StrategyError};
use crate::domain::{MarketView, OrderIntent, Position};
use crate::indicators::{atr, prior_highest_high, prior_lowest_low};
use crate::risk::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtrBreakout {
    pub lookback: usize,
    pub atr_period: usize,
    pub risk_level: RiskLevel,
}

impl AtrBreakout {
    pub fn new(
        lookback: usize,
        atr_period: usize,
        risk_level: RiskLevel,
    ) -> Result<Self, StrategyError> {
        if lookback == 0 || atr_period == 0 {
            return Err(StrategyError::InvalidParameter {
                strategy: "atr_breakout",
                reason: "lookback and atr_period must be >= 1".to_string(),
            });
        }
        Ok(Self {
            lookback,
            atr_period,
            risk_level,
        })
    }
}

impl Strategy for AtrBreakout {
    fn name(&self) -> &str {
        "atr_breakout"
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
            let history = market.history(symbol);
            let Some(atr) = atr(history, self.atr_period) else {
                continue;
            };

            match positions.get(symbol) {
                Some(pos) => {
                    let stop = self.risk_level.stop_loss(pos.avg_entry_price, atr);
                    let channel_low = prior_lowest_low(history, self.lookback);
                    if bar.close < stop || channel_low.is_some_and(|low| bar.close < low) {
                        orders.push(OrderIntent::close_position(symbol, bar.close, date));
                    }
                }
                None => {
                    let Some(high) = prior_highest_high(history, self.lookback) else {
                        continue;
                    };
                    if bar.close > high && atr > 0.0 {
                        let stop = self.risk_level.stop_loss(bar.close, atr);
                        orders.push(OrderIntent::risk_sized_buy(symbol, bar.close, stop, date));
                    }
                }
            }
        }
        orders
    }
}
