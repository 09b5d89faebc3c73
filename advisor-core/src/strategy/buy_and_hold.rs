use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::domain::{MarketView, OrderIntent, Position};

/// Buys a fixed number of shares of every symbol at its close and never sells.
///
/// A symbol is bought on the first date it trades without an open position,
/// so an entry that could not be funded is retried the next day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuyAndHold {
    pub shares_per_symbol: u64,
}

impl BuyAndHold {
    pub fn new(shares_per_symbol: u64) -> Self {
        Self { shares_per_symbol }
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn generate_orders(
        &self,
        date: NaiveDate,
        market: &MarketView<'_>,
        positions: &BTreeMap<String, Position>,
    ) -> Vec<OrderIntent> {
        market
            .symbols()
            .filter(|s| !positions.contains_key(*s))
            .filter_map(|s| {
                market
                    .bar_on(s)
                    .map(|bar| OrderIntent::buy(s, self.shares_per_symbol, bar.close, date))
            })
            .collect()
    }
}
