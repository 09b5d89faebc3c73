//! Converts raw fills into round-trip `ClosedTrade` records.
//!
//! Post-processes fills after the day loop completes. Pure function: fills in,
//! closed trades out. A trade opens on the first buy into a flat symbol and
//! closes on the sell that takes it back to zero; scale-ins and partial exits
//! in between are folded into quantity-weighted averages.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{ClosedTrade, FilledOrder, OrderSide};

/// Running totals for a trade that has not yet gone flat.
struct OpenTrade {
    entry_date: NaiveDate,
    held: u64,
    bought: u64,
    entry_notional: f64,
    sold: u64,
    exit_notional: f64,
    commission: f64,
}

/// Extract round-trip trades from fills in chronological order.
///
/// Trades still open at the end are not reported. Sells into a flat symbol
/// are ignored (the engine never produces them).
pub fn extract_trades(fills: &[FilledOrder]) -> Vec<ClosedTrade> {
    let mut trades = Vec::new();
    let mut open: HashMap<&str, OpenTrade> = HashMap::new();

    for fill in fills {
        let qty = fill.quantity;
        match fill.side {
            OrderSide::Buy => {
                let t = open.entry(fill.symbol.as_str()).or_insert_with(|| OpenTrade {
                    entry_date: fill.filled_at,
                    held: 0,
                    bought: 0,
                    entry_notional: 0.0,
                    sold: 0,
                    exit_notional: 0.0,
                    commission: 0.0,
                });
                t.held += qty;
                t.bought += qty;
                t.entry_notional += fill.gross_value();
                t.commission += fill.commission;
            }
            OrderSide::Sell => {
                let Some(t) = open.get_mut(fill.symbol.as_str()) else {
                    continue;
                };
                let sold = qty.min(t.held);
                t.held -= sold;
                t.sold += sold;
                t.exit_notional += sold as f64 * fill.fill_price;
                t.commission += fill.commission;

                if t.held == 0 {
                    if let Some(t) = open.remove(fill.symbol.as_str()) {
                        trades.push(close_trade(&fill.symbol, t, fill.filled_at));
                    }
                }
            }
        }
    }

    trades
}

fn close_trade(symbol: &str, t: OpenTrade, exit_date: NaiveDate) -> ClosedTrade {
    let avg_entry_price = t.entry_notional / t.bought as f64;
    let avg_exit_price = t.exit_notional / t.sold as f64;
    let gross_pnl = t.exit_notional - t.entry_notional;
    ClosedTrade {
        symbol: symbol.to_string(),
        entry_date: t.entry_date,
        exit_date,
        quantity: t.bought,
        avg_entry_price,
        avg_exit_price,
        gross_pnl,
        commission: t.commission,
        net_pnl: gross_pnl - t.commission,
        holding_days: (exit_date - t.entry_date).num_days(),
    }
}
