//! Applies a fill to the portfolio.
//!
//! Handles position creation, averaging in, partial and full exits, realized
//! P&L, and cash accounting. Fillability has already been checked by the
//! caller; this module only does the bookkeeping.

use crate::domain::{FilledOrder, OrderSide, Portfolio, Position};

/// Apply one fill to the portfolio and return the realized P&L it produced
/// (`Some` for sells, `None` for buys).
///
/// After every call, total value changes by exactly `-commission` for a buy
/// and by `quantity * (fill - previous mark) - commission` for a sell.
pub fn apply_fill(fill: &FilledOrder, portfolio: &mut Portfolio) -> Option<f64> {
    portfolio.total_commission += fill.commission;
    portfolio.total_slippage += fill.slippage_cost;
    match fill.side {
        OrderSide::Buy => {
            apply_buy_fill(fill, portfolio);
            None
        }
        OrderSide::Sell => Some(apply_sell_fill(fill, portfolio)),
    }
}

/// Deduct gross + commission from cash, then open or add to the position.
fn apply_buy_fill(fill: &FilledOrder, portfolio: &mut Portfolio) {
    portfolio.cash -= fill.total_cost();

    match portfolio.positions.get_mut(&fill.symbol) {
        Some(pos) => {
            // Averaging in. The added shares are valued at their fill price
            // until the next repricing, so the position's value grows by
            // exactly the gross amount paid.
            let old_qty = pos.quantity as f64;
            let add_qty = fill.quantity as f64;
            let new_qty = old_qty + add_qty;
            pos.avg_entry_price =
                (pos.avg_entry_price * old_qty + fill.fill_price * add_qty) / new_qty;
            let mark = (pos.current_price * old_qty + fill.fill_price * add_qty) / new_qty;
            pos.quantity += fill.quantity;
            pos.mark(mark);
        }
        None => {
            portfolio.positions.insert(
                fill.symbol.clone(),
                Position::open(
                    fill.symbol.clone(),
                    fill.quantity,
                    fill.fill_price,
                    fill.filled_at,
                ),
            );
        }
    }
}

/// Add net proceeds to cash, reduce the position, drop it at zero.
fn apply_sell_fill(fill: &FilledOrder, portfolio: &mut Portfolio) -> f64 {
    portfolio.cash += fill.net_proceeds();

    let Some(pos) = portfolio.positions.get_mut(&fill.symbol) else {
        return 0.0;
    };
    let sold = fill.quantity.min(pos.quantity);
    let realized = (fill.fill_price - pos.avg_entry_price) * sold as f64;
    pos.realized_pnl += realized;
    pos.quantity -= sold;

    if pos.is_flat() {
        portfolio.positions.remove(&fill.symbol);
    } else {
        let price = pos.current_price;
        pos.mark(price);
    }
    realized
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fill(side: OrderSide, price: f64, qty: u64, commission: f64) -> FilledOrder {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        FilledOrder {
            symbol: "SPY".into(),
            side,
            quantity: qty,
            reference_price: price,
            fill_price: price,
            commission,
            slippage_cost: 0.0,
            timestamp: d,
            filled_at: d,
            realized_pnl: None,
        }
    }

    #[test]
    fn buy_creates_position() {
        let mut portfolio = Portfolio::new(100_000.0);
        assert_eq!(apply_fill(&fill(OrderSide::Buy, 100.0, 50, 0.0), &mut portfolio), None);

        assert_eq!(portfolio.cash, 95_000.0); // 100k - 100*50
        let pos = portfolio.get_position("SPY").unwrap();
        assert_eq!(pos.quantity, 50);
        assert_eq!(pos.avg_entry_price, 100.0);
        assert_eq!(pos.current_price, 100.0);
    }

    #[test]
    fn sell_closes_position() {
        let mut portfolio = Portfolio::new(100_000.0);
        apply_fill(&fill(OrderSide::Buy, 100.0, 50, 0.0), &mut portfolio);
        let realized = apply_fill(&fill(OrderSide::Sell, 110.0, 50, 0.0), &mut portfolio);

        // Cash: 95000 + 110*50 = 100500
        assert!((portfolio.cash - 100_500.0).abs() < 1e-10);
        assert!(!portfolio.has_position("SPY"));
        // Realized PnL: (110 - 100) * 50 = 500
        assert!((realized.unwrap() - 500.0).abs() < 1e-10);
    }

    #[test]
    fn partial_sell_reduces_position() {
        let mut portfolio = Portfolio::new(100_000.0);
        apply_fill(&fill(OrderSide::Buy, 100.0, 100, 0.0), &mut portfolio);
        apply_fill(&fill(OrderSide::Sell, 110.0, 30, 0.0), &mut portfolio);

        let pos = portfolio.get_position("SPY").unwrap();
        assert_eq!(pos.quantity, 70);
        assert!((pos.realized_pnl - 300.0).abs() < 1e-10);
    }

    #[test]
    fn buy_averages_into_existing_position() {
        let mut portfolio = Portfolio::new(100_000.0);
        apply_fill(&fill(OrderSide::Buy, 100.0, 50, 0.0), &mut portfolio);
        apply_fill(&fill(OrderSide::Buy, 110.0, 50, 0.0), &mut portfolio);

        let pos = portfolio.get_position("SPY").unwrap();
        assert_eq!(pos.quantity, 100);
        // Avg price: (100*50 + 110*50) / 100 = 105
        assert!((pos.avg_entry_price - 105.0).abs() < 1e-10);
    }

    #[test]
    fn averaging_in_preserves_existing_value() {
        let mut portfolio = Portfolio::new(100_000.0);
        apply_fill(&fill(OrderSide::Buy, 100.0, 50, 0.0), &mut portfolio);
        portfolio.positions.get_mut("SPY").unwrap().mark(120.0);
        let before = portfolio.total_value();

        apply_fill(&fill(OrderSide::Buy, 110.0, 50, 7.0), &mut portfolio);
        assert!((portfolio.total_value() - (before - 7.0)).abs() < 1e-9);
    }

    #[test]
    fn costs_tracked_and_charged() {
        let mut portfolio = Portfolio::new(100_000.0);
        let mut f = fill(OrderSide::Buy, 100.0, 50, 5.0);
        f.slippage_cost = 2.0;
        apply_fill(&f, &mut portfolio);

        assert_eq!(portfolio.total_commission, 5.0);
        assert_eq!(portfolio.total_slippage, 2.0);
        // Cash deducted: 100*50 + 5
        assert!((portfolio.cash - (100_000.0 - 5_005.0)).abs() < 1e-10);
    }

    #[test]
    fn value_identity_after_round_trip() {
        let mut portfolio = Portfolio::new(100_000.0);
        apply_fill(&fill(OrderSide::Buy, 100.0, 100, 0.0), &mut portfolio);
        portfolio.positions.get_mut("SPY").unwrap().mark(105.0);
        // 90000 + 100*105 = 100500
        assert!((portfolio.total_value() - 100_500.0).abs() < 1e-10);

        apply_fill(&fill(OrderSide::Sell, 105.0, 100, 0.0), &mut portfolio);
        assert!((portfolio.total_value() - 100_500.0).abs() < 1e-10);
        assert!(portfolio.positions.is_empty());
    }
}
