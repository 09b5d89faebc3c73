//! Slippage and commission calculation.
//!
//! Slippage is directional against the intent's reference price: buyers pay
//! more, sellers receive less. Commission is a fraction of the slipped notional.

use crate::domain::OrderSide;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

impl CostModel {
    pub fn new(commission_rate: f64, slippage_rate: f64) -> Self {
        Self {
            commission_rate,
            slippage_rate,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Returns `(fill_price, slippage_dollar_amount)`.
    pub fn apply_slippage(
        &self,
        reference_price: f64,
        side: OrderSide,
        quantity: u64,
    ) -> (f64, f64) {
        let fill = match side {
            OrderSide::Buy => reference_price * (1.0 + self.slippage_rate),
            OrderSide::Sell => reference_price * (1.0 - self.slippage_rate),
        };
        (fill, (fill - reference_price).abs() * quantity as f64)
    }

    /// `quantity * fill_price * commission_rate`.
    pub fn commission(&self, quantity: u64, fill_price: f64) -> f64 {
        quantity as f64 * fill_price * self.commission_rate
    }

    /// Cash a buy must have available: `quantity * price * (1 + commission + slippage)`.
    pub fn required_cash(&self, quantity: u64, reference_price: f64) -> f64 {
        quantity as f64 * reference_price * (1.0 + self.commission_rate + self.slippage_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_slips_up_sell_slips_down() {
        let cost = CostModel::new(0.005, 0.001);
        let (buy, buy_slip) = cost.apply_slippage(100.0, OrderSide::Buy, 100);
        assert!((buy - 100.1).abs() < 1e-10);
        assert!((buy_slip - 10.0).abs() < 1e-8);

        let (sell, sell_slip) = cost.apply_slippage(105.0, OrderSide::Sell, 100);
        assert!((sell - 104.895).abs() < 1e-10);
        assert!((sell_slip - 10.5).abs() < 1e-8);
    }

    #[test]
    fn commission_on_fill_notional() {
        let cost = CostModel::new(0.005, 0.001);
        assert!((cost.commission(100, 100.1) - 50.05).abs() < 1e-10);
        assert!((cost.commission(100, 104.895) - 52.4475).abs() < 1e-10);
    }

    #[test]
    fn required_cash_includes_both_rates() {
        let cost = CostModel::new(0.005, 0.001);
        assert!((cost.required_cash(100, 100.0) - 10_060.0).abs() < 1e-9);
        assert_eq!(CostModel::frictionless().required_cash(10, 50.0), 500.0);
    }
}
