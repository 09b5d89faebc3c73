//! Structured backtest report: summary, risk, trading, and analytics sections.
//!
//! The report is data only. Rendering and persistence belong to callers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::result::BacktestResult;
use crate::analytics::{AnalyticsReport, PortfolioAnalytics};
use crate::domain::OrderSide;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySection {
    pub strategy: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trading_days: usize,
    pub initial_capital: f64,
    pub final_value: f64,
    pub final_cash: f64,
    pub total_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetricsSection {
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub var_95: f64,
    pub cvar_95: f64,
    pub beta: f64,
    pub alpha: f64,
    pub calmar_ratio: f64,
    pub information_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingMetricsSection {
    pub total_fills: usize,
    pub buys: usize,
    pub sells: usize,
    pub rejected_intents: usize,
    pub total_commission: f64,
    pub total_slippage: f64,
    pub closed_trades: usize,
    pub winning_trades: usize,
    /// Fraction of closed trades with positive net P&L.
    pub trade_win_rate: f64,
    pub avg_holding_days: f64,
    pub open_positions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub summary: SummarySection,
    pub risk_metrics: RiskMetricsSection,
    pub trading_metrics: TradingMetricsSection,
    pub analytics: AnalyticsReport,
}

impl BacktestResult {
    pub fn report(&self) -> BacktestReport {
        let m = &self.metrics;
        let (start_date, end_date) = self.simulated_range().unwrap_or((self.start, self.end));

        let closed = self.closed_trades.len();
        let winners = self.closed_trades.iter().filter(|t| t.is_winner()).count();
        let avg_holding_days = if closed > 0 {
            self.closed_trades
                .iter()
                .map(|t| t.holding_days as f64)
                .sum::<f64>()
                / closed as f64
        } else {
            0.0
        };

        BacktestReport {
            summary: SummarySection {
                strategy: self.strategy.clone(),
                start_date,
                end_date,
                trading_days: self.trading_days(),
                initial_capital: self.config.initial_capital,
                final_value: self.final_value(),
                final_cash: self.final_cash,
                total_return: self.total_return(),
            },
            risk_metrics: RiskMetricsSection {
                volatility: m.volatility,
                sharpe_ratio: m.sharpe_ratio,
                sortino_ratio: m.sortino_ratio,
                max_drawdown: m.max_drawdown,
                var_95: m.var_95,
                cvar_95: m.cvar_95,
                beta: m.beta,
                alpha: m.alpha,
                calmar_ratio: m.calmar_ratio,
                information_ratio: m.information_ratio,
            },
            trading_metrics: TradingMetricsSection {
                total_fills: self.fills.len(),
                buys: self.count_side(OrderSide::Buy),
                sells: self.count_side(OrderSide::Sell),
                rejected_intents: self.rejected_intents.len(),
                total_commission: self.total_commission(),
                total_slippage: self.total_slippage(),
                closed_trades: closed,
                winning_trades: winners,
                trade_win_rate: if closed > 0 {
                    winners as f64 / closed as f64
                } else {
                    0.0
                },
                avg_holding_days,
                open_positions: self.open_positions.len(),
            },
            analytics: PortfolioAnalytics::new(self.config.risk_free_rate).generate_report(m),
        }
    }
}
