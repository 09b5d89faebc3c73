//! Rolling-window metrics.

use serde::{Deserialize, Serialize};

use super::metrics::{max_drawdown, sharpe_ratio, total_return, volatility, PortfolioAnalytics};
use super::stats::finite;

/// Statistics for one full window ending at `end_index` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingMetrics {
    pub end_index: usize,
    pub rolling_return: f64,
    pub rolling_volatility: f64,
    pub rolling_sharpe: f64,
    pub rolling_max_drawdown: f64,
}

impl PortfolioAnalytics {
    /// One entry per full window of `window` returns, using the same formulas
    /// as [`calculate_portfolio_metrics`](Self::calculate_portfolio_metrics).
    ///
    /// Non-finite returns are dropped before windowing. Empty when
    /// `window < 2` or the series is shorter than `window`.
    pub fn calculate_rolling_metrics(&self, returns: &[f64], window: usize) -> Vec<RollingMetrics> {
        let r = finite(returns);
        if window < 2 || window > r.len() {
            return Vec::new();
        }
        let rf = self.period_risk_free();
        r.windows(window)
            .enumerate()
            .map(|(start, slice)| RollingMetrics {
                end_index: start + window - 1,
                rolling_return: total_return(slice),
                rolling_volatility: volatility(slice, self.periods_per_year),
                rolling_sharpe: sharpe_ratio(slice, rf, self.periods_per_year),
                rolling_max_drawdown: max_drawdown(slice),
            })
            .collect()
    }
}
