//! Performance metrics as pure functions over a daily return series.
//!
//! Every metric is a pure function: returns (and optionally a benchmark) in,
//! scalar out. Degenerate inputs produce a defined zero/neutral value, never
//! NaN. The one documented exception is an infinite profit factor when there
//! are gains and no losses.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats::{
    finite, longest_run, mean, percentile, sample_covariance, sample_std, sample_variance,
};

/// Trading periods per year for daily data.
pub const PERIODS_PER_YEAR: f64 = 252.0;
/// Annual risk-free rate used when none is configured.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Fixed-shape performance and risk statistics for one return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Negative fraction, e.g. -0.15 for a 15% drawdown.
    pub max_drawdown: f64,
    pub var_95: f64,
    pub cvar_95: f64,
    pub beta: f64,
    pub alpha: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub calmar_ratio: f64,
    pub information_ratio: f64,
    /// Finite return observations the statistics were computed from.
    pub observations: usize,
}

impl PortfolioMetrics {
    /// All statistics at their neutral value: zero, with beta 1.0.
    pub fn neutral() -> Self {
        Self {
            total_return: 0.0,
            annualized_return: 0.0,
            volatility: 0.0,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            max_drawdown: 0.0,
            var_95: 0.0,
            cvar_95: 0.0,
            beta: 1.0,
            alpha: 0.0,
            win_rate: 0.0,
            profit_factor: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            calmar_ratio: 0.0,
            information_ratio: 0.0,
            observations: 0,
        }
    }
}

impl Default for PortfolioMetrics {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Computes [`PortfolioMetrics`] for a configured risk-free rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalytics {
    /// Annual risk-free rate.
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
}

impl Default for PortfolioAnalytics {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_FREE_RATE)
    }
}

impl PortfolioAnalytics {
    pub fn new(risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            periods_per_year: PERIODS_PER_YEAR,
        }
    }

    /// Per-period risk-free rate.
    pub fn period_risk_free(&self) -> f64 {
        self.risk_free_rate / self.periods_per_year
    }

    /// Compute every statistic for `returns`, with benchmark-relative
    /// statistics when `benchmark` is given.
    ///
    /// Non-finite observations are dropped first. Fewer than two remaining
    /// observations yields [`PortfolioMetrics::neutral`].
    pub fn calculate_portfolio_metrics(
        &self,
        returns: &[f64],
        benchmark: Option<&[f64]>,
    ) -> PortfolioMetrics {
        let r = finite(returns);
        let n = r.len();
        if n < 2 {
            debug!(observations = n, "too few returns; using neutral metrics");
            return PortfolioMetrics {
                observations: n,
                ..PortfolioMetrics::neutral()
            };
        }

        let total = total_return(&r);
        let annualized = annualized_return(total, n, self.periods_per_year);
        let mdd = max_drawdown(&r);
        let var_95 = value_at_risk(&r, 0.95);

        let (beta, alpha, information_ratio) = match benchmark {
            Some(b) => benchmark_stats(returns, b),
            None => (1.0, 0.0, 0.0),
        };

        PortfolioMetrics {
            total_return: total,
            annualized_return: annualized,
            volatility: volatility(&r, self.periods_per_year),
            sharpe_ratio: sharpe_ratio(&r, self.period_risk_free(), self.periods_per_year),
            sortino_ratio: sortino_ratio(&r, self.period_risk_free(), self.periods_per_year),
            max_drawdown: mdd,
            var_95,
            cvar_95: conditional_var(&r, var_95),
            beta,
            alpha,
            win_rate: win_rate(&r),
            profit_factor: profit_factor(&r),
            avg_win: mean(&r.iter().copied().filter(|x| *x > 0.0).collect::<Vec<_>>()),
            avg_loss: mean(&r.iter().copied().filter(|x| *x < 0.0).collect::<Vec<_>>()),
            max_consecutive_wins: longest_run(&r, |x| x > 0.0),
            max_consecutive_losses: longest_run(&r, |x| x < 0.0),
            calmar_ratio: calmar_ratio(annualized, mdd),
            information_ratio,
            observations: n,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Compounded return: `prod(1 + r) - 1`.
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// `(1 + total)^(periods_per_year / n) - 1`.
///
/// 0.0 for no observations; -1.0 when the series lost everything
/// (`1 + total <= 0`), where a fractional power is undefined.
pub fn annualized_return(total_return: f64, n: usize, periods_per_year: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let base = 1.0 + total_return;
    if base <= 0.0 {
        return -1.0;
    }
    base.powf(periods_per_year / n as f64) - 1.0
}

/// Annualized sample standard deviation.
pub fn volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    sample_std(returns) * periods_per_year.sqrt()
}

/// Annualized Sharpe ratio.
///
/// `mean(r - rf) / std(r) * sqrt(periods)`; 0.0 when `std(r)` is zero.
pub fn sharpe_ratio(returns: &[f64], period_rf: f64, periods_per_year: f64) -> f64 {
    let std = sample_std(returns);
    if std < 1e-15 {
        return 0.0;
    }
    let excess = mean(returns) - period_rf;
    excess / std * periods_per_year.sqrt()
}

/// Annualized Sortino ratio using the sample std of the negative returns.
///
/// 0.0 when there are no negative returns or their std is zero.
pub fn sortino_ratio(returns: &[f64], period_rf: f64, periods_per_year: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_std = sample_std(&downside);
    if downside_std < 1e-15 {
        return 0.0;
    }
    let excess = mean(returns) - period_rf;
    excess / downside_std * periods_per_year.sqrt()
}

/// Maximum drawdown of the compounded series `cum = cumprod(1 + r)`, measured
/// against the running maximum of `cum`. Always `<= 0`.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cum = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for r in returns {
        cum *= 1.0 + r;
        peak = peak.max(cum);
        if peak > 0.0 {
            worst = worst.min((cum - peak) / peak);
        }
    }
    worst
}

/// Historical VaR: the `(1 - confidence)` percentile of returns.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    percentile(returns, (1.0 - confidence) * 100.0)
}

/// Mean of the returns at or below `var`. 0.0 if none are.
pub fn conditional_var(returns: &[f64], var: f64) -> f64 {
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    mean(&tail)
}

/// Fraction of strictly positive returns.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// Sum of gains over the absolute sum of losses.
///
/// Infinite with gains and no losses; 0.0 with neither.
pub fn profit_factor(returns: &[f64]) -> f64 {
    let gains: f64 = returns.iter().filter(|r| **r > 0.0).sum();
    let losses: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r.abs()).sum();
    if losses == 0.0 {
        return if gains > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gains / losses
}

/// Annualized return over absolute max drawdown; 0.0 without a drawdown.
pub fn calmar_ratio(annualized_return: f64, max_drawdown: f64) -> f64 {
    if max_drawdown == 0.0 {
        return 0.0;
    }
    annualized_return / max_drawdown.abs()
}

/// Beta, alpha, and information ratio against a benchmark.
///
/// Both series are aligned on their common trailing length and pairs with a
/// non-finite side are dropped. Fewer than two pairs gives `(1.0, 0.0, 0.0)`.
/// Alpha and information ratio are per-period, not annualized.
pub fn benchmark_stats(returns: &[f64], benchmark: &[f64]) -> (f64, f64, f64) {
    let n = returns.len().min(benchmark.len());
    let (r, b): (Vec<f64>, Vec<f64>) = returns[returns.len() - n..]
        .iter()
        .zip(&benchmark[benchmark.len() - n..])
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .unzip();
    if r.len() < 2 {
        return (1.0, 0.0, 0.0);
    }

    let var_b = sample_variance(&b);
    let beta = if var_b > 0.0 {
        sample_covariance(&r, &b) / var_b
    } else {
        1.0
    };
    let alpha = mean(&r) - beta * mean(&b);

    let active: Vec<f64> = r.iter().zip(&b).map(|(x, y)| x - y).collect();
    let tracking_error = sample_std(&active);
    let information_ratio = if tracking_error < 1e-15 {
        0.0
    } else {
        mean(&active) / tracking_error
    };

    (beta, alpha, information_ratio)
}
