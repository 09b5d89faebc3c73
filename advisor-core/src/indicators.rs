//! Indicator helpers used by the built-in strategies and the engine's
//! volatility-adjusted sizing.
//!
//! Each helper returns the value as of the last element of its input, or
//! `None` when there is not enough history. Callers pass slices already
//! truncated at the current date, so nothing here can look ahead.

use crate::domain::Bar;

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Mean of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// True Range series.
///
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let hl = bar.high - bar.low;
        if i == 0 {
            tr.push(hl);
            continue;
        }
        let pc = bars[i - 1].close;
        tr.push(hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()));
    }
    tr
}

/// Average True Range: simple mean of the last `period` true ranges.
///
/// Needs `period + 1` bars so every averaged range has a previous close.
pub fn atr(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }
    sma(&true_range(bars), period)
}

/// Annualized standard deviation of the last `window` close-to-close returns.
///
/// Uses the sample standard deviation. Needs `window + 1` closes.
pub fn annualized_volatility(closes: &[f64], window: usize) -> Option<f64> {
    if window < 2 || closes.len() < window + 1 {
        return None;
    }
    let tail = &closes[closes.len() - window - 1..];
    let returns: Vec<f64> = tail
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    Some(var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Highest high over the `lookback` bars before the last one.
///
/// The current bar is excluded so a close can be compared against a
/// channel it did not help form.
pub fn prior_highest_high(bars: &[Bar], lookback: usize) -> Option<f64> {
    prior_window(bars, lookback).map(|w| w.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max))
}

/// Lowest low over the `lookback` bars before the last one.
pub fn prior_lowest_low(bars: &[Bar], lookback: usize) -> Option<f64> {
    prior_window(bars, lookback).map(|w| w.iter().map(|b| b.low).fold(f64::INFINITY, f64::min))
}

fn prior_window(bars: &[Bar], lookback: usize) -> Option<&[Bar]> {
    if lookback == 0 || bars.len() < lookback + 1 {
        return None;
    }
    let end = bars.len() - 1;
    Some(&bars[end - lookback..end])
}
