use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// End-of-day portfolio snapshot. One per trading date, append-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    /// `cash + positions_value`.
    pub total_value: f64,
    pub cash: f64,
    pub positions_value: f64,
}

/// Simple period returns of `values`: `v[i] / v[i-1] - 1`.
///
/// A non-positive previous value yields a 0.0 return for that step.
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}
