//! Concentration and correlation measures over position values.

use serde::{Deserialize, Serialize};

/// How `PortfolioRisk::correlation_risk` was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Gini coefficient of position values. A size-inequality proxy, not a
    /// correlation; used when per-position return history is unavailable.
    GiniProxy,
    /// Value-weighted average pairwise Pearson correlation of returns.
    Pearson,
}

/// Herfindahl-Hirschman index of the value weights: `sum(w_i^2)`.
///
/// 1.0 for a single position, `1/n` for `n` equal positions, 0.0 when empty.
pub fn herfindahl(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    values.iter().map(|v| (v / total).powi(2)).sum()
}

/// Gini coefficient of `values`: 0.0 for perfect equality, approaching 1.0
/// as value concentrates in one entry. 0.0 for fewer than two values.
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    let total: f64 = values.iter().sum();
    if n < 2 || total <= 0.0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| (i + 1) as f64 * v)
        .sum();
    let n = n as f64;
    (2.0 * weighted) / (n * total) - (n + 1.0) / n
}

/// Pearson correlation of the common trailing window of `a` and `b`.
///
/// `None` when fewer than two overlapping observations or either side is constant.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Value-weighted average pairwise correlation.
///
/// Each entry is `(position_value, returns)`. Pairs are weighted by the
/// product of their value weights. `None` when no pair yields a correlation.
pub fn weighted_average_correlation(entries: &[(f64, &[f64])]) -> Option<f64> {
    let total: f64 = entries.iter().map(|(v, _)| v).sum();
    if total <= 0.0 {
        return None;
    }
    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let (vi, ri) = entries[i];
            let (vj, rj) = entries[j];
            if let Some(rho) = pearson(ri, rj) {
                let w = (vi / total) * (vj / total);
                num += w * rho;
                den += w;
            }
        }
    }
    (den > 0.0).then(|| num / den)
}
