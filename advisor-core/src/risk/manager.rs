//! Position sizing, stop and target derivation, and risk aggregation.
//!
//! Every method is a pure function of its arguments and the manager's
//! immutable level and limits, so one manager can be shared across runs.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::concentration::{gini, herfindahl, weighted_average_correlation, CorrelationMethod};
use super::level::{RiskLevel, RiskLimits};

/// Default reward-to-risk ratio for take-profit targets.
pub const DEFAULT_RISK_REWARD: f64 = 2.0;

/// Smallest position, as a fraction of portfolio value.
const MIN_POSITION_FRACTION: f64 = 0.001;
/// Largest position, as a fraction of portfolio value.
const MAX_POSITION_FRACTION: f64 = 0.05;
/// Annualized volatility above which the risk budget starts shrinking.
const TARGET_VOLATILITY: f64 = 0.20;
/// Herfindahl index above which a concentration alert fires.
const CONCENTRATION_ALERT: f64 = 0.5;
/// Sector label for symbols missing from a supplied sector map.
pub const UNCLASSIFIED_SECTOR: &str = "unclassified";

/// Risk snapshot for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRisk {
    pub symbol: String,
    pub position_size: u64,
    pub entry_price: f64,
    pub current_price: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub position_value: f64,
    pub unrealized_pnl: f64,
    /// `|current - stop| * size`.
    pub risk_amount: f64,
    /// `risk_amount / portfolio_value`.
    pub risk_percentage: f64,
}

/// Aggregate risk snapshot for a set of positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRisk {
    pub portfolio_value: f64,
    pub total_risk: f64,
    pub risk_percentage: f64,
    /// Herfindahl index of position values.
    pub concentration_risk: f64,
    pub correlation_risk: f64,
    pub correlation_method: CorrelationMethod,
    /// Sector → market value / portfolio value. Empty without a sector map.
    pub sector_exposure: BTreeMap<String, f64>,
    pub risk_alerts: Vec<String>,
}

/// Sizing and risk assessment for a given risk level and set of limits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskManager {
    pub level: RiskLevel,
    pub limits: RiskLimits,
}

impl RiskManager {
    pub fn new(level: RiskLevel, limits: RiskLimits) -> Self {
        Self { level, limits }
    }

    pub fn with_level(level: RiskLevel) -> Self {
        Self::new(level, RiskLimits::default())
    }

    // ── Sizing ──

    /// Whole shares to buy at `price` with a stop at `stop_price`.
    ///
    /// ```text
    /// max_risk = portfolio_value * max_position_risk * level_multiplier
    ///            * min(1, 0.2 / volatility)          (when volatility > 0)
    /// raw      = max_risk / |price - stop_price|
    /// shares   = trunc(clamp(raw, 0.1% pv / price, 5% pv / price))
    /// ```
    ///
    /// Returns 0 for a zero stop distance or non-positive / non-finite
    /// price or portfolio value.
    pub fn calculate_position_size(
        &self,
        price: f64,
        stop_price: f64,
        portfolio_value: f64,
        volatility: Option<f64>,
    ) -> u64 {
        if !price.is_finite() || price <= 0.0 || !stop_price.is_finite() {
            return 0;
        }
        if !portfolio_value.is_finite() || portfolio_value <= 0.0 {
            return 0;
        }
        let risk_per_share = (price - stop_price).abs();
        if risk_per_share <= 0.0 {
            return 0;
        }

        let mut max_risk =
            portfolio_value * self.limits.max_position_risk * self.level.sizing_multiplier();
        if let Some(vol) = volatility.filter(|v| v.is_finite() && *v > 0.0) {
            max_risk *= (TARGET_VOLATILITY / vol).min(1.0);
        }

        let raw = max_risk / risk_per_share;
        let min_size = portfolio_value * MIN_POSITION_FRACTION / price;
        let max_size = portfolio_value * MAX_POSITION_FRACTION / price;
        let size = raw.max(min_size).min(max_size);

        if size.is_finite() && size > 0.0 {
            size.trunc() as u64
        } else {
            0
        }
    }

    // ── Stops and targets ──

    /// Stop below `entry_price` at this manager's ATR multiple.
    pub fn calculate_stop_loss(&self, entry_price: f64, atr: f64) -> f64 {
        self.level.stop_loss(entry_price, atr)
    }

    /// `entry + (entry - stop) * risk_reward_ratio`.
    pub fn calculate_take_profit(
        &self,
        entry_price: f64,
        stop_price: f64,
        risk_reward_ratio: f64,
    ) -> f64 {
        entry_price + (entry_price - stop_price) * risk_reward_ratio
    }

    // ── Position risk ──

    pub fn analyze_position_risk(
        &self,
        symbol: &str,
        position_size: u64,
        entry_price: f64,
        current_price: f64,
        stop_loss_price: f64,
        portfolio_value: f64,
    ) -> PositionRisk {
        let size = position_size as f64;
        let risk_amount = (current_price - stop_loss_price).abs() * size;
        PositionRisk {
            symbol: symbol.to_string(),
            position_size,
            entry_price,
            current_price,
            stop_loss_price,
            take_profit_price: self.calculate_take_profit(
                entry_price,
                stop_loss_price,
                DEFAULT_RISK_REWARD,
            ),
            position_value: current_price * size,
            unrealized_pnl: (current_price - entry_price) * size,
            risk_amount,
            risk_percentage: ratio(risk_amount, portfolio_value),
        }
    }

    // ── Portfolio risk ──

    /// Aggregate risk with the Gini size-inequality proxy for correlation.
    pub fn analyze_portfolio_risk(
        &self,
        positions: &[PositionRisk],
        portfolio_value: f64,
        sector_map: Option<&HashMap<String, String>>,
    ) -> PortfolioRisk {
        let values: Vec<f64> = positions.iter().map(|p| p.position_value).collect();
        self.aggregate(
            positions,
            portfolio_value,
            sector_map,
            gini(&values),
            CorrelationMethod::GiniProxy,
        )
    }

    /// Aggregate risk with a return-based correlation estimate.
    ///
    /// Falls back to the Gini proxy when fewer than two positions have a
    /// usable return history.
    pub fn analyze_portfolio_risk_with_returns(
        &self,
        positions: &[PositionRisk],
        portfolio_value: f64,
        sector_map: Option<&HashMap<String, String>>,
        returns_by_symbol: &HashMap<String, Vec<f64>>,
    ) -> PortfolioRisk {
        let entries: Vec<(f64, &[f64])> = positions
            .iter()
            .filter_map(|p| {
                returns_by_symbol
                    .get(&p.symbol)
                    .map(|r| (p.position_value, r.as_slice()))
            })
            .collect();

        match weighted_average_correlation(&entries) {
            Some(corr) => self.aggregate(
                positions,
                portfolio_value,
                sector_map,
                corr,
                CorrelationMethod::Pearson,
            ),
            None => self.analyze_portfolio_risk(positions, portfolio_value, sector_map),
        }
    }

    fn aggregate(
        &self,
        positions: &[PositionRisk],
        portfolio_value: f64,
        sector_map: Option<&HashMap<String, String>>,
        correlation_risk: f64,
        correlation_method: CorrelationMethod,
    ) -> PortfolioRisk {
        let total_risk: f64 = positions.iter().map(|p| p.risk_amount).sum();
        let risk_percentage = ratio(total_risk, portfolio_value);
        let values: Vec<f64> = positions.iter().map(|p| p.position_value).collect();
        let concentration_risk = herfindahl(&values);

        let mut sector_exposure = BTreeMap::new();
        if let Some(map) = sector_map {
            for p in positions {
                let sector = map
                    .get(&p.symbol)
                    .cloned()
                    .unwrap_or_else(|| UNCLASSIFIED_SECTOR.to_string());
                *sector_exposure.entry(sector).or_insert(0.0) +=
                    ratio(p.position_value, portfolio_value);
            }
        }

        let mut risk_alerts = Vec::new();
        if risk_percentage > self.limits.max_portfolio_risk {
            risk_alerts.push(format!(
                "Portfolio risk {:.2}% exceeds limit of {:.2}%",
                risk_percentage * 100.0,
                self.limits.max_portfolio_risk * 100.0
            ));
        }
        for p in positions {
            if p.risk_percentage > self.limits.max_position_risk {
                risk_alerts.push(format!(
                    "{}: position risk {:.2}% exceeds limit of {:.2}%",
                    p.symbol,
                    p.risk_percentage * 100.0,
                    self.limits.max_position_risk * 100.0
                ));
            }
        }
        if concentration_risk > CONCENTRATION_ALERT {
            risk_alerts.push(format!(
                "High concentration risk: Herfindahl index {concentration_risk:.2}"
            ));
        }
        for (sector, exposure) in &sector_exposure {
            if *exposure > self.limits.max_sector_exposure {
                risk_alerts.push(format!(
                    "Sector {sector} exposure {:.1}% exceeds limit of {:.1}%",
                    exposure * 100.0,
                    self.limits.max_sector_exposure * 100.0
                ));
            }
        }

        PortfolioRisk {
            portfolio_value,
            total_risk,
            risk_percentage,
            concentration_risk,
            correlation_risk,
            correlation_method,
            sector_exposure,
            risk_alerts,
        }
    }

    // ── Exit decision ──

    /// Close when the position breaches its own cap, when the portfolio is
    /// over its cap and this position carries more than half the per-position
    /// cap, or when price has reached the stop.
    pub fn should_close_position(
        &self,
        position: &PositionRisk,
        portfolio: &PortfolioRisk,
    ) -> bool {
        if position.current_price <= position.stop_loss_price {
            return true;
        }
        if position.risk_percentage > self.limits.max_position_risk {
            return true;
        }
        portfolio.risk_percentage > self.limits.max_portfolio_risk
            && position.risk_percentage > self.limits.max_position_risk / 2.0
    }
}

/// `num / den`, or 0.0 when the denominator is not a positive finite number.
fn ratio(num: f64, den: f64) -> f64 {
    if den.is_finite() && den > 0.0 {
        num / den
    } else {
        0.0
    }
}
