//! Risk level and risk limits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse risk appetite applied to sizing and stop distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [
        RiskLevel::Conservative,
        RiskLevel::Moderate,
        RiskLevel::Aggressive,
    ];

    /// Multiplier on the per-position risk budget.
    pub fn sizing_multiplier(self) -> f64 {
        match self {
            RiskLevel::Conservative => 0.5,
            RiskLevel::Moderate => 1.0,
            RiskLevel::Aggressive => 1.5,
        }
    }

    /// How many ATRs below entry the stop sits.
    pub fn atr_stop_multiplier(self) -> f64 {
        match self {
            RiskLevel::Conservative => 1.5,
            RiskLevel::Moderate => 2.0,
            RiskLevel::Aggressive => 2.5,
        }
    }

    /// `entry_price - atr * atr_stop_multiplier`.
    pub fn stop_loss(self, entry_price: f64, atr: f64) -> f64 {
        entry_price - atr * self.atr_stop_multiplier()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Conservative => "conservative",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown risk level '{0}' (expected conservative, moderate or aggressive)")]
pub struct ParseRiskLevelError(pub String);

impl FromStr for RiskLevel {
    type Err = ParseRiskLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(RiskLevel::Conservative),
            "moderate" => Ok(RiskLevel::Moderate),
            "aggressive" => Ok(RiskLevel::Aggressive),
            _ => Err(ParseRiskLevelError(s.to_string())),
        }
    }
}

/// Fractional caps enforced by the risk manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Total stop-distance risk as a fraction of portfolio value.
    pub max_portfolio_risk: f64,
    /// Per-position stop-distance risk as a fraction of portfolio value.
    pub max_position_risk: f64,
    /// Per-sector market value as a fraction of portfolio value.
    pub max_sector_exposure: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_portfolio_risk: 0.02,
            max_position_risk: 0.01,
            max_sector_exposure: 0.25,
        }
    }
}

impl RiskLimits {
    /// Name of the first limit that is negative or non-finite, if any.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("max_portfolio_risk", self.max_portfolio_risk),
            ("max_position_risk", self.max_position_risk),
            ("max_sector_exposure", self.max_sector_exposure),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
        .map(|(name, _)| name)
    }
}
