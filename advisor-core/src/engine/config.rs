//! Engine configuration and construction errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::DEFAULT_RISK_FREE_RATE;
use crate::risk::{RiskLevel, RiskLimits};

/// Errors raised when building an engine.
///
/// Nothing fails once an engine exists: empty inputs and unfillable orders
/// are normal outcomes reported on the result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid engine config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Configuration for a backtest engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Starting cash.
    pub initial_capital: f64,
    /// Commission as a fraction of traded notional, charged per side.
    pub commission_rate: f64,
    /// Adverse price adjustment as a fraction of the reference price.
    pub slippage_rate: f64,
    pub risk_level: RiskLevel,
    pub limits: RiskLimits,
    /// Annual risk-free rate for Sharpe and Sortino.
    pub risk_free_rate: f64,
    /// Symbol whose close-to-close returns serve as the benchmark.
    pub benchmark: Option<String>,
    /// Trailing window for the volatility adjustment on risk-sized orders.
    pub volatility_window: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            commission_rate: 0.001,
            slippage_rate: 0.0005,
            risk_level: RiskLevel::default(),
            limits: RiskLimits::default(),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            benchmark: None,
            volatility_window: None,
        }
    }
}

impl EngineConfig {
    pub fn new(initial_capital: f64, commission_rate: f64, slippage_rate: f64) -> Self {
        Self {
            initial_capital,
            commission_rate,
            slippage_rate,
            ..Self::default()
        }
    }

    /// No commission and no slippage.
    pub fn frictionless(initial_capital: f64) -> Self {
        Self::new(initial_capital, 0.0, 0.0)
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    pub fn with_limits(mut self, limits: RiskLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn with_benchmark(mut self, symbol: impl Into<String>) -> Self {
        self.benchmark = Some(symbol.into());
        self
    }

    pub fn with_volatility_window(mut self, window: usize) -> Self {
        self.volatility_window = Some(window);
        self
    }

    /// Reject negative or non-finite money amounts and rates.
    pub fn validate(&self) -> Result<(), EngineError> {
        non_negative("initial_capital", self.initial_capital)?;
        non_negative("commission_rate", self.commission_rate)?;
        non_negative("slippage_rate", self.slippage_rate)?;
        if self.slippage_rate >= 1.0 {
            return Err(EngineError::InvalidConfig {
                field: "slippage_rate",
                reason: format!("must be < 1, got {}", self.slippage_rate),
            });
        }
        if !self.risk_free_rate.is_finite() {
            return Err(EngineError::InvalidConfig {
                field: "risk_free_rate",
                reason: "must be finite".to_string(),
            });
        }
        if let Some(field) = self.limits.invalid_field() {
            return Err(EngineError::InvalidConfig {
                field,
                reason: "must be a finite, non-negative fraction".to_string(),
            });
        }
        if let Some(w) = self.volatility_window.filter(|w| *w < 2) {
            return Err(EngineError::InvalidConfig {
                field: "volatility_window",
                reason: format!("must be >= 2, got {w}"),
            });
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig {
            field,
            reason: format!("must be finite and >= 0, got {value}"),
        })
    }
}
