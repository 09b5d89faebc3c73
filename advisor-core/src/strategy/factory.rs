//! Converts a serializable `StrategySpec` into a runtime trait object.

use serde::{Deserialize, Serialize};

use super::{AtrBreakout, BuyAndHold, MaCrossover, Strategy, StrategyError};
use crate::risk::RiskLevel;

/// Typed, serializable strategy configuration.
///
/// In TOML:
/// ```toml
/// [strategy]
/// type = "ma_crossover"
/// short_period = 10
/// long_period = 50
/// shares = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    BuyAndHold {
        shares_per_symbol: u64,
    },
    MaCrossover {
        short_period: usize,
        long_period: usize,
        shares: u64,
    },
    AtrBreakout {
        lookback: usize,
        atr_period: usize,
        #[serde(default)]
        risk_level: RiskLevel,
    },
}

impl StrategySpec {
    pub fn name(&self) -> &'static str {
        match self {
            StrategySpec::BuyAndHold { .. } => "buy_and_hold",
            StrategySpec::MaCrossover { .. } => "ma_crossover",
            StrategySpec::AtrBreakout { .. } => "atr_breakout",
        }
    }

    /// Short human-readable label including parameters.
    pub fn label(&self) -> String {
        match self {
            StrategySpec::BuyAndHold { shares_per_symbol } => {
                format!("buy_and_hold({shares_per_symbol})")
            }
            StrategySpec::MaCrossover {
                short_period,
                long_period,
                shares,
            } => format!("ma_crossover({short_period}/{long_period} x{shares})"),
            StrategySpec::AtrBreakout {
                lookback,
                atr_period,
                risk_level,
            } => format!("atr_breakout({lookback}, atr {atr_period}, {risk_level})"),
        }
    }
}

/// Build a strategy from its spec, validating parameters.
pub fn build_strategy(spec: &StrategySpec) -> Result<Box<dyn Strategy>, StrategyError> {
    match *spec {
        StrategySpec::BuyAndHold { shares_per_symbol } => {
            if shares_per_symbol == 0 {
                return Err(StrategyError::InvalidParameter {
                    strategy: "buy_and_hold",
                    reason: "shares_per_symbol must be >= 1".to_string(),
                });
            }
            Ok(Box::new(BuyAndHold::new(shares_per_symbol)))
        }
        StrategySpec::MaCrossover {
            short_period,
            long_period,
            shares,
        } => Ok(Box::new(MaCrossover::new(short_period, long_period, shares)?)),
        StrategySpec::AtrBreakout {
            lookback,
            atr_period,
            risk_level,
        } => Ok(Box::new(AtrBreakout::new(lookback, atr_period, risk_level)?)),
    }
}
