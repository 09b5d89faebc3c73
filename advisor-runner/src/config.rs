//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! start_date = "2023-01-02"
//! end_date = "2023-12-29"
//! initial_capital = 100000.0
//! commission_rate = 0.001
//! slippage_rate = 0.0005
//! benchmark = "SPY"
//!
//! [risk]
//! level = "moderate"
//! max_position_risk = 0.01
//!
//! [strategy]
//! type = "ma_crossover"
//! short_period = 10
//! long_period = 50
//! shares = 100
//!
//! [data]
//! symbols = ["SPY", "QQQ"]
//! dir = "data"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use advisor_core::analytics::DEFAULT_RISK_FREE_RATE;
use advisor_core::engine::{EngineConfig, EngineError};
use advisor_core::risk::{RiskLevel, RiskLimits};
use advisor_core::strategy::{build_strategy, StrategyError, StrategySpec};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("invalid strategy: {0}")]
    Strategy(#[from] StrategyError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Complete, reproducible description of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub risk: RiskSection,
    pub strategy: StrategySpec,
    pub data: DataSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    /// Inclusive.
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
    #[serde(default = "default_slippage_rate")]
    pub slippage_rate: f64,
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    #[serde(default)]
    pub benchmark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    pub level: RiskLevel,
    pub max_portfolio_risk: f64,
    pub max_position_risk: f64,
    pub max_sector_exposure: f64,
    /// Trailing window for the volatility adjustment on risk-sized entries.
    pub volatility_window: Option<usize>,
}

impl Default for RiskSection {
    fn default() -> Self {
        let limits = RiskLimits::default();
        Self {
            level: RiskLevel::default(),
            max_portfolio_risk: limits.max_portfolio_risk,
            max_position_risk: limits.max_position_risk,
            max_sector_exposure: limits.max_sector_exposure,
            volatility_window: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    /// Symbols to trade. The benchmark is loaded in addition when set but is
    /// only traded if listed here too.
    pub symbols: Vec<String>,
    /// Directory holding `<SYMBOL>.csv` files.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Generate deterministic synthetic bars for symbols without a CSV file.
    #[serde(default)]
    pub synthetic: bool,
}

fn default_initial_capital() -> f64 {
    100_000.0
}

fn default_commission_rate() -> f64 {
    0.001
}

fn default_slippage_rate() -> f64 {
    0.0005
}

fn default_risk_free_rate() -> f64 {
    DEFAULT_RISK_FREE_RATE
}

impl BacktestConfig {
    /// Parse and validate a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.start_date > self.backtest.end_date {
            return Err(ConfigError::Invalid {
                field: "backtest.start_date",
                reason: format!(
                    "{} is after end_date {}",
                    self.backtest.start_date, self.backtest.end_date
                ),
            });
        }
        if self.data.symbols.is_empty() {
            return Err(ConfigError::Invalid {
                field: "data.symbols",
                reason: "at least one symbol is required".to_string(),
            });
        }
        if self.data.dir.is_none() && !self.data.synthetic {
            return Err(ConfigError::Invalid {
                field: "data.dir",
                reason: "required unless data.synthetic = true".to_string(),
            });
        }
        self.engine_config().validate()?;
        build_strategy(&self.strategy)?;
        Ok(())
    }

    /// The engine configuration this file describes.
    pub fn engine_config(&self) -> EngineConfig {
        let b = &self.backtest;
        let r = &self.risk;
        EngineConfig {
            initial_capital: b.initial_capital,
            commission_rate: b.commission_rate,
            slippage_rate: b.slippage_rate,
            risk_level: r.level,
            limits: RiskLimits {
                max_portfolio_risk: r.max_portfolio_risk,
                max_position_risk: r.max_position_risk,
                max_sector_exposure: r.max_sector_exposure,
            },
            risk_free_rate: b.risk_free_rate,
            benchmark: b.benchmark.clone(),
            volatility_window: r.volatility_window,
        }
    }

    /// Every symbol to load: the traded symbols plus the benchmark.
    ///
    /// The runner splits the benchmark back out before the strategy runs,
    /// unless it is also one of the traded symbols.
    pub fn all_symbols(&self) -> Vec<String> {
        let mut symbols = self.data.symbols.clone();
        if let Some(b) = &self.backtest.benchmark {
            if !symbols.contains(b) {
                symbols.push(b.clone());
            }
        }
        symbols
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    ///
    /// Two identical configs share a run id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[backtest]
start_date = "2023-01-02"
end_date = "2023-12-29"
initial_capital = 50000.0
benchmark = "SPY"

[risk]
level = "aggressive"
volatility_window = 20

[strategy]
type = "ma_crossover"
short_period = 10
long_period = 50
shares = 100

[data]
symbols = ["QQQ"]
synthetic = true
"#;

    #[test]
    fn parses_sample() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.backtest.initial_capital, 50_000.0);
        assert_eq!(config.backtest.commission_rate, 0.001);
        assert_eq!(config.risk.level, RiskLevel::Aggressive);
        assert_eq!(config.risk.max_position_risk, 0.01);
        assert_eq!(
            config.strategy,
            StrategySpec::MaCrossover {
                short_period: 10,
                long_period: 50,
                shares: 100
            }
        );
        assert_eq!(config.all_symbols(), vec!["QQQ".to_string(), "SPY".to_string()]);

        let engine = config.engine_config();
        assert_eq!(engine.benchmark.as_deref(), Some("SPY"));
        assert_eq!(engine.volatility_window, Some(20));
    }

    #[test]
    fn toml_round_trip() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        let text = config.to_toml().unwrap();
        assert_eq!(BacktestConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        let id = config.run_id().unwrap();
        assert_eq!(id, config.run_id().unwrap());
        assert_eq!(id.len(), 64);

        let mut other = config.clone();
        other.backtest.initial_capital = 60_000.0;
        assert_ne!(id, other.run_id().unwrap());
    }

    #[test]
    fn rejects_inverted_dates() {
        let text = SAMPLE.replace("2023-01-02", "2024-06-01");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Invalid {
                field: "backtest.start_date",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_strategy_params() {
        let text = SAMPLE.replace("long_period = 50", "long_period = 5");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Strategy(_))
        ));
    }

    #[test]
    fn rejects_negative_commission() {
        let text = SAMPLE.replace("initial_capital = 50000.0", "commission_rate = -0.1");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Engine(_))
        ));
    }

    #[test]
    fn requires_data_source() {
        let text = SAMPLE.replace("synthetic = true", "");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Invalid {
                field: "data.dir",
                ..
            })
        ));
    }

    #[test]
    fn unknown_strategy_type_is_parse_error() {
        let text = SAMPLE.replace("ma_crossover", "martingale");
        assert!(matches!(
            BacktestConfig::from_toml(&text),
            Err(ConfigError::Parse(_))
        ));
    }
}
