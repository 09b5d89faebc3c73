//! Backtesting engine: configuration, cost model, day loop, and results.

pub mod config;
pub mod cost_model;
pub mod loop_runner;
pub mod portfolio_update;
pub mod report;
pub mod result;
pub mod state;
pub mod trade_extraction;

pub use config::{EngineConfig, EngineError};
pub use cost_model::CostModel;
pub use loop_runner::BacktestEngine;
pub use portfolio_update::apply_fill;
pub use report::{BacktestReport, RiskMetricsSection, SummarySection, TradingMetricsSection};
pub use result::BacktestResult;
pub use state::SimulationState;
pub use trade_extraction::extract_trades;
