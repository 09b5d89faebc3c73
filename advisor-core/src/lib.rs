//! Advisor Core: the quantitative heart of the trading advisor.
//!
//! - Domain types (bars, market data, order intents, fills, positions, trades)
//! - Risk manager: position sizing, stops, position and portfolio risk
//! - Portfolio analytics: return, risk, and benchmark-relative metrics
//! - Daily backtesting engine driving a pluggable [`strategy::Strategy`]

pub mod analytics;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod risk;
pub mod strategy;

pub use analytics::{PortfolioAnalytics, PortfolioMetrics};
pub use engine::{BacktestEngine, BacktestResult, EngineConfig, EngineError};
pub use risk::{RiskLevel, RiskLimits, RiskManager};
pub use strategy::Strategy;
