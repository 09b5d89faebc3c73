//! Risk management: sizing, stops, and portfolio risk aggregation.

pub mod concentration;
pub mod level;
pub mod manager;

pub use concentration::CorrelationMethod;
pub use level::{ParseRiskLevelError, RiskLevel, RiskLimits};
pub use manager::{PortfolioRisk, PositionRisk, RiskManager, DEFAULT_RISK_REWARD};
