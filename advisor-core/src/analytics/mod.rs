//! Portfolio analytics: performance and risk statistics over return series.

pub mod metrics;
pub mod report;
pub mod rolling;
pub mod stats;

pub use metrics::{
    PortfolioAnalytics, PortfolioMetrics, DEFAULT_RISK_FREE_RATE, PERIODS_PER_YEAR,
};
pub use report::{AnalyticsReport, ReportRow, ReportSection};
pub use rolling::RollingMetrics;
