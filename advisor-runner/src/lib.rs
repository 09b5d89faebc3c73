//! Advisor Runner: backtest orchestration on top of `advisor-core`.
//!
//! This crate provides:
//! - TOML run configuration with content-addressed run ids
//! - Data loading from per-symbol CSV files with synthetic fallback
//! - Config-driven single runs
//! - Parallel parameter sweeps ranked by Sharpe ratio
//! - JSON, CSV, and Markdown artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_bars, DataSource, LoadError, LoadOptions, LoadedData};
pub use export::save_artifacts;
pub use runner::{run_backtest_from_data, run_single_backtest, RunError, RunOutput};
pub use sweep::{run_sweep, SweepEntry, SweepGrid, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
    }

    #[test]
    fn run_output_is_send_sync() {
        assert_send::<RunOutput>();
        assert_sync::<RunOutput>();
        assert_send::<SweepResults>();
        assert_sync::<SweepResults>();
    }

    #[test]
    fn errors_are_send() {
        assert_send::<RunError>();
        assert_send::<LoadError>();
    }
}
