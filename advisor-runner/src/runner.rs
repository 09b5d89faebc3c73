//! Backtest runner: wires together config, data loading, strategy, and engine.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads data per the config, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded data, no I/O.
//!
//! The benchmark is loaded with the traded symbols but never handed to the
//! strategy: it only feeds benchmark returns.

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use advisor_core::domain::{BarSeries, MarketData};
use advisor_core::engine::{BacktestEngine, BacktestResult, EngineError};
use advisor_core::strategy::{build_strategy, StrategyError};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{compute_dataset_hash, load_bars, LoadError, LoadOptions};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("no data to simulate between {start} and {end}")]
    NoData { start: NaiveDate, end: NaiveDate },
}

/// A finished run together with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub run_id: RunId,
    pub result: BacktestResult,
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

/// Run a single backtest from a BacktestConfig (loads data first).
pub fn run_single_backtest(config: &BacktestConfig) -> Result<RunOutput, RunError> {
    let opts = LoadOptions {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        synthetic: config.data.synthetic,
    };
    let loaded = load_bars(&config.all_symbols(), config.data.dir.as_deref(), &opts)?;
    let mut output = run_backtest_from_data(config, &loaded.market)?;
    output.dataset_hash = loaded.dataset_hash;
    output.has_synthetic = loaded.has_synthetic;
    Ok(output)
}

/// Run a backtest with pre-loaded data, no I/O.
///
/// `market` may hold the benchmark series; it is split back out so the
/// strategy only trades `data.symbols`. A run whose calendar is empty is an
/// error here: there is nothing to report.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    market: &MarketData,
) -> Result<RunOutput, RunError> {
    let (traded, benchmark) = split_benchmark(config, market);
    let (run_id, result) = run_on(config, &traded, benchmark)?;
    Ok(RunOutput {
        run_id,
        result,
        dataset_hash: compute_dataset_hash(market),
        has_synthetic: false,
    })
}

/// Separate the benchmark series from the symbols the strategy may trade.
///
/// A benchmark that is also listed in `data.symbols` stays tradable.
pub(crate) fn split_benchmark<'a>(
    config: &BacktestConfig,
    market: &'a MarketData,
) -> (Cow<'a, MarketData>, Option<&'a BarSeries>) {
    let Some(symbol) = config.backtest.benchmark.as_deref() else {
        return (Cow::Borrowed(market), None);
    };
    let benchmark = market.get(symbol);
    if benchmark.is_none() || config.data.symbols.iter().any(|s| s == symbol) {
        return (Cow::Borrowed(market), benchmark);
    }
    let traded = market
        .iter()
        .filter(|s| s.symbol() != symbol)
        .cloned()
        .collect();
    (Cow::Owned(traded), benchmark)
}

/// Build the engine and strategy for `config` and run them on `traded`.
pub(crate) fn run_on(
    config: &BacktestConfig,
    traded: &MarketData,
    benchmark: Option<&BarSeries>,
) -> Result<(RunId, BacktestResult), RunError> {
    let engine = BacktestEngine::new(config.engine_config())?;
    let strategy = build_strategy(&config.strategy)?;
    let (start, end) = (config.backtest.start_date, config.backtest.end_date);

    let result = engine.run_with_benchmark(strategy.as_ref(), traded, benchmark, start, end);
    if result.is_empty() {
        return Err(RunError::NoData { start, end });
    }

    let run_id = config.run_id()?;
    let short_id = run_id.get(..12).unwrap_or(&run_id);
    info!(
        run_id = %short_id,
        strategy = %config.strategy.label(),
        total_return = result.total_return(),
        sharpe = result.metrics.sharpe_ratio,
        "backtest finished"
    );
    Ok((run_id, result))
}
