//! Parameter sweeps over strategy parameters and risk levels.
//!
//! Every grid point is an independent backtest with its own engine, so
//! points run in parallel on the rayon pool over shared, read-only data.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use advisor_core::analytics::PortfolioMetrics;
use advisor_core::domain::MarketData;
use advisor_core::risk::RiskLevel;
use advisor_core::strategy::StrategySpec;

use crate::config::{BacktestConfig, RunId};
use crate::runner::{run_on, split_benchmark, RunError};

/// Grid of strategy specs crossed with risk levels.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub strategies: Vec<StrategySpec>,
    pub risk_levels: Vec<RiskLevel>,
}

impl SweepGrid {
    /// MA crossover grid. Pairs with `short >= long` are skipped.
    pub fn ma_crossover(shorts: &[usize], longs: &[usize], shares: u64) -> Self {
        let mut strategies = Vec::new();
        for &short_period in shorts {
            for &long_period in longs {
                if short_period >= long_period {
                    continue;
                }
                strategies.push(StrategySpec::MaCrossover {
                    short_period,
                    long_period,
                    shares,
                });
            }
        }
        Self {
            strategies,
            risk_levels: vec![RiskLevel::Moderate],
        }
    }

    /// ATR breakout grid across every risk level.
    pub fn atr_breakout(lookbacks: &[usize], atr_periods: &[usize]) -> Self {
        let mut strategies = Vec::new();
        for &lookback in lookbacks {
            for &atr_period in atr_periods {
                strategies.push(StrategySpec::AtrBreakout {
                    lookback,
                    atr_period,
                    risk_level: RiskLevel::Moderate,
                });
            }
        }
        Self {
            strategies,
            risk_levels: RiskLevel::ALL.to_vec(),
        }
    }

    pub fn with_risk_levels(mut self, levels: Vec<RiskLevel>) -> Self {
        self.risk_levels = levels;
        self
    }

    /// Total number of grid points.
    pub fn size(&self) -> usize {
        self.strategies.len() * self.risk_levels.len()
    }

    /// All `(strategy, risk level)` points. A breakout's own risk level
    /// follows the point's level.
    pub fn points(&self) -> Vec<(StrategySpec, RiskLevel)> {
        let mut points = Vec::with_capacity(self.size());
        for spec in &self.strategies {
            for &level in &self.risk_levels {
                let spec = match spec {
                    StrategySpec::AtrBreakout {
                        lookback,
                        atr_period,
                        ..
                    } => StrategySpec::AtrBreakout {
                        lookback: *lookback,
                        atr_period: *atr_period,
                        risk_level: level,
                    },
                    other => other.clone(),
                };
                points.push((spec, level));
            }
        }
        points
    }
}

/// Summary of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub run_id: RunId,
    pub label: String,
    pub strategy: StrategySpec,
    pub risk_level: RiskLevel,
    pub final_value: f64,
    pub fills: usize,
    pub closed_trades: usize,
    pub metrics: PortfolioMetrics,
}

/// Sweep entries ranked by Sharpe ratio, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    entries: Vec<SweepEntry>,
}

impl SweepResults {
    fn ranked(mut entries: Vec<SweepEntry>) -> Self {
        entries.sort_by(|a, b| {
            b.metrics
                .sharpe_ratio
                .total_cmp(&a.metrics.sharpe_ratio)
                .then_with(|| a.label.cmp(&b.label))
                .then_with(|| a.risk_level.as_str().cmp(b.risk_level.as_str()))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&SweepEntry> {
        self.entries.first()
    }

    pub fn top_n(&self, n: usize) -> &[SweepEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

/// Run every grid point against `market` using `base` for everything the
/// grid does not vary.
pub fn run_sweep(
    base: &BacktestConfig,
    grid: &SweepGrid,
    market: &MarketData,
) -> Result<SweepResults, RunError> {
    let points = grid.points();
    info!(points = points.len(), "starting sweep");
    let (traded, benchmark) = split_benchmark(base, market);

    let entries = points
        .par_iter()
        .map(|(spec, level)| {
            let mut config = base.clone();
            config.strategy = spec.clone();
            config.risk.level = *level;
            let (run_id, result) = run_on(&config, &traded, benchmark)?;
            Ok(SweepEntry {
                run_id,
                label: spec.label(),
                strategy: spec.clone(),
                risk_level: *level,
                final_value: result.final_value(),
                fills: result.fills.len(),
                closed_trades: result.closed_trades.len(),
                metrics: result.metrics,
            })
        })
        .collect::<Result<Vec<_>, RunError>>()?;

    let results = SweepResults::ranked(entries);
    if let Some(best) = results.best() {
        info!(
            best = %best.label,
            risk_level = %best.risk_level,
            sharpe = best.metrics.sharpe_ratio,
            "sweep finished"
        );
    }
    Ok(results)
}
