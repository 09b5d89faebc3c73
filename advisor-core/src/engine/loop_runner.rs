//! Day-by-day event loop driving a backtest.
//!
//! Four phases per trading date:
//! 1. Reprice: mark open positions at the date's close
//! 2. Signal: call the strategy with a view truncated at the date
//! 3. Fill: validate each intent, apply slippage and commission, update the portfolio
//! 4. Snapshot: append the end-of-day equity point

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::config::{EngineConfig, EngineError};
use super::cost_model::CostModel;
use super::portfolio_update::apply_fill;
use super::result::BacktestResult;
use super::state::SimulationState;
use super::trade_extraction::extract_trades;
use crate::analytics::PortfolioAnalytics;
use crate::domain::{
    simple_returns, BarSeries, FilledOrder, MarketData, MarketView, OrderIntent, OrderQuantity,
    OrderSide, RejectReason,
};
use crate::indicators::annualized_volatility;
use crate::risk::RiskManager;
use crate::strategy::Strategy;

/// A configured backtest engine.
///
/// `run` takes `&self` and builds fresh per-run state, so one engine can
/// serve any number of sequential or concurrent runs.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: EngineConfig,
    risk: RiskManager,
    costs: CostModel,
    analytics: PortfolioAnalytics,
}

impl BacktestEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            risk: RiskManager::new(config.risk_level, config.limits),
            costs: CostModel::new(config.commission_rate, config.slippage_rate),
            analytics: PortfolioAnalytics::new(config.risk_free_rate),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn risk_manager(&self) -> &RiskManager {
        &self.risk
    }

    pub fn analytics(&self) -> &PortfolioAnalytics {
        &self.analytics
    }

    /// Simulate `strategy` over every trading date in `[start, end]`.
    ///
    /// The benchmark, when configured, is read from `data`, so the strategy
    /// sees it like any other symbol. Use [`run_with_benchmark`] to keep it
    /// out of the traded market.
    ///
    /// An empty calendar (no data, no dates in range, or `start > end`)
    /// produces an empty result with neutral metrics and a warning.
    ///
    /// [`run_with_benchmark`]: Self::run_with_benchmark
    pub fn run(
        &self,
        strategy: &dyn Strategy,
        data: &MarketData,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BacktestResult {
        let benchmark = self.config.benchmark.as_deref().and_then(|s| data.get(s));
        self.run_with_benchmark(strategy, data, benchmark, start, end)
    }

    /// Simulate `strategy` on `data` and measure it against `benchmark`.
    ///
    /// Only `data` drives the calendar, repricing, and the strategy's view.
    /// The benchmark series is read for benchmark returns and nothing else.
    pub fn run_with_benchmark(
        &self,
        strategy: &dyn Strategy,
        data: &MarketData,
        benchmark: Option<&BarSeries>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BacktestResult {
        let calendar = data.calendar(start, end);
        let mut warnings = Vec::new();
        if data.is_empty() {
            warnings.push("no market data supplied".to_string());
        } else if start > end {
            warnings.push(format!("start date {start} is after end date {end}"));
        } else if calendar.is_empty() {
            warnings.push(format!("no trading dates between {start} and {end}"));
        }
        for w in &warnings {
            warn!(strategy = strategy.name(), "{w}");
        }

        info!(
            strategy = strategy.name(),
            %start,
            %end,
            trading_days = calendar.len(),
            symbols = data.len(),
            "backtest started"
        );

        let mut state = SimulationState::new(self.config.initial_capital);
        for &date in &calendar {
            state.reprice(data, date);

            let view = data.view_at(date);
            let intents = strategy.generate_orders(date, &view, &state.portfolio.positions);

            for intent in intents {
                match self.execute(&mut state, &view, date, &intent) {
                    Ok(fill) => {
                        debug!(
                            %date,
                            symbol = %fill.symbol,
                            side = %fill.side,
                            quantity = fill.quantity,
                            price = fill.fill_price,
                            commission = fill.commission,
                            "filled"
                        );
                        state.fills.push(fill);
                    }
                    Err(reason) => {
                        debug!(
                            %date,
                            symbol = %intent.symbol,
                            side = %intent.side,
                            %reason,
                            "intent skipped"
                        );
                        state.reject(date, intent, reason);
                    }
                }
            }

            state.record_equity(date);
        }

        let benchmark_returns = self.benchmark_returns(benchmark, &calendar, &mut warnings);
        let mut values = Vec::with_capacity(calendar.len() + 1);
        values.push(self.config.initial_capital);
        values.extend(state.equity_curve.iter().map(|p| p.total_value));
        let returns = if state.equity_curve.is_empty() {
            Vec::new()
        } else {
            simple_returns(&values)
        };
        let metrics = self
            .analytics
            .calculate_portfolio_metrics(&returns, benchmark_returns.as_deref());

        let result = BacktestResult {
            strategy: strategy.name().to_string(),
            config: self.config.clone(),
            start,
            end,
            closed_trades: extract_trades(&state.fills),
            open_positions: state.portfolio.positions.values().cloned().collect(),
            final_cash: state.portfolio.cash,
            equity_curve: state.equity_curve,
            fills: state.fills,
            rejected_intents: state.rejected,
            returns,
            benchmark_returns,
            metrics,
            warnings,
        };

        info!(
            strategy = %result.strategy,
            final_value = result.final_value(),
            fills = result.fills.len(),
            rejected = result.rejected_intents.len(),
            sharpe = result.metrics.sharpe_ratio,
            "backtest finished"
        );
        result
    }

    /// Validate one intent against today's state and fill it.
    fn execute(
        &self,
        state: &mut SimulationState,
        view: &MarketView<'_>,
        date: NaiveDate,
        intent: &OrderIntent,
    ) -> Result<FilledOrder, RejectReason> {
        let price = intent.price;
        if !price.is_finite() || price <= 0.0 {
            return Err(RejectReason::InvalidPrice);
        }
        if view.bar_on(&intent.symbol).is_none() {
            return Err(RejectReason::NoBarForDate);
        }

        let quantity = match intent.side {
            OrderSide::Buy => {
                let q = self.buy_quantity(state, view, intent);
                if q == 0 {
                    return Err(RejectReason::ZeroQuantity);
                }
                let required = self.costs.required_cash(q, price);
                if state.portfolio.cash < required {
                    return Err(RejectReason::InsufficientCash {
                        required,
                        available: state.portfolio.cash,
                    });
                }
                q
            }
            OrderSide::Sell => {
                let held = state.portfolio.held(&intent.symbol);
                if held == 0 {
                    return Err(RejectReason::NoPosition);
                }
                let q = match intent.quantity {
                    OrderQuantity::Shares(q) => q,
                    OrderQuantity::RiskSized { .. } | OrderQuantity::All => held,
                };
                if q == 0 {
                    return Err(RejectReason::ZeroQuantity);
                }
                if held < q {
                    return Err(RejectReason::InsufficientShares { requested: q, held });
                }
                q
            }
        };

        let (fill_price, slippage_cost) = self.costs.apply_slippage(price, intent.side, quantity);
        let mut fill = FilledOrder {
            symbol: intent.symbol.clone(),
            side: intent.side,
            quantity,
            reference_price: price,
            fill_price,
            commission: self.costs.commission(quantity, fill_price),
            slippage_cost,
            timestamp: intent.timestamp,
            filled_at: date,
            realized_pnl: None,
        };
        fill.realized_pnl = apply_fill(&fill, &mut state.portfolio);
        Ok(fill)
    }

    /// Resolve a buy intent's share count. Risk-sized buys are sized against
    /// the current total portfolio value.
    fn buy_quantity(
        &self,
        state: &SimulationState,
        view: &MarketView<'_>,
        intent: &OrderIntent,
    ) -> u64 {
        match intent.quantity {
            OrderQuantity::Shares(q) => q,
            OrderQuantity::All => 0,
            OrderQuantity::RiskSized { stop_price } => {
                let volatility = self
                    .config
                    .volatility_window
                    .and_then(|w| annualized_volatility(&view.closes(&intent.symbol), w));
                self.risk.calculate_position_size(
                    intent.price,
                    stop_price,
                    state.portfolio.total_value(),
                    volatility,
                )
            }
        }
    }

    /// Close-to-close returns of the benchmark series over `calendar`.
    ///
    /// Dates without a benchmark bar carry the last close forward (a zero
    /// return). The first return is measured from the last bar before the
    /// calendar, or is zero if there is none.
    fn benchmark_returns(
        &self,
        benchmark: Option<&BarSeries>,
        calendar: &[NaiveDate],
        warnings: &mut Vec<String>,
    ) -> Option<Vec<f64>> {
        let Some(series) = benchmark else {
            let symbol = self.config.benchmark.as_deref()?;
            let msg = format!("benchmark symbol {symbol} not found in market data");
            warn!("{msg}");
            warnings.push(msg);
            return None;
        };
        if calendar.is_empty() {
            return Some(Vec::new());
        }

        let mut prev = series.last_before(calendar[0]).map(|b| b.close);
        let returns = calendar
            .iter()
            .map(|&date| {
                let close = series.bar_on(date).map(|b| b.close).or(prev);
                let r = match (prev, close) {
                    (Some(p), Some(c)) if p > 0.0 => c / p - 1.0,
                    _ => 0.0,
                };
                prev = close;
                r
            })
            .collect();
        Some(returns)
    }
}
