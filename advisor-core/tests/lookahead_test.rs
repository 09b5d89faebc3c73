//! Look-ahead contamination tests.
//!
//! Invariant: nothing a strategy sees on date t may depend on bars dated
//! after t.
//!
//! Method: run on a truncated dataset (first 100 days) and on the full dataset
//! (200 days). The first 100 equity points, fills, and decisions must be
//! identical. Any difference means future bars leaked into past decisions.

use chrono::NaiveDate;

use advisor_core::domain::{Bar, BarSeries, MarketData};
use advisor_core::engine::{BacktestEngine, EngineConfig};
use advisor_core::risk::RiskLevel;
use advisor_core::strategy::{strategy_fn, AtrBreakout, MaCrossover, Strategy};

/// Generate N bars of synthetic OHLCV data with realistic variation.
fn make_test_bars(n: usize, phase: u64) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64 + phase)
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let change = ((seed >> 33) % 200) as f64 * 0.05 - 5.0;
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        let high = open.max(close) + 2.0;
        let low = open.min(close) - 2.0;
        bars.push(Bar::new(
            base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            1_000.0 + i as f64 * 100.0,
        ));
    }
    bars
}

fn dataset(n: usize) -> MarketData {
    vec![
        BarSeries::new("AAA", make_test_bars(n, 0)).unwrap(),
        BarSeries::new("BBB", make_test_bars(n, 7)).unwrap(),
    ]
    .into_iter()
    .collect()
}

fn assert_no_lookahead(strategy: &dyn Strategy, truncated_len: usize) {
    let engine = BacktestEngine::new(EngineConfig::default()).unwrap();
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

    let truncated = engine.run(strategy, &dataset(truncated_len), start, end);
    let full = engine.run(strategy, &dataset(truncated_len * 2), start, end);

    assert_eq!(truncated.equity_curve.len(), truncated_len);
    assert_eq!(
        truncated.equity_curve[..],
        full.equity_curve[..truncated_len],
        "{}: equity diverged within the shared prefix",
        strategy.name()
    );

    let cutoff = truncated.equity_curve[truncated_len - 1].date;
    let full_prefix: Vec<_> = full.fills.iter().filter(|f| f.filled_at <= cutoff).collect();
    assert_eq!(
        truncated.fills.iter().collect::<Vec<_>>(),
        full_prefix,
        "{}: fills diverged within the shared prefix",
        strategy.name()
    );
}

#[test]
fn ma_crossover_no_lookahead() {
    let strategy = MaCrossover::new(5, 20, 100).unwrap();
    assert_no_lookahead(&strategy, 100);
}

#[test]
fn atr_breakout_no_lookahead() {
    for level in RiskLevel::ALL {
        let strategy = AtrBreakout::new(20, 14, level).unwrap();
        assert_no_lookahead(&strategy, 100);
    }
}

#[test]
fn view_never_exposes_future_bars() {
    let data = dataset(60);
    let engine = BacktestEngine::new(EngineConfig::default()).unwrap();
    let probe = strategy_fn(|date, market, _| {
        for symbol in market.symbols() {
            let history = market.history(symbol);
            assert!(history.iter().all(|b| b.date <= date));
            assert_eq!(market.latest(symbol).map(|b| b.date), Some(date));
            assert_eq!(market.closes(symbol).len(), history.len());
        }
        Vec::new()
    });
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let result = engine.run(&probe, &data, start, end);
    assert_eq!(result.equity_curve.len(), 60);
}
