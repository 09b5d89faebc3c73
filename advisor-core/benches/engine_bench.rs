//! Criterion benchmarks for the advisor hot paths.
//!
//! Benchmarks:
//! 1. Day loop (full backtest over one and ten symbols)
//! 2. Portfolio analytics (full metrics, rolling metrics)
//! 3. Risk manager (sizing, portfolio aggregation)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

use advisor_core::analytics::PortfolioAnalytics;
use advisor_core::domain::{Bar, BarSeries, MarketData};
use advisor_core::engine::{BacktestEngine, EngineConfig};
use advisor_core::risk::{RiskLevel, RiskManager};
use advisor_core::strategy::{AtrBreakout, BuyAndHold, MaCrossover};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(symbol: &str, n: usize, offset: f64) -> BarSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + offset + (i as f64 * 0.1).sin() * 10.0;
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                close - 0.3,
                close + 1.5,
                close - 1.5,
                close,
                1_000_000.0,
            )
        })
        .collect();
    BarSeries::new(symbol, bars).unwrap()
}

fn make_data(n: usize, num_symbols: usize) -> MarketData {
    (0..num_symbols)
        .map(|si| make_series(&format!("SYM{si}"), n, si as f64 * 10.0))
        .collect()
}

fn make_returns(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i as f64 * 0.37).sin() * 0.02).collect()
}

fn range() -> (chrono::NaiveDate, chrono::NaiveDate) {
    (
        chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
    )
}

// ── 1. Day Loop ──────────────────────────────────────────────────────

fn bench_day_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("day_loop");
    let engine = BacktestEngine::new(EngineConfig::default()).unwrap();
    let (start, end) = range();

    for &days in &[252, 1260, 2520] {
        let data = make_data(days, 1);
        let strategy = MaCrossover::new(10, 50, 100).unwrap();
        group.bench_with_input(BenchmarkId::new("ma_crossover", days), &days, |b, _| {
            b.iter(|| engine.run(&strategy, black_box(&data), start, end));
        });
    }

    // Multi-symbol benchmark (the realistic case)
    let data_10 = make_data(1260, 10);
    let breakout = AtrBreakout::new(20, 14, RiskLevel::Moderate).unwrap();
    group.bench_function("atr_breakout_10_symbols_1260_days", |b| {
        b.iter(|| engine.run(&breakout, black_box(&data_10), start, end));
    });
    group.bench_function("buy_and_hold_10_symbols_1260_days", |b| {
        b.iter(|| engine.run(&BuyAndHold::new(10), black_box(&data_10), start, end));
    });

    group.finish();
}

// ── 2. Analytics ─────────────────────────────────────────────────────

fn bench_analytics(c: &mut Criterion) {
    let mut group = c.benchmark_group("analytics");
    let analytics = PortfolioAnalytics::default();

    for &n in &[252, 2520] {
        let returns = make_returns(n);
        let bench = make_returns(n + 7);
        group.bench_with_input(BenchmarkId::new("portfolio_metrics", n), &n, |b, _| {
            b.iter(|| {
                analytics.calculate_portfolio_metrics(black_box(&returns), Some(black_box(&bench)))
            });
        });
        group.bench_with_input(BenchmarkId::new("rolling_63", n), &n, |b, _| {
            b.iter(|| analytics.calculate_rolling_metrics(black_box(&returns), 63));
        });
    }

    group.finish();
}

// ── 3. Risk Manager ──────────────────────────────────────────────────

fn bench_risk(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_manager");
    let rm = RiskManager::default();

    group.bench_function("position_size", |b| {
        b.iter(|| {
            rm.calculate_position_size(black_box(100.0), black_box(95.0), 1_000_000.0, Some(0.3))
        });
    });

    let positions: Vec<_> = (0..50)
        .map(|i| {
            let price = 50.0 + i as f64;
            rm.analyze_position_risk(
                &format!("SYM{i}"),
                100,
                price,
                price * 1.02,
                price * 0.95,
                1_000_000.0,
            )
        })
        .collect();
    let sectors: HashMap<String, String> = (0..50)
        .map(|i| (format!("SYM{i}"), format!("sector{}", i % 7)))
        .collect();
    let returns: HashMap<String, Vec<f64>> = (0..50)
        .map(|i| (format!("SYM{i}"), make_returns(252 + i)))
        .collect();

    group.bench_function("portfolio_risk_50", |b| {
        b.iter(|| rm.analyze_portfolio_risk(black_box(&positions), 1_000_000.0, Some(&sectors)));
    });
    group.bench_function("portfolio_risk_pearson_50", |b| {
        b.iter(|| {
            rm.analyze_portfolio_risk_with_returns(
                black_box(&positions),
                1_000_000.0,
                Some(&sectors),
                &returns,
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_day_loop, bench_analytics, bench_risk);
criterion_main!(benches);
