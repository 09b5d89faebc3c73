//! End-to-end runner tests: config file → CSV data → engine → artifacts.
//!
//! Tests:
//! 1. Config loads from disk and rejects bad files
//! 2. CSV written by the exporter loads back bar-for-bar
//! 3. A run from CSV matches a run from the same data in memory, and the
//!    benchmark is measured but never traded
//! 4. Sweeps are deterministic and ranked by Sharpe
//! 5. Artifact bundle contains every export

use std::path::Path;

use chrono::NaiveDate;
use tempfile::TempDir;

use advisor_core::domain::{Bar, BarSeries, MarketData};
use advisor_core::risk::RiskLevel;
use advisor_runner::config::{BacktestConfig, ConfigError};
use advisor_runner::data_loader::{
    csv_path, generate_synthetic_bars, load_bars, load_csv_series, write_csv_series, DataSource,
    LoadError, LoadOptions,
};
use advisor_runner::export::{
    export_equity_csv, export_fills_csv, export_sweep_csv, save_artifacts,
};
use advisor_runner::runner::{run_backtest_from_data, run_single_backtest, RunError};
use advisor_runner::sweep::{run_sweep, SweepGrid};

// ── Helpers ──────────────────────────────────────────────────────────

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn config_text(dir: &Path, strategy: &str) -> String {
    format!(
        r#"
[backtest]
start_date = "2024-01-01"
end_date = "2024-12-31"
initial_capital = 100000.0
commission_rate = 0.001
slippage_rate = 0.0005

[strategy]
{strategy}

[data]
symbols = ["SPY"]
dir = "{}"
"#,
        dir.display()
    )
}

const BUY_AND_HOLD: &str = r#"type = "buy_and_hold"
shares_per_symbol = 50"#;

/// Helper: write a synthetic SPY series for 2024 into `dir`.
fn seed_csv(dir: &Path) -> BarSeries {
    let series = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 12, 31)).unwrap();
    write_csv_series(&csv_path(dir, "SPY"), &series).unwrap();
    series
}

fn synthetic_config() -> BacktestConfig {
    BacktestConfig::from_toml(
        r#"
[backtest]
start_date = "2023-01-02"
end_date = "2023-12-29"

[strategy]
type = "ma_crossover"
short_period = 5
long_period = 20
shares = 100

[data]
symbols = ["SPY", "QQQ"]
synthetic = true
"#,
    )
    .unwrap()
}

// ── 1. Config from disk ──────────────────────────────────────────────

#[test]
fn config_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("run.toml");
    std::fs::write(&path, config_text(tmp.path(), BUY_AND_HOLD)).unwrap();

    let config = BacktestConfig::from_file(&path).unwrap();
    assert_eq!(config.data.symbols, vec!["SPY".to_string()]);
    assert_eq!(config.data.dir.as_deref(), Some(tmp.path()));
    assert_eq!(config.risk.level, RiskLevel::Moderate);
}

#[test]
fn config_errors_are_typed() {
    let tmp = TempDir::new().unwrap();
    let missing = BacktestConfig::from_file(&tmp.path().join("nope.toml"));
    assert!(matches!(missing, Err(ConfigError::Io { .. })));

    let path = tmp.path().join("bad.toml");
    std::fs::write(&path, "[backtest\nstart_date = 1").unwrap();
    assert!(matches!(
        BacktestConfig::from_file(&path),
        Err(ConfigError::Parse(_))
    ));
}

// ── 2. CSV round trip ────────────────────────────────────────────────

#[test]
fn csv_written_series_loads_back() {
    let tmp = TempDir::new().unwrap();
    let series = seed_csv(tmp.path());
    let loaded = load_csv_series(&csv_path(tmp.path(), "SPY"), "SPY").unwrap();
    assert_eq!(loaded.len(), series.len());
    for (a, b) in loaded.bars().iter().zip(series.bars()) {
        assert_eq!(a.date, b.date);
        assert!((a.close - b.close).abs() < 1e-9);
        assert!((a.volume - b.volume).abs() < 1e-9);
    }
}

#[test]
fn csv_rows_may_be_unsorted() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("AAA.csv");
    std::fs::write(
        &path,
        "date,open,high,low,close,volume\n\
         2024-01-03,11,12,10,11.5,1000\n\
         2024-01-02,10,11,9,10.5,1000\n",
    )
    .unwrap();
    let series = load_csv_series(&path, "AAA").unwrap();
    assert_eq!(series.first_date(), Some(d(2024, 1, 2)));
    assert_eq!(series.last_date(), Some(d(2024, 1, 3)));
}

#[test]
fn csv_duplicate_dates_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("AAA.csv");
    std::fs::write(
        &path,
        "date,open,high,low,close,volume\n\
         2024-01-02,10,11,9,10.5,1000\n\
         2024-01-02,10,11,9,10.5,1000\n",
    )
    .unwrap();
    assert!(matches!(
        load_csv_series(&path, "AAA"),
        Err(LoadError::InvalidBars(_))
    ));
}

#[test]
fn csv_malformed_row_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("AAA.csv");
    std::fs::write(&path, "date,open,high,low,close,volume\nnot-a-date,1,1,1,1,1\n").unwrap();
    assert!(matches!(
        load_csv_series(&path, "AAA"),
        Err(LoadError::Csv { .. })
    ));
}

#[test]
fn csv_preferred_over_synthetic() {
    let tmp = TempDir::new().unwrap();
    seed_csv(tmp.path());
    let opts = LoadOptions {
        start: d(2024, 1, 1),
        end: d(2024, 12, 31),
        synthetic: true,
    };
    let loaded = load_bars(
        &["SPY".to_string(), "QQQ".to_string()],
        Some(tmp.path()),
        &opts,
    )
    .unwrap();
    assert_eq!(loaded.sources["SPY"], DataSource::Csv);
    assert_eq!(loaded.sources["QQQ"], DataSource::Synthetic);
    assert!(loaded.has_synthetic);
    assert_eq!(loaded.market.len(), 2);
}

// ── 3. Runs from CSV ─────────────────────────────────────────────────

#[test]
fn csv_run_matches_in_memory_run() {
    let tmp = TempDir::new().unwrap();
    let series = seed_csv(tmp.path());
    let config = BacktestConfig::from_toml(&config_text(tmp.path(), BUY_AND_HOLD)).unwrap();

    let from_disk = run_single_backtest(&config).unwrap();
    let market = MarketData::new().with_series(series);
    let in_memory = run_backtest_from_data(&config, &market).unwrap();

    assert!(!from_disk.has_synthetic);
    assert_eq!(from_disk.run_id, in_memory.run_id);
    assert_eq!(from_disk.result.fills.len(), 1);
    assert_eq!(from_disk.result.equity_curve.len(), in_memory.result.equity_curve.len());
    let a = from_disk.result.final_value();
    let b = in_memory.result.final_value();
    assert!((a - b).abs() < 1e-6, "{a} vs {b}");
}

#[test]
fn run_outside_data_range_is_no_data() {
    let tmp = TempDir::new().unwrap();
    let bars = vec![Bar::new(d(2020, 1, 2), 10.0, 11.0, 9.0, 10.5, 1000.0)];
    write_csv_series(
        &csv_path(tmp.path(), "SPY"),
        &BarSeries::new("SPY", bars).unwrap(),
    )
    .unwrap();
    let config = BacktestConfig::from_toml(&config_text(tmp.path(), BUY_AND_HOLD)).unwrap();
    assert!(matches!(
        run_single_backtest(&config),
        Err(RunError::NoData { .. })
    ));
}

#[test]
fn benchmark_is_measured_but_never_traded() {
    let config = BacktestConfig::from_toml(
        r#"
[backtest]
start_date = "2024-01-01"
end_date = "2024-06-28"
benchmark = "SPY"

[strategy]
type = "buy_and_hold"
shares_per_symbol = 10

[data]
symbols = ["QQQ"]
synthetic = true
"#,
    )
    .unwrap();

    let out = run_single_backtest(&config).unwrap();
    let result = &out.result;
    let symbols: Vec<&str> = result.fills.iter().map(|f| f.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["QQQ"]);
    assert!(result.open_positions.iter().all(|p| p.symbol == "QQQ"));
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    // The calendar is QQQ's alone and the benchmark lines up with it.
    let qqq = generate_synthetic_bars("QQQ", d(2024, 1, 1), d(2024, 6, 28)).unwrap();
    assert_eq!(result.trading_days(), qqq.len());
    let bench = result.benchmark_returns.as_ref().unwrap();
    assert_eq!(bench.len(), result.returns.len());

    // The same sweep point trades identically with or without a benchmark.
    let grid = SweepGrid::ma_crossover(&[5], &[20], 10);
    let mut sweep_config = config.clone();
    sweep_config.strategy = grid.strategies[0].clone();
    let with_spy: MarketData = ["QQQ", "SPY"]
        .iter()
        .map(|s| generate_synthetic_bars(s, d(2024, 1, 1), d(2024, 6, 28)).unwrap())
        .collect();
    let measured = run_sweep(&sweep_config, &grid, &with_spy).unwrap();
    sweep_config.backtest.benchmark = None;
    let plain = run_sweep(&sweep_config, &grid, &MarketData::new().with_series(qqq)).unwrap();
    let (a, b) = (&measured.entries()[0], &plain.entries()[0]);
    assert_eq!(a.fills, b.fills);
    assert!((a.final_value - b.final_value).abs() < 1e-9);
}

// ── 4. Sweeps ────────────────────────────────────────────────────────

#[test]
fn sweep_is_deterministic_and_ranked() {
    let config = synthetic_config();
    let data: MarketData = ["SPY", "QQQ"]
        .iter()
        .map(|s| generate_synthetic_bars(s, d(2023, 1, 2), d(2023, 12, 29)).unwrap())
        .collect();
    let grid = SweepGrid::ma_crossover(&[5, 10], &[20, 40], 100)
        .with_risk_levels(vec![RiskLevel::Conservative, RiskLevel::Aggressive]);
    assert_eq!(grid.size(), 8);

    let first = run_sweep(&config, &grid, &data).unwrap();
    let second = run_sweep(&config, &grid, &data).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 8);

    let sharpes: Vec<f64> = first.entries().iter().map(|e| e.metrics.sharpe_ratio).collect();
    assert!(sharpes.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(first.best(), first.entries().first());
    assert_eq!(first.top_n(3).len(), 3);

    let csv = export_sweep_csv(&first).unwrap();
    assert_eq!(csv.lines().count(), 9);
    assert!(csv.starts_with("rank,strategy,risk_level"));
}

#[test]
fn sweep_on_empty_data_fails() {
    let grid = SweepGrid::ma_crossover(&[5], &[20], 10);
    let err = run_sweep(&synthetic_config(), &grid, &MarketData::new()).unwrap_err();
    assert!(matches!(err, RunError::NoData { .. }));
}

// ── 5. Artifacts ─────────────────────────────────────────────────────

#[test]
fn artifacts_bundle_every_export() {
    let tmp = TempDir::new().unwrap();
    let output = run_single_backtest(&synthetic_config()).unwrap();
    assert!(output.has_synthetic);

    let dir = save_artifacts(&output, tmp.path()).unwrap();
    let name = dir.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("ma_crossover_"));
    assert!(name.ends_with(&output.run_id[..12]));

    for file in [
        "result.json",
        "report.json",
        "report.md",
        "equity.csv",
        "fills.csv",
        "trades.csv",
    ] {
        assert!(dir.join(file).exists(), "missing {file}");
    }

    let equity = std::fs::read_to_string(dir.join("equity.csv")).unwrap();
    assert_eq!(equity.lines().count(), output.result.equity_curve.len() + 1);
    assert_eq!(equity, export_equity_csv(&output.result.equity_curve).unwrap());

    let fills = std::fs::read_to_string(dir.join("fills.csv")).unwrap();
    assert_eq!(fills, export_fills_csv(&output.result.fills).unwrap());

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("report.json")).unwrap()).unwrap();
    assert_eq!(
        report["summary"]["trading_days"].as_u64(),
        Some(output.result.equity_curve.len() as u64)
    );

    let md = std::fs::read_to_string(dir.join("report.md")).unwrap();
    assert!(md.starts_with("# Backtest Report"));
    assert!(md.contains("**synthetic**"));
    assert!(md.contains("### Risk"));
}
