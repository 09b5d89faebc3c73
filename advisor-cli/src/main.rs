//! Advisor CLI: backtests, sweeps, position sizing, and synthetic data.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file and save artifacts
//! - `sweep`: run a parameter grid in parallel and rank by Sharpe ratio
//! - `size`: risk-based position size, stop, and take-profit for one trade
//! - `generate`: write deterministic synthetic CSV bars for demos

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use advisor_core::risk::{RiskLevel, RiskManager, DEFAULT_RISK_REWARD};
use advisor_core::strategy::StrategySpec;
use advisor_runner::data_loader::{csv_path, generate_synthetic_bars, write_csv_series};
use advisor_runner::export::{export_sweep_csv, save_artifacts};
use advisor_runner::{
    load_bars, run_single_backtest, run_sweep, BacktestConfig, LoadOptions, RunOutput, SweepGrid,
};

#[derive(Parser)]
#[command(name = "advisor", about = "Advisor CLI: risk-aware daily backtesting")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Sweep strategy parameters and risk levels over the config's data.
    Sweep {
        /// Path to a TOML config file; its strategy type selects the grid.
        #[arg(long)]
        config: PathBuf,

        /// MA crossover short periods.
        #[arg(long, value_delimiter = ',', default_value = "5,10,20")]
        short: Vec<usize>,

        /// MA crossover long periods.
        #[arg(long, value_delimiter = ',', default_value = "50,100,200")]
        long: Vec<usize>,

        /// ATR breakout lookbacks.
        #[arg(long, value_delimiter = ',', default_value = "10,20,55")]
        lookback: Vec<usize>,

        /// ATR breakout ATR periods.
        #[arg(long, value_delimiter = ',', default_value = "14")]
        atr_period: Vec<usize>,

        /// Number of ranked entries to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Write the full ranking as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Size one trade from entry price, stop, and portfolio value.
    Size {
        #[arg(long)]
        price: f64,

        #[arg(long)]
        stop: f64,

        #[arg(long)]
        portfolio_value: f64,

        /// conservative, moderate, or aggressive.
        #[arg(long, default_value = "moderate")]
        risk_level: RiskLevel,

        /// Annualized volatility of the instrument, e.g. 0.35.
        #[arg(long)]
        volatility: Option<f64>,
    },
    /// Write synthetic daily bars as `<SYMBOL>.csv` files.
    Generate {
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,

        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { config, output_dir } => run_backtest_cmd(&config, &output_dir),
        Commands::Sweep {
            config,
            short,
            long,
            lookback,
            atr_period,
            top,
            csv,
        } => run_sweep_cmd(&config, &short, &long, &lookback, &atr_period, top, csv.as_deref()),
        Commands::Size {
            price,
            stop,
            portfolio_value,
            risk_level,
            volatility,
        } => run_size(price, stop, portfolio_value, risk_level, volatility),
        Commands::Generate {
            symbols,
            start,
            end,
            out_dir,
        } => run_generate(&symbols, start, end, &out_dir),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_backtest_cmd(config_path: &Path, output_dir: &Path) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    let output = run_single_backtest(&config)?;

    print_summary(&output);

    let run_dir = save_artifacts(&output, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_sweep_cmd(
    config_path: &Path,
    shorts: &[usize],
    longs: &[usize],
    lookbacks: &[usize],
    atr_periods: &[usize],
    top: usize,
    csv_out: Option<&Path>,
) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    let grid = match config.strategy {
        StrategySpec::MaCrossover { shares, .. } => SweepGrid::ma_crossover(shorts, longs, shares),
        StrategySpec::AtrBreakout { .. } => SweepGrid::atr_breakout(lookbacks, atr_periods),
        StrategySpec::BuyAndHold { .. } => bail!("buy_and_hold has no parameters to sweep"),
    };
    if grid.size() == 0 {
        bail!("sweep grid is empty (every short period >= every long period?)");
    }

    let opts = LoadOptions {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        synthetic: config.data.synthetic,
    };
    let loaded = load_bars(&config.all_symbols(), config.data.dir.as_deref(), &opts)?;
    let results = run_sweep(&config, &grid, &loaded.market)?;

    println!(
        "{:>4}  {:<40} {:<13} {:>10} {:>8} {:>9} {:>6}",
        "rank", "strategy", "risk", "return", "sharpe", "max dd", "fills"
    );
    for (i, e) in results.top_n(top).iter().enumerate() {
        println!(
            "{:>4}  {:<40} {:<13} {:>9.2}% {:>8.2} {:>8.2}% {:>6}",
            i + 1,
            e.label,
            e.risk_level,
            e.metrics.total_return * 100.0,
            e.metrics.sharpe_ratio,
            e.metrics.max_drawdown * 100.0,
            e.fills,
        );
    }
    if loaded.has_synthetic {
        println!("(synthetic data)");
    }

    if let Some(path) = csv_out {
        std::fs::write(path, export_sweep_csv(&results)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Ranking saved to: {}", path.display());
    }
    Ok(())
}

fn run_size(
    price: f64,
    stop: f64,
    portfolio_value: f64,
    level: RiskLevel,
    volatility: Option<f64>,
) -> Result<()> {
    if stop >= price {
        bail!("stop {stop} must be below entry price {price} for a long position");
    }
    let rm = RiskManager::with_level(level);
    let shares = rm.calculate_position_size(price, stop, portfolio_value, volatility);
    let target = rm.calculate_take_profit(price, stop, DEFAULT_RISK_REWARD);
    let risk = shares as f64 * (price - stop);

    println!("Risk level:   {level}");
    println!("Shares:       {shares}");
    println!("Position:     {:.2}", shares as f64 * price);
    println!(
        "At risk:      {:.2} ({:.3}% of portfolio)",
        risk,
        risk / portfolio_value * 100.0
    );
    println!("Take profit:  {target:.2} ({DEFAULT_RISK_REWARD}:1)");
    Ok(())
}

fn run_generate(
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    out_dir: &Path,
) -> Result<()> {
    if start > end {
        bail!("--start {start} is after --end {end}");
    }
    for symbol in symbols {
        let series = generate_synthetic_bars(symbol, start, end)?;
        let path = csv_path(out_dir, symbol);
        write_csv_series(&path, &series)?;
        println!("{symbol}: {} bars -> {}", series.len(), path.display());
    }
    Ok(())
}

fn print_summary(output: &RunOutput) {
    let report = output.result.report();
    let s = &report.summary;
    let r = &report.risk_metrics;
    let t = &report.trading_metrics;

    println!("=== {} ===", s.strategy);
    println!("Run id:        {}", output.run_id);
    println!("Period:        {} to {} ({} days)", s.start_date, s.end_date, s.trading_days);
    println!("Final value:   {:.2} (from {:.2})", s.final_value, s.initial_capital);
    println!("Total return:  {:.2}%", s.total_return * 100.0);
    println!("Sharpe:        {:.2}", r.sharpe_ratio);
    println!("Sortino:       {:.2}", r.sortino_ratio);
    println!("Max drawdown:  {:.2}%", r.max_drawdown * 100.0);
    println!("VaR 95:        {:.2}%", r.var_95 * 100.0);
    println!(
        "Fills:         {} ({} rejected), {} closed trades",
        t.total_fills, t.rejected_intents, t.closed_trades
    );
    println!(
        "Costs:         {:.2} commission, {:.2} slippage",
        t.total_commission, t.total_slippage
    );
    if output.has_synthetic {
        println!("Data:          SYNTHETIC");
    }
    for w in &output.result.warnings {
        println!("Warning:       {w}");
    }
}
