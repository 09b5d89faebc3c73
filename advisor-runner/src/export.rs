//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full run output and the structured report
//! - **CSV**: equity curve, fills, closed trades, sweep rankings
//! - **Markdown**: human-readable single-run report
//!
//! Non-finite floats (an infinite profit factor) serialize as JSON `null`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use advisor_core::domain::{ClosedTrade, EquityPoint, FilledOrder};

use crate::runner::RunOutput;
use crate::sweep::SweepResults;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a run to pretty JSON.
pub fn export_json(output: &RunOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("failed to serialize run output to JSON")
}

/// Serialize the structured report of a run to pretty JSON.
pub fn export_report_json(output: &RunOutput) -> Result<String> {
    serde_json::to_string_pretty(&output.result.report())
        .context("failed to serialize backtest report to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: date, total_value, cash, positions_value
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "total_value", "cash", "positions_value"])?;
    for p in equity_curve {
        wtr.write_record([
            &p.date.to_string(),
            &format!("{:.2}", p.total_value),
            &format!("{:.2}", p.cash),
            &format!("{:.2}", p.positions_value),
        ])?;
    }
    finish_csv(wtr)
}

/// Export the fill history.
///
/// Columns: filled_at, timestamp, symbol, side, quantity, reference_price,
/// fill_price, commission, slippage_cost, realized_pnl
pub fn export_fills_csv(fills: &[FilledOrder]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "filled_at",
        "timestamp",
        "symbol",
        "side",
        "quantity",
        "reference_price",
        "fill_price",
        "commission",
        "slippage_cost",
        "realized_pnl",
    ])?;
    for f in fills {
        wtr.write_record([
            &f.filled_at.to_string(),
            &f.timestamp.to_string(),
            &f.symbol,
            &f.side.to_string(),
            &f.quantity.to_string(),
            &format!("{:.6}", f.reference_price),
            &format!("{:.6}", f.fill_price),
            &format!("{:.4}", f.commission),
            &format!("{:.4}", f.slippage_cost),
            &f.realized_pnl.map(|p| format!("{p:.4}")).unwrap_or_default(),
        ])?;
    }
    finish_csv(wtr)
}

/// Columns: symbol, entry_date, exit_date, quantity, avg_entry_price,
/// avg_exit_price, gross_pnl, commission, net_pnl, return_pct, holding_days
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "entry_date",
        "exit_date",
        "quantity",
        "avg_entry_price",
        "avg_exit_price",
        "gross_pnl",
        "commission",
        "net_pnl",
        "return_pct",
        "holding_days",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.symbol,
            &t.entry_date.to_string(),
            &t.exit_date.to_string(),
            &t.quantity.to_string(),
            &format!("{:.6}", t.avg_entry_price),
            &format!("{:.6}", t.avg_exit_price),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.net_pnl),
            &format!("{:.6}", t.return_pct()),
            &t.holding_days.to_string(),
        ])?;
    }
    finish_csv(wtr)
}

/// One row per grid point, best Sharpe first.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "strategy",
        "risk_level",
        "final_value",
        "total_return",
        "sharpe_ratio",
        "max_drawdown",
        "fills",
        "closed_trades",
        "run_id",
    ])?;
    for (i, e) in results.entries().iter().enumerate() {
        wtr.write_record([
            &(i + 1).to_string(),
            &e.label,
            e.risk_level.as_str(),
            &format!("{:.2}", e.final_value),
            &format!("{:.6}", e.metrics.total_return),
            &format!("{:.4}", e.metrics.sharpe_ratio),
            &format!("{:.6}", e.metrics.max_drawdown),
            &e.fills.to_string(),
            &e.closed_trades.to_string(),
            &e.run_id,
        ])?;
    }
    finish_csv(wtr)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(output: &RunOutput) -> String {
    let report = output.result.report();
    let s = &report.summary;
    let t = &report.trading_metrics;
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");
    md.push_str("| Field | Value |\n| --- | --- |\n");
    let _ = writeln!(md, "| Strategy | {} |", s.strategy);
    let _ = writeln!(md, "| Period | {} to {} |", s.start_date, s.end_date);
    let _ = writeln!(md, "| Trading days | {} |", s.trading_days);
    let _ = writeln!(md, "| Initial capital | {:.2} |", s.initial_capital);
    let _ = writeln!(md, "| Final value | {:.2} |", s.final_value);
    let _ = writeln!(md, "| Final cash | {:.2} |", s.final_cash);
    let _ = writeln!(md, "| Total return | {:.2}% |", s.total_return * 100.0);
    let _ = writeln!(md, "| Run id | `{}` |", output.run_id);
    let _ = writeln!(md, "| Dataset hash | `{}` |", output.dataset_hash);
    if output.has_synthetic {
        md.push_str("| Data | **synthetic** |\n");
    }
    md.push('\n');

    md.push_str("## Trading\n\n| Metric | Value |\n| --- | ---: |\n");
    let _ = writeln!(md, "| Fills | {} ({} buys, {} sells) |", t.total_fills, t.buys, t.sells);
    let _ = writeln!(md, "| Rejected intents | {} |", t.rejected_intents);
    let _ = writeln!(md, "| Commission | {:.2} |", t.total_commission);
    let _ = writeln!(md, "| Slippage | {:.2} |", t.total_slippage);
    let _ = writeln!(
        md,
        "| Closed trades | {} ({} winners) |",
        t.closed_trades, t.winning_trades
    );
    let _ = writeln!(md, "| Avg holding days | {:.1} |", t.avg_holding_days);
    let _ = writeln!(md, "| Open positions | {} |", t.open_positions);
    md.push('\n');

    md.push_str(&report.analytics.to_markdown());

    if !output.result.warnings.is_empty() {
        md.push_str("## Warnings\n\n");
        for w in &output.result.warnings {
            let _ = writeln!(md, "- {w}");
        }
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{strategy}_{run_id prefix}/` under `output_dir` containing:
/// - `result.json`: the full run output
/// - `report.json` and `report.md`
/// - `equity.csv`, `fills.csv`, `trades.csv`
///
/// Returns the path to the created directory.
pub fn save_artifacts(output: &RunOutput, output_dir: &Path) -> Result<PathBuf> {
    let prefix = output.run_id.get(..12).unwrap_or(&output.run_id);
    let run_dir = output_dir.join(format!("{}_{}", output.result.strategy, prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let files = [
        ("result.json", export_json(output)?),
        ("report.json", export_report_json(output)?),
        ("report.md", generate_report(output)),
        ("equity.csv", export_equity_csv(&output.result.equity_curve)?),
        ("fills.csv", export_fills_csv(&output.result.fills)?),
        ("trades.csv", export_trades_csv(&output.result.closed_trades)?),
    ];
    for (name, contents) in files {
        let path = run_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(run_dir)
}
