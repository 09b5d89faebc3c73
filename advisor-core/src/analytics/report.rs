//! Metrics grouped into display sections.
//!
//! Formatting only; rendering to a terminal or file is the caller's job.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::metrics::{PortfolioAnalytics, PortfolioMetrics};

/// One labelled, pre-formatted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub metric: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub rows: Vec<ReportRow>,
}

impl ReportSection {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    fn row(mut self, metric: &str, value: String) -> Self {
        self.rows.push(ReportRow {
            metric: metric.to_string(),
            value,
        });
        self
    }

    /// Look up a formatted value by metric label.
    pub fn value(&self, metric: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| r.value.as_str())
    }
}

/// Returns, risk, and trading sections for one metrics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub observations: usize,
    pub risk_free_rate: f64,
    pub sections: Vec<ReportSection>,
}

impl AnalyticsReport {
    pub fn section(&self, title: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Render as Markdown tables, one per section.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "## Performance analytics ({} observations, risk-free {})\n",
            self.observations,
            pct(self.risk_free_rate)
        );
        for section in &self.sections {
            let _ = writeln!(out, "### {}\n", section.title);
            out.push_str("| Metric | Value |\n|---|---:|\n");
            for row in &section.rows {
                let _ = writeln!(out, "| {} | {} |", row.metric, row.value);
            }
            out.push('\n');
        }
        out
    }
}

impl PortfolioAnalytics {
    /// Group `metrics` into formatted sections.
    pub fn generate_report(&self, metrics: &PortfolioMetrics) -> AnalyticsReport {
        let returns = ReportSection::new("Returns")
            .row("Total return", pct(metrics.total_return))
            .row("Annualized return", pct(metrics.annualized_return))
            .row("Volatility", pct(metrics.volatility))
            .row("Sharpe ratio", num(metrics.sharpe_ratio))
            .row("Sortino ratio", num(metrics.sortino_ratio))
            .row("Calmar ratio", num(metrics.calmar_ratio));

        let risk = ReportSection::new("Risk")
            .row("Max drawdown", pct(metrics.max_drawdown))
            .row("VaR (95%)", pct(metrics.var_95))
            .row("CVaR (95%)", pct(metrics.cvar_95))
            .row("Beta", num(metrics.beta))
            .row("Alpha", pct(metrics.alpha))
            .row("Information ratio", num(metrics.information_ratio));

        let trading = ReportSection::new("Trading")
            .row("Win rate", pct(metrics.win_rate))
            .row("Profit factor", num(metrics.profit_factor))
            .row("Average win", pct(metrics.avg_win))
            .row("Average loss", pct(metrics.avg_loss))
            .row("Max consecutive wins", metrics.max_consecutive_wins.to_string())
            .row("Max consecutive losses", metrics.max_consecutive_losses.to_string());

        AnalyticsReport {
            observations: metrics.observations,
            risk_free_rate: self.risk_free_rate,
            sections: vec![returns, risk, trading],
        }
    }
}

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn num(v: f64) -> String {
    if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{v:.2}")
    }
}
