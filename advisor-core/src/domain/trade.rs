//! A completed round trip, from first buy to the sell that flattens it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A complete round-trip trade: entry → exit.
///
/// Scaled entries and partial exits collapse into one record with
/// quantity-weighted average prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    // ── Identification ──
    pub symbol: String,

    // ── Dates ──
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,

    // ── Size and prices ──
    pub quantity: u64,
    pub avg_entry_price: f64,
    pub avg_exit_price: f64,

    // ── PnL ──
    /// `(avg_exit - avg_entry) * quantity`, before commission.
    pub gross_pnl: f64,
    /// Entry and exit commission combined.
    pub commission: f64,
    pub net_pnl: f64,

    // ── Duration ──
    pub holding_days: i64,
}

impl ClosedTrade {
    /// Net P&L as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        let cost = self.avg_entry_price * self.quantity as f64;
        if cost == 0.0 {
            return 0.0;
        }
        self.net_pnl / cost
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}
