//! Order intents emitted by strategies, and the reasons an intent can go unfilled.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("buy"),
            OrderSide::Sell => f.write_str("sell"),
        }
    }
}

/// How many shares an intent asks for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderQuantity {
    /// An explicit whole-share count.
    Shares(u64),
    /// Let the risk manager size the order from the distance to `stop_price`.
    /// On a sell this resolves to the whole open position.
    RiskSized { stop_price: f64 },
    /// The entire open position (sells only).
    All,
}

/// An order a strategy wants filled today.
///
/// Ephemeral: consumed within the simulated day that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: OrderQuantity,
    /// Reference price; slippage is applied against this, not the bar.
    pub price: f64,
    pub timestamp: NaiveDate,
}

impl OrderIntent {
    pub fn buy(symbol: impl Into<String>, shares: u64, price: f64, timestamp: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Buy,
            quantity: OrderQuantity::Shares(shares),
            price,
            timestamp,
        }
    }

    pub fn sell(symbol: impl Into<String>, shares: u64, price: f64, timestamp: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Sell,
            quantity: OrderQuantity::Shares(shares),
            price,
            timestamp,
        }
    }

    /// A buy whose size is delegated to the risk manager.
    pub fn risk_sized_buy(
        symbol: impl Into<String>,
        price: f64,
        stop_price: f64,
        timestamp: NaiveDate,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Buy,
            quantity: OrderQuantity::RiskSized { stop_price },
            price,
            timestamp,
        }
    }

    /// Sell everything held in `symbol`.
    pub fn close_position(symbol: impl Into<String>, price: f64, timestamp: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Sell,
            quantity: OrderQuantity::All,
            price,
            timestamp,
        }
    }
}

/// Why an intent was skipped.
///
/// Skipping is a normal simulation outcome, not an error: the engine records
/// the reason and moves on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    InsufficientCash { required: f64, available: f64 },
    InsufficientShares { requested: u64, held: u64 },
    NoPosition,
    NoBarForDate,
    InvalidPrice,
    ZeroQuantity,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InsufficientCash {
                required,
                available,
            } => write!(f, "insufficient cash (required {required:.2}, available {available:.2})"),
            RejectReason::InsufficientShares { requested, held } => {
                write!(f, "insufficient shares (requested {requested}, held {held})")
            }
            RejectReason::NoPosition => f.write_str("no open position"),
            RejectReason::NoBarForDate => f.write_str("no bar for this date"),
            RejectReason::InvalidPrice => f.write_str("invalid reference price"),
            RejectReason::ZeroQuantity => f.write_str("zero quantity"),
        }
    }
}

/// An intent the engine declined to fill, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedIntent {
    pub date: NaiveDate,
    pub intent: OrderIntent,
    pub reason: RejectReason,
}
