//! Domain types for the backtester, risk manager, and analytics.

pub mod bar;
pub mod equity;
pub mod fill;
pub mod market;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod trade;

pub use bar::{Bar, BarError};
pub use equity::{simple_returns, EquityPoint};
pub use fill::FilledOrder;
pub use market::{BarSeries, MarketData, MarketView};
pub use order::{OrderIntent, OrderQuantity, OrderSide, RejectReason, RejectedIntent};
pub use portfolio::Portfolio;
pub use position::Position;
pub use trade::ClosedTrade;

/// Symbol type alias
pub type Symbol = String;
