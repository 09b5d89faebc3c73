//! One OHLCV record for one symbol on one trading date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar.
///
/// The symbol lives on the owning [`BarSeries`](super::BarSeries), not on the bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Structural problems found while building a bar series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("{symbol}: bar on {date} has a negative or non-finite price")]
    InvalidPrice { symbol: String, date: NaiveDate },
    #[error("{symbol}: bar on {date} has a negative or non-finite volume")]
    InvalidVolume { symbol: String, date: NaiveDate },
    #[error("{symbol}: duplicate bar for {date}")]
    DuplicateDate { symbol: String, date: NaiveDate },
    #[error("{symbol}: dates must be strictly increasing ({previous} followed by {date})")]
    OutOfOrder {
        symbol: String,
        previous: NaiveDate,
        date: NaiveDate,
    },
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// All four prices are finite and non-negative.
    pub fn has_valid_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p >= 0.0)
    }

    /// Check price and volume constraints for a bar belonging to `symbol`.
    pub fn validate(&self, symbol: &str) -> Result<(), BarError> {
        if !self.has_valid_prices() {
            return Err(BarError::InvalidPrice {
                symbol: symbol.to_string(),
                date: self.date,
            });
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(BarError::InvalidVolume {
                symbol: symbol.to_string(),
                date: self.date,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            100.0,
            105.0,
            98.0,
            103.0,
            50_000.0,
        )
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate("SPY").is_ok());
        assert_eq!(sample_bar().range(), 7.0);
    }

    #[test]
    fn negative_price_rejected() {
        let mut bar = sample_bar();
        bar.low = -1.0;
        assert!(matches!(
            bar.validate("SPY"),
            Err(BarError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn nan_close_rejected() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.has_valid_prices());
    }

    #[test]
    fn negative_volume_rejected() {
        let mut bar = sample_bar();
        bar.volume = -5.0;
        assert!(matches!(
            bar.validate("SPY"),
            Err(BarError::InvalidVolume { .. })
        ));
    }

    #[test]
    fn zero_prices_are_allowed() {
        let bar = Bar::new(sample_bar().date, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(bar.validate("DELISTED").is_ok());
    }
}
