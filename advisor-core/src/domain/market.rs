//! Market data containers: per-symbol bar series, the multi-symbol dataset,
//! and the date-truncated view handed to strategies.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::bar::{Bar, BarError};

/// Ordered bars for a single symbol.
///
/// Dates are unique and strictly increasing; construction enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series from bars that are already in date order.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        let symbol = symbol.into();
        for bar in &bars {
            bar.validate(&symbol)?;
        }
        for pair in bars.windows(2) {
            let (prev, next) = (pair[0].date, pair[1].date);
            if next == prev {
                return Err(BarError::DuplicateDate { symbol, date: next });
            }
            if next < prev {
                return Err(BarError::OutOfOrder {
                    symbol,
                    previous: prev,
                    date: next,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    /// Build a series from bars in any order. Duplicated dates are still rejected.
    pub fn from_unsorted(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Result<Self, BarError> {
        bars.sort_by_key(|b| b.date);
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// The bar dated exactly `date`, if the symbol traded that day.
    pub fn bar_on(&self, date: NaiveDate) -> Option<&Bar> {
        self.bars
            .binary_search_by_key(&date, |b| b.date)
            .ok()
            .map(|i| &self.bars[i])
    }

    /// All bars dated on or before `date`.
    pub fn up_to(&self, date: NaiveDate) -> &[Bar] {
        let end = self.bars.partition_point(|b| b.date <= date);
        &self.bars[..end]
    }

    /// The most recent bar strictly before `date`.
    pub fn last_before(&self, date: NaiveDate) -> Option<&Bar> {
        let end = self.bars.partition_point(|b| b.date < date);
        end.checked_sub(1).map(|i| &self.bars[i])
    }
}

/// Multi-symbol historical dataset, keyed by symbol.
///
/// Owned by the caller; the engine only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketData {
    series: BTreeMap<String, BarSeries>,
}

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series, replacing (and returning) any previous series for the symbol.
    pub fn insert(&mut self, series: BarSeries) -> Option<BarSeries> {
        self.series.insert(series.symbol().to_string(), series)
    }

    pub fn with_series(mut self, series: BarSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<&BarSeries> {
        self.series.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BarSeries> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Sorted union of every bar date inside `[start, end]` across all symbols.
    ///
    /// This is the trading calendar for a run. Empty when `start > end`.
    pub fn calendar(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        if start > end {
            return Vec::new();
        }
        let dates: BTreeSet<NaiveDate> = self
            .series
            .values()
            .flat_map(|s| s.bars().iter().map(|b| b.date))
            .filter(|d| *d >= start && *d <= end)
            .collect();
        dates.into_iter().collect()
    }

    /// A read-only view of the data as it was known at the close of `date`.
    pub fn view_at(&self, date: NaiveDate) -> MarketView<'_> {
        MarketView { data: self, date }
    }
}

impl FromIterator<BarSeries> for MarketData {
    fn from_iter<I: IntoIterator<Item = BarSeries>>(iter: I) -> Self {
        let mut data = MarketData::new();
        for series in iter {
            data.insert(series);
        }
        data
    }
}

/// Market data truncated at the current simulated date.
///
/// Every accessor hides bars dated after `date()`, so a strategy holding a
/// view cannot see the future.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    data: &'a MarketData,
    date: NaiveDate,
}

impl<'a> MarketView<'a> {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn symbols(&self) -> impl Iterator<Item = &'a str> {
        self.data.symbols()
    }

    /// Bars for `symbol` up to and including the current date. Empty if unknown.
    pub fn history(&self, symbol: &str) -> &'a [Bar] {
        self.data
            .get(symbol)
            .map(|s| s.up_to(self.date))
            .unwrap_or(&[])
    }

    /// Most recent bar on or before the current date.
    pub fn latest(&self, symbol: &str) -> Option<&'a Bar> {
        self.history(symbol).last()
    }

    /// The bar for the current date, if the symbol traded today.
    pub fn bar_on(&self, symbol: &str) -> Option<&'a Bar> {
        self.data.get(symbol).and_then(|s| s.bar_on(self.date))
    }

    /// Closing prices up to and including the current date.
    pub fn closes(&self, symbol: &str) -> Vec<f64> {
        self.history(symbol).iter().map(|b| b.close).collect()
    }
}
