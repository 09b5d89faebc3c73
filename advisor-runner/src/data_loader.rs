//! Bar loading and data resolution for the runner.
//!
//! Given a list of symbols, loads `<SYMBOL>.csv` files from the data
//! directory and returns a [`MarketData`]. Fallback policy:
//! 1. If a CSV file exists → use it
//! 2. If not and `synthetic` is enabled → generate synthetic bars (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only mode. Results produced on synthetic
//! data carry `has_synthetic = true`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use advisor_core::domain::{Bar, BarError, BarSeries, MarketData};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    InvalidBars(#[from] BarError),

    #[error("no data file for '{symbol}' at {path} (enable synthetic data to generate bars)")]
    Missing { symbol: String, path: PathBuf },
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// First date of generated synthetic bars.
    pub start: NaiveDate,
    /// Last date of generated synthetic bars.
    pub end: NaiveDate,
    /// If true, generate synthetic bars when no CSV file exists.
    pub synthetic: bool,
}

/// Where a symbol's bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv,
    Synthetic,
}

/// Result of loading bars, including data source provenance.
#[derive(Debug)]
pub struct LoadedData {
    pub market: MarketData,
    /// Data source per symbol.
    pub sources: HashMap<String, DataSource>,
    /// Dataset hash for fingerprinting (BLAKE3 over all bar data).
    pub dataset_hash: String,
    /// Whether any symbol used synthetic data.
    pub has_synthetic: bool,
}

/// On-disk row layout: `date,open,high,low,close,volume`.
#[derive(Debug, Serialize, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<CsvBar> for Bar {
    fn from(row: CsvBar) -> Self {
        Bar::new(row.date, row.open, row.high, row.low, row.close, row.volume)
    }
}

impl From<&Bar> for CsvBar {
    fn from(bar: &Bar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// Path of the CSV file for `symbol` inside `dir`.
pub fn csv_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{symbol}.csv"))
}

/// Read one symbol's bars from a headered CSV file.
///
/// Rows may appear in any order; duplicate dates and invalid prices are errors.
pub fn load_csv_series(path: &Path, symbol: &str) -> Result<BarSeries, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvBar>() {
        let row = row.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        bars.push(Bar::from(row));
    }
    Ok(BarSeries::from_unsorted(symbol, bars)?)
}

/// Write one series as a headered CSV file, creating parent directories.
pub fn write_csv_series(path: &Path, series: &BarSeries) -> Result<(), LoadError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LoadError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for bar in series.bars() {
        writer.serialize(CsvBar::from(bar)).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Load bars for a set of symbols, with fallback to synthetic data.
///
/// This is the primary entry point for the runner to get bar data.
pub fn load_bars(
    symbols: &[String],
    dir: Option<&Path>,
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    let mut market = MarketData::new();
    let mut sources: HashMap<String, DataSource> = HashMap::new();
    let mut has_synthetic = false;

    for symbol in symbols {
        // Step 1: CSV file
        let path = dir.map(|d| csv_path(d, symbol));
        if let Some(path) = path.as_deref().filter(|p| p.exists()) {
            // Bars before the start stay in: they are indicator warmup history.
            let series = load_csv_series(path, symbol)?;
            debug!(symbol = %symbol, bars = series.len(), path = %path.display(), "loaded csv");
            market.insert(series);
            sources.insert(symbol.clone(), DataSource::Csv);
            continue;
        }

        // Step 2: Synthetic fallback (if enabled)
        if opts.synthetic {
            warn!(
                symbol = %symbol,
                "generating synthetic data; results will be tagged as synthetic"
            );
            market.insert(generate_synthetic_bars(symbol, opts.start, opts.end)?);
            sources.insert(symbol.clone(), DataSource::Synthetic);
            has_synthetic = true;
            continue;
        }

        // Step 3: Fail
        return Err(LoadError::Missing {
            symbol: symbol.clone(),
            path: path.unwrap_or_else(|| PathBuf::from(format!("{symbol}.csv"))),
        });
    }

    let dataset_hash = compute_dataset_hash(&market);

    Ok(LoadedData {
        market,
        sources,
        dataset_hash,
        has_synthetic,
    })
}

/// Compute a deterministic BLAKE3 hash over all bar data.
///
/// Covers dates and all OHLCV values in sorted symbol order.
pub fn compute_dataset_hash(market: &MarketData) -> String {
    let mut hasher = blake3::Hasher::new();

    // MarketData iterates in symbol order
    for series in market.iter() {
        hasher.update(series.symbol().as_bytes());
        for bar in series.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}

/// Generate synthetic weekday bars between `start` and `end` inclusive.
///
/// A random walk from 100.0, seeded from the symbol name so the same symbol
/// always produces the same bars.
pub fn generate_synthetic_bars(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BarSeries, BarError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        bars.push(Bar::new(current, open, high, low, close, volume));

        price = close;
        current += chrono::Duration::days(1);
    }

    BarSeries::new(symbol, bars)
}
