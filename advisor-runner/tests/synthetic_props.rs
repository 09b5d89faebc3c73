//! Property tests for synthetic data and config hashing.
//!
//! Uses proptest to verify:
//! 1. Synthetic bars are weekday-only, in range, and internally consistent
//! 2. Synthetic generation is a pure function of symbol and range
//! 3. Run ids change with every engine parameter

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use advisor_runner::config::BacktestConfig;
use advisor_runner::data_loader::generate_synthetic_bars;

fn arb_symbol() -> impl Strategy<Value = String> {
    "[A-Z]{1,5}"
}

fn arb_range() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (0..2000_i64, 0..400_i64).prop_map(|(offset, len)| {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + chrono::Duration::days(offset);
        (start, start + chrono::Duration::days(len))
    })
}

fn base_config() -> BacktestConfig {
    BacktestConfig::from_toml(
        r#"
[backtest]
start_date = "2024-01-01"
end_date = "2024-12-31"

[strategy]
type = "buy_and_hold"
shares_per_symbol = 10

[data]
symbols = ["SPY"]
synthetic = true
"#,
    )
    .unwrap()
}

proptest! {
    #[test]
    fn synthetic_bars_are_valid(symbol in arb_symbol(), (start, end) in arb_range()) {
        let series = generate_synthetic_bars(&symbol, start, end).unwrap();
        for bar in series.bars() {
            prop_assert!(bar.date >= start && bar.date <= end);
            prop_assert!(bar.date.weekday().number_from_monday() <= 5);
            prop_assert!(bar.high >= bar.open.max(bar.close));
            prop_assert!(bar.low <= bar.open.min(bar.close));
            prop_assert!(bar.low > 0.0);
            prop_assert!(bar.volume >= 500_000.0);
        }
        prop_assert!(series.bars().windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn synthetic_is_pure(symbol in arb_symbol(), (start, end) in arb_range()) {
        let a = generate_synthetic_bars(&symbol, start, end).unwrap();
        let b = generate_synthetic_bars(&symbol, start, end).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn run_id_tracks_engine_parameters(
        capital in 1_000.0..1_000_000.0_f64,
        commission in 0.0..0.01_f64,
    ) {
        let mut a = base_config();
        a.backtest.initial_capital = capital;
        let mut b = a.clone();
        prop_assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());

        b.backtest.commission_rate = commission + 0.01;
        prop_assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
        a.backtest.commission_rate = commission;
        prop_assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }
}
