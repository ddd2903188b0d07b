#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use tradesim::domain::backtest::BacktestConfig;
use tradesim::domain::error::TradesimError;
use tradesim::domain::indicator::IndicatorPeriods;
pub use tradesim::domain::ohlcv::PriceBar;
use tradesim::domain::rule::{Condition, RuleSet};
use tradesim::domain::rule_eval::Signal;
use tradesim::domain::strategy::StrategyConfig;
use tradesim::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, TradesimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradesimError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Daily bars starting 2024-01-01, one per close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start + chrono::Duration::days(i as i64),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// A long oscillating series, enough to warm up a 200-bar average.
pub fn wave_bars(count: usize) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.05 * t + 15.0 * (t / 9.0).sin() + 6.0 * (t / 2.3).cos()
        })
        .collect();
    bars_from_closes(&closes)
}

/// BUY after two consecutive rising closes, SELL after two consecutive falling closes.
pub fn two_bar_momentum_signals(bars: &[PriceBar]) -> Vec<Signal> {
    (0..bars.len())
        .map(|i| {
            if i < 2 {
                return Signal::Hold;
            }
            let (a, b, c) = (bars[i - 2].close, bars[i - 1].close, bars[i].close);
            if c > b && b > a {
                Signal::Buy
            } else if c < b && b < a {
                Signal::Sell
            } else {
                Signal::Hold
            }
        })
        .collect()
}

pub fn short_rsi_strategy(name: &str) -> StrategyConfig {
    StrategyConfig {
        name: name.to_string(),
        periods: IndicatorPeriods {
            rsi: 2,
            ma_short: 2,
            ma_medium: 3,
            ma_long: 4,
            bollinger_period: 3,
            bollinger_k: 2.0,
        },
        rules: RuleSet::new(vec![Condition::RsiBelow(30.0)], vec![Condition::RsiAbove(70.0)]),
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        symbol: "BTC".to_string(),
        ..BacktestConfig::default()
    }
}
