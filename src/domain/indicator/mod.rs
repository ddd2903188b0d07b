//! Technical indicators and per-bar indicator snapshots.
//!
//! Every series function takes a value slice and returns one `Option<f64>` per
//! input element. Element `i` is computed only from `values[..=i]`, so a
//! snapshot for bar `i` never observes a later bar. `None` marks insufficient
//! history and is never conflated with a real zero.
//!
//! - `IndicatorPeriods`: the lookback lengths a strategy asks for
//! - `IndicatorSnapshot`: every indicator value for one bar
//! - `compute_snapshots`: builds the snapshot sequence, aligned 1:1 with the bars

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use bollinger::{calculate_bollinger, BollingerBands};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, calculate_macd_default, MacdValue};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::ohlcv::{closes, volumes, PriceBar};
use chrono::NaiveDateTime;

/// Window used for the rolling average volume.
pub const AVG_VOLUME_PERIOD: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPeriods {
    pub rsi: usize,
    pub ma_short: usize,
    pub ma_medium: usize,
    pub ma_long: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        IndicatorPeriods {
            rsi: 14,
            ma_short: 20,
            ma_medium: 50,
            ma_long: 200,
            bollinger_period: 20,
            bollinger_k: 2.0,
        }
    }
}

impl IndicatorPeriods {
    /// Bars needed before RSI and all three moving averages are defined.
    pub fn warmup(&self) -> usize {
        (self.rsi + 1)
            .max(self.ma_short)
            .max(self.ma_medium)
            .max(self.ma_long)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub volume: f64,
    pub rsi: Option<f64>,
    pub macd: Option<MacdValue>,
    pub ma_short: Option<f64>,
    pub ma_medium: Option<f64>,
    pub ma_long: Option<f64>,
    pub avg_volume: Option<f64>,
    pub bollinger: Option<BollingerBands>,
}

impl IndicatorSnapshot {
    /// RSI and the three moving averages are all defined.
    pub fn is_warmed_up(&self) -> bool {
        self.rsi.is_some()
            && self.ma_short.is_some()
            && self.ma_medium.is_some()
            && self.ma_long.is_some()
    }
}

pub fn compute_snapshots(bars: &[PriceBar], periods: &IndicatorPeriods) -> Vec<IndicatorSnapshot> {
    let closes = closes(bars);
    let volumes = volumes(bars);

    let rsi = calculate_rsi(&closes, periods.rsi);
    let macd = calculate_macd_default(&closes);
    let ma_short = calculate_sma(&closes, periods.ma_short);
    let ma_medium = calculate_sma(&closes, periods.ma_medium);
    let ma_long = calculate_sma(&closes, periods.ma_long);
    let avg_volume = calculate_sma(&volumes, AVG_VOLUME_PERIOD);
    let bollinger = calculate_bollinger(&closes, periods.bollinger_period, periods.bollinger_k);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorSnapshot {
            timestamp: bar.timestamp,
            close: bar.close,
            volume: bar.volume,
            rsi: rsi[i],
            macd: macd[i].clone(),
            ma_short: ma_short[i],
            ma_medium: ma_medium[i],
            ma_long: ma_long[i],
            avg_volume: avg_volume[i],
            bollinger: bollinger[i].clone(),
        })
        .collect()
}
