//! Price bar representation.

use chrono::NaiveDateTime;

/// One OHLCV bar. Series are ordered ascending by `timestamp`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Bar with all four prices set to `close`, as produced by close-only feeds.
    pub fn from_close(timestamp: NaiveDateTime, close: f64, volume: f64) -> Self {
        PriceBar {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    /// Prices are positive and finite; volume is finite and not negative.
    pub fn has_valid_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
    }
}

/// Position of the first bar whose close is not a positive finite number.
pub fn first_unusable_close(bars: &[PriceBar]) -> Option<usize> {
    bars.iter()
        .position(|b| !b.close.is_finite() || b.close <= 0.0)
}

pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn volumes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}
