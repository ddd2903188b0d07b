//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow), defined once both EMAs are.
//! The signal line and histogram are not derived from a smoothed MACD-line
//! series here; they always read as `None`.
//!
//! Default parameters: fast=12, slow=26
//! Warmup: max(fast, slow) - 1 elements.

use super::ema::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdValue {
    pub line: f64,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

impl MacdValue {
    pub fn is_bullish(&self) -> bool {
        self.line > 0.0
    }

    pub fn is_bearish(&self) -> bool {
        self.line < 0.0
    }
}

pub fn calculate_macd(values: &[f64], fast: usize, slow: usize) -> Vec<Option<MacdValue>> {
    let ema_fast = calculate_ema(values, fast);
    let ema_slow = calculate_ema(values, slow);

    ema_fast
        .into_iter()
        .zip(ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(MacdValue {
                line: f - s,
                signal: None,
                histogram: None,
            }),
            _ => None,
        })
        .collect()
}

pub fn calculate_macd_default(values: &[f64]) -> Vec<Option<MacdValue>> {
    calculate_macd(values, DEFAULT_FAST, DEFAULT_SLOW)
}
