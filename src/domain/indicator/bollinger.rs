//! Bollinger Bands.
//!
//! - Middle: SMA over n values
//! - Upper: Middle + (k × StdDev)
//! - Lower: Middle - (k × StdDev)
//!
//! StdDev is the population standard deviation (divides by n, not n-1).
//! Warmup: first (n-1) elements are undefined.

use super::sma::window_mean;
use super::stddev::window_stddev;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn calculate_bollinger(values: &[f64], period: usize, k: f64) -> Vec<Option<BollingerBands>> {
    (0..values.len())
        .map(|i| {
            let prefix = &values[..=i];
            let middle = window_mean(prefix, period)?;
            let stddev = window_stddev(prefix, period)?;
            Some(BollingerBands {
                upper: middle + k * stddev,
                middle,
                lower: middle - k * stddev,
            })
        })
        .collect()
}
