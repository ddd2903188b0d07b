//! Rolling population standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((V[i-j] - SMA(n)[i])^2 for j in 0..n) / n)
//! Warmup: first (n-1) elements are undefined.

use super::sma::window_mean;

/// Standard deviation of the last `period` values of `prefix`.
pub(crate) fn window_stddev(prefix: &[f64], period: usize) -> Option<f64> {
    let mean = window_mean(prefix, period)?;
    let window = &prefix[prefix.len() - period..];
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;
    Some(variance.sqrt())
}
