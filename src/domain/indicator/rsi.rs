//! RSI (Relative Strength Index).
//!
//! Average gain and average loss are plain means over the last n
//! bar-to-bar changes (losses taken as positive magnitudes):
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n elements are undefined (n changes need n+1 values).

use super::sma::window_mean;

pub fn calculate_rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.is_empty() {
        return vec![None; values.len()];
    }

    let mut gains = Vec::with_capacity(values.len() - 1);
    let mut losses = Vec::with_capacity(values.len() - 1);
    for pair in values.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut out = Vec::with_capacity(values.len());
    out.push(None);

    // Value i has i changes behind it: gains[..i].
    for i in 1..values.len() {
        let avg_gain = window_mean(&gains[..i], period);
        let avg_loss = window_mean(&losses[..i], period);
        out.push(match (avg_gain, avg_loss) {
            (Some(gain), Some(loss)) => Some(rsi_from_averages(gain, loss)),
            _ => None,
        });
    }

    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
