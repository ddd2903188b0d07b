//! Performance metrics over a closed trade log.
//!
//! Every figure except `total_trades` and `sharpe_ratio` is a percentage.
//! A run with no trades reports the zero baseline for all of them.

use serde::Serialize;

use super::ohlcv::PriceBar;
use super::position::Trade;

/// Standard deviations at or below this are treated as zero volatility.
const VOLATILITY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub avg_profit_per_trade: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub buy_hold_return: f64,
}

impl Metrics {
    pub fn compute(
        trades: &[Trade],
        initial_capital: f64,
        final_equity: f64,
        bars: &[PriceBar],
    ) -> Self {
        if trades.is_empty() {
            return Metrics::default();
        }

        let total_return = percent_change(initial_capital, final_equity);

        let wins = trades.iter().filter(|t| t.is_win()).count();
        let win_rate = wins as f64 / trades.len() as f64 * 100.0;

        // Non-finite returns stay in total_trades but not in the per-trade figures.
        let returns: Vec<f64> = trades
            .iter()
            .map(|t| t.profit_percent)
            .filter(|r| r.is_finite())
            .collect();
        let mean = mean(&returns);
        let stddev = population_stddev(&returns, mean);
        let sharpe_ratio = if stddev > VOLATILITY_EPSILON {
            mean / stddev
        } else {
            0.0
        };

        let best_trade = returns.iter().copied().reduce(f64::max).unwrap_or(0.0);
        let worst_trade = returns.iter().copied().reduce(f64::min).unwrap_or(0.0);

        let buy_hold_return = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => percent_change(first.close, last.close),
            _ => 0.0,
        };

        Metrics {
            total_return,
            win_rate,
            sharpe_ratio,
            max_drawdown: max_drawdown(trades, initial_capital),
            total_trades: trades.len(),
            avg_profit_per_trade: mean,
            best_trade,
            worst_trade,
            buy_hold_return,
        }
    }
}

fn percent_change(from: f64, to: f64) -> f64 {
    if from > 0.0 && from.is_finite() && to.is_finite() {
        (to - from) / from * 100.0
    } else {
        0.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Largest peak-to-trough decline of realized capital, walking trades in order.
///
/// The peak starts at `initial_capital`; the result is clamped to `[0, 100]`.
pub fn max_drawdown(trades: &[Trade], initial_capital: f64) -> f64 {
    let mut capital = initial_capital;
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;

    for trade in trades.iter().filter(|t| t.profit.is_finite()) {
        capital += trade.profit;
        if capital > peak {
            peak = capital;
        }
        if peak > 0.0 {
            let dd = (peak - capital) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd.clamp(0.0, 100.0)
}
