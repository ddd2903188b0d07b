//! Run several catalog strategies over one series and rank them.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::Serialize;

use super::backtest::{BacktestConfig, BacktestResult, run_backtest};
use super::error::TradesimError;
use super::ohlcv::PriceBar;
use super::strategy::StrategyCatalog;

/// One line of the ranking table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub key: String,
    pub name: String,
    pub total_return: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub trades: usize,
    pub buy_hold_return: f64,
}

impl ComparisonRow {
    fn from_result(key: &str, result: &BacktestResult) -> Self {
        let m = &result.metrics;
        ComparisonRow {
            key: key.to_string(),
            name: result.strategy_name.clone(),
            total_return: m.total_return,
            win_rate: m.win_rate,
            sharpe_ratio: m.sharpe_ratio,
            max_drawdown: m.max_drawdown,
            trades: m.total_trades,
            buy_hold_return: m.buy_hold_return,
        }
    }
}

#[derive(Debug)]
pub struct StrategyFailure {
    pub name: String,
    pub error: TradesimError,
}

#[derive(Debug, Default)]
pub struct ComparisonReport {
    /// Sorted by Sharpe ratio, highest first; ties keep request order.
    pub rows: Vec<ComparisonRow>,
    /// Full results, in the same order as `rows`.
    pub results: Vec<BacktestResult>,
    /// In request order, after any failures added with `prepend_failures`.
    pub failures: Vec<StrategyFailure>,
}

impl ComparisonReport {
    pub fn best(&self) -> Option<&ComparisonRow> {
        self.rows.first()
    }

    /// Record strategies that failed before the run, such as malformed config sections.
    pub fn prepend_failures(&mut self, mut earlier: Vec<StrategyFailure>) {
        earlier.append(&mut self.failures);
        self.failures = earlier;
    }
}

/// Backtest each requested strategy in parallel and rank the successes.
///
/// With no names requested every catalog entry runs, in catalog order.
/// A failing strategy is recorded and skipped; an empty series or an invalid
/// `config` fails the whole comparison.
pub fn compare_strategies(
    bars: &[PriceBar],
    catalog: &StrategyCatalog,
    names: &[String],
    config: &BacktestConfig,
) -> Result<ComparisonReport, TradesimError> {
    if bars.is_empty() {
        return Err(TradesimError::DataUnavailable {
            symbol: config.symbol.clone(),
        });
    }
    config.validate()?;

    let requested: Vec<String> = if names.is_empty() {
        catalog.keys().map(str::to_string).collect()
    } else {
        names.to_vec()
    };

    let outcomes: Vec<(String, Result<BacktestResult, TradesimError>)> = requested
        .par_iter()
        .map(|key| {
            let outcome = match catalog.get(key) {
                Some(strategy) => run_backtest(bars, strategy, config),
                None => Err(TradesimError::UnknownStrategy { name: key.clone() }),
            };
            (key.clone(), outcome.map_err(|e| e.in_strategy(key)))
        })
        .collect();

    let mut ranked = Vec::new();
    let mut failures = Vec::new();
    for (key, outcome) in outcomes {
        match outcome {
            Ok(result) => ranked.push((key, result)),
            Err(error) => {
                tracing::warn!(strategy = %key, %error, "strategy skipped");
                failures.push(StrategyFailure { name: key, error });
            }
        }
    }

    ranked.sort_by(|(_, a), (_, b)| {
        b.metrics
            .sharpe_ratio
            .partial_cmp(&a.metrics.sharpe_ratio)
            .unwrap_or(Ordering::Equal)
    });

    let rows = ranked
        .iter()
        .map(|(key, result)| ComparisonRow::from_result(key, result))
        .collect();
    let results = ranked.into_iter().map(|(_, result)| result).collect();

    tracing::info!(
        succeeded = requested.len() - failures.len(),
        failed = failures.len(),
        "comparison finished"
    );

    Ok(ComparisonReport {
        rows,
        results,
        failures,
    })
}
