//! Single-strategy backtest: indicators, signals, simulation, metrics.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use super::config_validation::BACKTEST_SECTION;
use super::error::TradesimError;
use super::execution::{ExecutionConfig, TradeSimulator};
use super::indicator::compute_snapshots;
use super::metrics::Metrics;
use super::ohlcv::{PriceBar, first_unusable_close};
use super::portfolio::EquityPoint;
use super::position::Trade;
use super::rule_eval::generate_signals;
use super::strategy::StrategyConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    /// Free-text period descriptor; derived from the bar dates when unset.
    pub period: Option<String>,
    pub initial_capital: f64,
    pub position_size: f64,
    pub commission_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        let execution = ExecutionConfig::default();
        BacktestConfig {
            symbol: "UNKNOWN".to_string(),
            period: None,
            initial_capital: 10_000.0,
            position_size: execution.position_size,
            commission_rate: execution.commission_rate,
        }
    }
}

impl BacktestConfig {
    /// Capital must be positive, `position_size` in (0, 1], commission in [0, 1).
    pub fn validate(&self) -> Result<(), TradesimError> {
        let invalid = |key: &str, reason: &str| {
            Err(TradesimError::ConfigInvalid {
                section: BACKTEST_SECTION.to_string(),
                key: key.to_string(),
                reason: reason.to_string(),
            })
        };

        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return invalid("initial_capital", "initial_capital must be positive");
        }
        if !self.position_size.is_finite() || self.position_size <= 0.0 || self.position_size > 1.0
        {
            return invalid("position_size", "position_size must be between 0 and 1");
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return invalid("commission", "commission must be at least 0 and below 1");
        }
        Ok(())
    }

    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            position_size: self.position_size,
            commission_rate: self.commission_rate,
        }
    }

    fn period_for(&self, bars: &[PriceBar]) -> String {
        if let Some(period) = &self.period {
            return period.clone();
        }
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => format!(
                "{} to {}",
                first.timestamp.format("%Y-%m-%d"),
                last.timestamp.format("%Y-%m-%d")
            ),
            _ => String::new(),
        }
    }
}

/// Outcome of one strategy run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub symbol: String,
    pub period: String,
    #[serde(flatten)]
    pub metrics: Metrics,
    pub trade_log: Vec<Trade>,
    pub final_equity: f64,
    pub equity_curve: Vec<EquityPoint>,
    /// False when the run was cancelled before the last bar.
    pub completed: bool,
}

pub fn run_backtest(
    bars: &[PriceBar],
    strategy: &StrategyConfig,
    config: &BacktestConfig,
) -> Result<BacktestResult, TradesimError> {
    run_backtest_with_cancel(bars, strategy, config, &AtomicBool::new(false))
}

/// Like [`run_backtest`], but stops between bars once `cancel` is set.
///
/// A cancelled run closes any open position at the last processed bar and
/// reports metrics over the processed prefix only.
pub fn run_backtest_with_cancel(
    bars: &[PriceBar],
    strategy: &StrategyConfig,
    config: &BacktestConfig,
    cancel: &AtomicBool,
) -> Result<BacktestResult, TradesimError> {
    run_backtest_until(bars, strategy, config, |_| cancel.load(Ordering::Relaxed))
}

/// Core loop. `should_stop` is asked before each bar with the number of
/// bars processed so far.
pub fn run_backtest_until<F>(
    bars: &[PriceBar],
    strategy: &StrategyConfig,
    config: &BacktestConfig,
    mut should_stop: F,
) -> Result<BacktestResult, TradesimError>
where
    F: FnMut(usize) -> bool,
{
    if bars.is_empty() {
        return Err(TradesimError::DataUnavailable {
            symbol: config.symbol.clone(),
        });
    }
    if let Some(index) = first_unusable_close(bars) {
        return Err(TradesimError::DataSource {
            reason: format!(
                "{}: bar {} ({}) has close {}",
                config.symbol, index, bars[index].timestamp, bars[index].close
            ),
        });
    }
    config.validate()?;
    strategy.validate()?;

    let snapshots = compute_snapshots(bars, &strategy.periods);
    let signals = generate_signals(&snapshots, &strategy.rules);

    let mut simulator = TradeSimulator::new(config.initial_capital, config.execution());
    for (bar, &signal) in bars.iter().zip(&signals) {
        if should_stop(simulator.bars_processed()) {
            tracing::info!(
                strategy = %strategy.name,
                processed = simulator.bars_processed(),
                "backtest cancelled"
            );
            break;
        }
        simulator.step(bar, signal);
    }

    let processed = &bars[..simulator.bars_processed()];
    let completed = processed.len() == bars.len();
    let portfolio = simulator.finish();

    let final_equity = config.initial_capital + portfolio.realized_profit();
    let metrics = Metrics::compute(
        &portfolio.trades,
        config.initial_capital,
        final_equity,
        processed,
    );

    tracing::info!(
        strategy = %strategy.name,
        symbol = %config.symbol,
        trades = metrics.total_trades,
        total_return = metrics.total_return,
        "backtest finished"
    );

    Ok(BacktestResult {
        strategy_name: strategy.name.clone(),
        symbol: config.symbol.clone(),
        period: config.period_for(bars),
        metrics,
        trade_log: portfolio.trades,
        final_equity,
        equity_curve: portfolio.equity_curve,
        completed,
    })
}
