//! Trade execution and the single-position simulator.
//!
//! The simulator is a two-state machine:
//!
//! | state | signal | action                         |
//! |-------|--------|--------------------------------|
//! | FLAT  | BUY    | open a position, go LONG       |
//! | LONG  | SELL   | close the position, go FLAT    |
//! | any   | other  | nothing                        |
//!
//! After each bar an equity point is recorded. A position still open when
//! the bars run out is closed at the last processed bar.

use chrono::NaiveDateTime;

use super::ohlcv::PriceBar;
use super::portfolio::Portfolio;
use super::position::{Position, Trade};
use super::rule_eval::Signal;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of current cash committed on each entry.
    pub position_size: f64,
    /// Proportional fee charged on entry and on exit notional.
    pub commission_rate: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            position_size: 0.02,
            commission_rate: 0.001,
        }
    }
}

pub fn calculate_commission(notional: f64, rate: f64) -> f64 {
    notional * rate
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        shares: f64,
        invested_capital: f64,
        commission: f64,
    },
    AlreadyLong,
    InsufficientCapital,
}

/// Open a long position at `price`.
///
/// The invested capital leaves cash; the entry commission is taken out of
/// it before shares are bought.
pub fn enter_long(
    portfolio: &mut Portfolio,
    price: f64,
    time: NaiveDateTime,
    config: &ExecutionConfig,
) -> EntryResult {
    if portfolio.is_long() {
        return EntryResult::AlreadyLong;
    }

    let invested_capital = portfolio.cash * config.position_size;
    let tradable = invested_capital > 0.0 && price > 0.0 && price.is_finite();
    if !tradable {
        return EntryResult::InsufficientCapital;
    }

    let commission = calculate_commission(invested_capital, config.commission_rate);
    let shares = (invested_capital - commission) / price;

    portfolio.cash -= invested_capital;
    portfolio.position = Some(Position {
        entry_price: price,
        entry_time: time,
        shares,
        invested_capital,
    });

    tracing::debug!(%time, price, shares, invested_capital, "opened position");

    EntryResult::Entered {
        shares,
        invested_capital,
        commission,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub net_proceeds: f64,
    pub commission: f64,
    pub profit: f64,
}

/// Sell every share at `price`, record the trade, and return to flat.
pub fn exit_long(
    portfolio: &mut Portfolio,
    price: f64,
    time: NaiveDateTime,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let position = portfolio.take_position()?;

    let sale_value = position.market_value(price);
    let commission = calculate_commission(sale_value, config.commission_rate);
    let net_proceeds = sale_value - commission;
    let profit = net_proceeds - position.invested_capital;
    let profit_percent = profit / position.invested_capital * 100.0;

    portfolio.cash += net_proceeds;

    tracing::debug!(%time, price, profit, profit_percent, "closed position");

    portfolio.record_trade(Trade {
        entry_date: position.entry_time,
        exit_date: time,
        entry_price: position.entry_price,
        exit_price: price,
        shares: position.shares,
        profit,
        profit_percent,
    });

    Some(ExitResult {
        net_proceeds,
        commission,
        profit,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
}

/// Bar-at-a-time driver over a `Portfolio`.
#[derive(Debug, Clone)]
pub struct TradeSimulator {
    portfolio: Portfolio,
    config: ExecutionConfig,
    last_bar: Option<(NaiveDateTime, f64)>,
    bars_processed: usize,
}

impl TradeSimulator {
    pub fn new(initial_capital: f64, config: ExecutionConfig) -> Self {
        TradeSimulator {
            portfolio: Portfolio::new(initial_capital),
            config,
            last_bar: None,
            bars_processed: 0,
        }
    }

    pub fn state(&self) -> PositionState {
        if self.portfolio.is_long() {
            PositionState::Long
        } else {
            PositionState::Flat
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    /// Apply one bar's signal, then sample equity at the bar's close.
    pub fn step(&mut self, bar: &PriceBar, signal: Signal) {
        match (self.state(), signal) {
            (PositionState::Flat, Signal::Buy) => {
                let entry = enter_long(&mut self.portfolio, bar.close, bar.timestamp, &self.config);
                if !matches!(entry, EntryResult::Entered { .. }) {
                    tracing::debug!(
                        time = %bar.timestamp,
                        price = bar.close,
                        cash = self.portfolio.cash,
                        outcome = ?entry,
                        "entry refused"
                    );
                }
            }
            (PositionState::Long, Signal::Sell) => {
                exit_long(&mut self.portfolio, bar.close, bar.timestamp, &self.config);
            }
            _ => {}
        }

        self.portfolio.record_equity(bar.timestamp, bar.close);
        self.last_bar = Some((bar.timestamp, bar.close));
        self.bars_processed += 1;
    }

    /// Close any open position at the last processed bar and hand back the portfolio.
    pub fn finish(mut self) -> Portfolio {
        if let Some((time, price)) = self.last_bar {
            if self.portfolio.is_long() {
                tracing::debug!(%time, "closing position at end of series");
                exit_long(&mut self.portfolio, price, time, &self.config);
            }
        }
        self.portfolio
    }
}

/// Run the simulator over aligned signals and bars.
pub fn simulate(
    signals: &[Signal],
    bars: &[PriceBar],
    initial_capital: f64,
    config: &ExecutionConfig,
) -> Portfolio {
    let mut simulator = TradeSimulator::new(initial_capital, config.clone());
    for (bar, &signal) in bars.iter().zip(signals) {
        simulator.step(bar, signal);
    }
    simulator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn config() -> ExecutionConfig {
        ExecutionConfig {
            position_size: 0.5,
            commission_rate: 0.01,
        }
    }

    fn no_fee() -> ExecutionConfig {
        ExecutionConfig {
            position_size: 1.0,
            commission_rate: 0.0,
        }
    }

    #[test]
    fn default_config_matches_reference_run() {
        let c = ExecutionConfig::default();
        assert!((c.position_size - 0.02).abs() < f64::EPSILON);
        assert!((c.commission_rate - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn calculate_commission_is_proportional() {
        assert!((calculate_commission(10_000.0, 0.001) - 10.0).abs() < 1e-12);
        assert_eq!(calculate_commission(10_000.0, 0.0), 0.0);
    }

    #[test]
    fn enter_long_basic() {
        let mut portfolio = Portfolio::new(10_000.0);
        let result = enter_long(&mut portfolio, 100.0, time(), &config());

        match result {
            EntryResult::Entered {
                shares,
                invested_capital,
                commission,
            } => {
                assert!((invested_capital - 5_000.0).abs() < 1e-9);
                assert!((commission - 50.0).abs() < 1e-9);
                assert!((shares - 49.5).abs() < 1e-9);
            }
            other => panic!("expected entry, got {other:?}"),
        }

        assert!((portfolio.cash - 5_000.0).abs() < 1e-9);
        let pos = portfolio.position.as_ref().unwrap();
        assert_eq!(pos.entry_time, time());
        assert!((pos.entry_price - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn enter_long_rejects_pyramiding() {
        let mut portfolio = Portfolio::new(10_000.0);
        enter_long(&mut portfolio, 100.0, time(), &config());
        let cash = portfolio.cash;

        let second = enter_long(&mut portfolio, 90.0, time(), &config());
        assert_eq!(second, EntryResult::AlreadyLong);
        assert!((portfolio.cash - cash).abs() < f64::EPSILON);
    }

    #[test]
    fn enter_long_with_no_cash() {
        let mut portfolio = Portfolio::new(0.0);
        let result = enter_long(&mut portfolio, 100.0, time(), &config());
        assert_eq!(result, EntryResult::InsufficientCapital);
        assert!(!portfolio.is_long());
    }

    #[test]
    fn enter_long_at_zero_price_is_refused() {
        let mut portfolio = Portfolio::new(1_000.0);
        let result = enter_long(&mut portfolio, 0.0, time(), &config());
        assert_eq!(result, EntryResult::InsufficientCapital);
        assert!((portfolio.cash - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exit_long_profit() {
        let mut portfolio = Portfolio::new(10_000.0);
        enter_long(&mut portfolio, 100.0, time(), &config());

        let exit = exit_long(&mut portfolio, 110.0, time(), &config()).unwrap();
        // 49.5 shares * 110 = 5445, minus 1% = 5390.55
        assert!((exit.net_proceeds - 5_390.55).abs() < 1e-9);
        assert!((exit.profit - 390.55).abs() < 1e-9);

        assert!(!portfolio.is_long());
        assert!((portfolio.cash - 10_390.55).abs() < 1e-9);

        let trade = &portfolio.trades[0];
        assert!((trade.profit_percent - 390.55 / 5_000.0 * 100.0).abs() < 1e-9);
        assert!((trade.exit_price - 110.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exit_when_flat_is_none() {
        let mut portfolio = Portfolio::new(10_000.0);
        assert!(exit_long(&mut portfolio, 100.0, time(), &config()).is_none());
        assert!(portfolio.trades.is_empty());
    }

    #[test]
    fn round_trip_at_same_price_loses_both_commissions() {
        let mut portfolio = Portfolio::new(10_000.0);
        enter_long(&mut portfolio, 100.0, time(), &config());
        let exit = exit_long(&mut portfolio, 100.0, time(), &config()).unwrap();
        // entry fee 50, exit fee 1% of 4950 = 49.5
        assert!((exit.profit + 99.5).abs() < 1e-9);
    }

    #[test]
    fn sell_while_flat_is_noop() {
        let bars = make_bars(&[100.0, 101.0]);
        let portfolio = simulate(&[Signal::Sell, Signal::Sell], &bars, 1_000.0, &no_fee());
        assert!(portfolio.trades.is_empty());
        assert!((portfolio.cash - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn buy_while_long_is_noop() {
        let bars = make_bars(&[100.0, 50.0, 200.0]);
        let signals = [Signal::Buy, Signal::Buy, Signal::Sell];
        let portfolio = simulate(&signals, &bars, 1_000.0, &no_fee());

        assert_eq!(portfolio.trades.len(), 1);
        let trade = &portfolio.trades[0];
        assert!((trade.entry_price - 100.0).abs() < f64::EPSILON);
        assert!((trade.exit_price - 200.0).abs() < f64::EPSILON);
        assert!((trade.profit - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn equity_point_per_bar() {
        let bars = make_bars(&[100.0, 120.0, 90.0, 95.0]);
        let signals = [Signal::Buy, Signal::Hold, Signal::Sell, Signal::Hold];
        let portfolio = simulate(&signals, &bars, 1_000.0, &no_fee());

        let equity: Vec<f64> = portfolio.equity_curve.iter().map(|p| p.equity).collect();
        assert_eq!(equity.len(), 4);
        assert!((equity[0] - 1_000.0).abs() < 1e-9);
        assert!((equity[1] - 1_200.0).abs() < 1e-9);
        assert!((equity[2] - 900.0).abs() < 1e-9);
        assert!((equity[3] - 900.0).abs() < 1e-9);
    }

    #[test]
    fn open_position_closed_at_end() {
        let bars = make_bars(&[100.0, 105.0, 110.0]);
        let signals = [Signal::Hold, Signal::Buy, Signal::Hold];
        let portfolio = simulate(&signals, &bars, 1_000.0, &no_fee());

        assert_eq!(portfolio.trades.len(), 1);
        assert!(!portfolio.is_long());
        let trade = &portfolio.trades[0];
        assert_eq!(trade.entry_date, bars[1].timestamp);
        assert_eq!(trade.exit_date, bars[2].timestamp);
        assert!((trade.exit_price - 110.0).abs() < f64::EPSILON);
    }

    #[test]
    fn simulator_tracks_state() {
        let bars = make_bars(&[100.0, 101.0]);
        let mut sim = TradeSimulator::new(1_000.0, no_fee());
        assert_eq!(sim.state(), PositionState::Flat);
        sim.step(&bars[0], Signal::Buy);
        assert_eq!(sim.state(), PositionState::Long);
        sim.step(&bars[1], Signal::Sell);
        assert_eq!(sim.state(), PositionState::Flat);
        assert_eq!(sim.bars_processed(), 2);
    }

    #[test]
    fn refused_entry_stays_flat_and_records_equity() {
        let mut bars = make_bars(&[100.0, 100.0, 105.0]);
        bars[0].close = 0.0;
        let mut sim = TradeSimulator::new(1_000.0, no_fee());

        sim.step(&bars[0], Signal::Buy);
        assert_eq!(sim.state(), PositionState::Flat);
        assert_eq!(sim.portfolio().equity_curve.len(), 1);
        assert!((sim.portfolio().cash - 1_000.0).abs() < f64::EPSILON);

        sim.step(&bars[1], Signal::Buy);
        assert_eq!(sim.state(), PositionState::Long);
        sim.step(&bars[2], Signal::Hold);

        let portfolio = sim.finish();
        assert_eq!(portfolio.trades.len(), 1);
        assert_eq!(portfolio.trades[0].entry_date, bars[1].timestamp);
    }

    #[test]
    fn finish_without_bars_is_untouched() {
        let sim = TradeSimulator::new(500.0, no_fee());
        let portfolio = sim.finish();
        assert!(portfolio.trades.is_empty());
        assert!((portfolio.cash - 500.0).abs() < f64::EPSILON);
    }

    fn signal_strategy() -> impl Strategy<Value = Signal> {
        prop_oneof![Just(Signal::Buy), Just(Signal::Sell), Just(Signal::Hold)]
    }

    proptest! {
        #[test]
        fn trades_match_closures_plus_forced_exit(
            steps in prop::collection::vec((1.0f64..500.0, signal_strategy()), 1..60),
        ) {
            let prices: Vec<f64> = steps.iter().map(|(p, _)| *p).collect();
            let signals: Vec<Signal> = steps.iter().map(|(_, s)| *s).collect();
            let bars = make_bars(&prices);

            let mut sim = TradeSimulator::new(10_000.0, config());
            let mut closures = 0;
            for (bar, &signal) in bars.iter().zip(&signals) {
                let was_long = sim.state() == PositionState::Long;
                sim.step(bar, signal);
                if was_long && signal == Signal::Sell {
                    closures += 1;
                }
                prop_assert!(sim.portfolio().cash >= 0.0);
            }
            let open_at_end = usize::from(sim.state() == PositionState::Long);
            let portfolio = sim.finish();

            prop_assert_eq!(portfolio.trades.len(), closures + open_at_end);
            prop_assert!(portfolio.position.is_none());
            prop_assert!(portfolio.equity_curve.iter().all(|p| p.equity >= 0.0));
        }
    }
}
