//! Signal generation from indicator snapshots.
//!
//! # Evaluation Semantics
//!
//! - Each buy condition that holds adds one to `buy_score`, each sell
//!   condition that holds adds one to `sell_score`; the two are independent
//! - `buy_score >= 1 && sell_score == 0` is BUY, the mirror case is SELL,
//!   everything else (no votes, or votes on both sides) is HOLD
//! - A snapshot that is not warmed up (RSI or any moving average missing)
//!   is HOLD whatever the conditions say
//! - A condition whose indicator is missing does not hold

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::rule::{Condition, MaKind, RuleSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

pub fn moving_average(snapshot: &IndicatorSnapshot, kind: MaKind) -> Option<f64> {
    match kind {
        MaKind::Short => snapshot.ma_short,
        MaKind::Medium => snapshot.ma_medium,
        MaKind::Long => snapshot.ma_long,
    }
}

pub fn evaluate(condition: &Condition, snapshot: &IndicatorSnapshot) -> bool {
    match condition {
        Condition::RsiBelow(threshold) => snapshot.rsi.is_some_and(|rsi| rsi < *threshold),
        Condition::RsiAbove(threshold) => snapshot.rsi.is_some_and(|rsi| rsi > *threshold),
        Condition::MacdBullish => snapshot.macd.as_ref().is_some_and(|m| m.is_bullish()),
        Condition::MacdBearish => snapshot.macd.as_ref().is_some_and(|m| m.is_bearish()),
        Condition::PriceAboveMa(kind) => {
            moving_average(snapshot, *kind).is_some_and(|ma| snapshot.close > ma)
        }
    }
}

/// Number of conditions in `conditions` that hold for `snapshot`.
pub fn score(conditions: &[Condition], snapshot: &IndicatorSnapshot) -> usize {
    conditions.iter().filter(|c| evaluate(c, snapshot)).count()
}

pub fn resolve(buy_score: usize, sell_score: usize) -> Signal {
    match (buy_score, sell_score) {
        (b, 0) if b >= 1 => Signal::Buy,
        (0, s) if s >= 1 => Signal::Sell,
        _ => Signal::Hold,
    }
}

pub fn generate_signal(snapshot: &IndicatorSnapshot, rules: &RuleSet) -> Signal {
    if !snapshot.is_warmed_up() {
        return Signal::Hold;
    }
    resolve(score(&rules.buy, snapshot), score(&rules.sell, snapshot))
}

pub fn generate_signals(snapshots: &[IndicatorSnapshot], rules: &RuleSet) -> Vec<Signal> {
    snapshots
        .iter()
        .map(|snapshot| generate_signal(snapshot, rules))
        .collect()
}
