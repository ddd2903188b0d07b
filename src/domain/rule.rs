//! Trading condition types.
//!
//! A strategy's rules are two ordered lists of `Condition`s, one voting for
//! BUY and one voting for SELL. Each condition kind carries its own typed
//! parameters.

use std::fmt;

/// Which of a strategy's three moving averages a condition refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaKind {
    Short,
    Medium,
    Long,
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaKind::Short => write!(f, "short"),
            MaKind::Medium => write!(f, "medium"),
            MaKind::Long => write!(f, "long"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    RsiBelow(f64),
    RsiAbove(f64),
    MacdBullish,
    MacdBearish,
    PriceAboveMa(MaKind),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::RsiBelow(threshold) => write!(f, "rsi_below({})", threshold),
            Condition::RsiAbove(threshold) => write!(f, "rsi_above({})", threshold),
            Condition::MacdBullish => write!(f, "macd_bullish"),
            Condition::MacdBearish => write!(f, "macd_bearish"),
            Condition::PriceAboveMa(kind) => write!(f, "price_above_ma({})", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    pub buy: Vec<Condition>,
    pub sell: Vec<Condition>,
}

impl RuleSet {
    pub fn new(buy: Vec<Condition>, sell: Vec<Condition>) -> Self {
        RuleSet { buy, sell }
    }
}

/// Render a condition list in the same comma-separated form the parser reads.
pub fn format_conditions(conditions: &[Condition]) -> String {
    conditions
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
