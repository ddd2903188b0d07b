//! Strategy configuration and the named strategy catalog.

use crate::domain::error::TradesimError;
use crate::domain::indicator::IndicatorPeriods;
use crate::domain::rule::{Condition, MaKind, RuleSet};

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub periods: IndicatorPeriods,
    pub rules: RuleSet,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), TradesimError> {
        let invalid = |reason: String| TradesimError::InvalidStrategy {
            name: self.name.clone(),
            reason,
        };

        let p = &self.periods;
        for (label, value) in [
            ("rsi_period", p.rsi),
            ("ma_short", p.ma_short),
            ("ma_medium", p.ma_medium),
            ("ma_long", p.ma_long),
            ("bollinger_period", p.bollinger_period),
        ] {
            if value == 0 {
                return Err(invalid(format!("{} must be at least 1", label)));
            }
        }
        if !p.bollinger_k.is_finite() || p.bollinger_k < 0.0 {
            return Err(invalid("bollinger_k must be a non-negative number".into()));
        }

        if self.rules.buy.is_empty() {
            return Err(invalid("at least one buy condition is required".into()));
        }
        if self.rules.sell.is_empty() {
            return Err(invalid("at least one sell condition is required".into()));
        }
        for condition in self.rules.buy.iter().chain(&self.rules.sell) {
            let threshold = match condition {
                Condition::RsiBelow(t) | Condition::RsiAbove(t) => Some(*t),
                _ => None,
            };
            if threshold.is_some_and(|t| !(0.0..=100.0).contains(&t)) {
                return Err(invalid(format!("{} threshold outside 0..=100", condition)));
            }
        }
        Ok(())
    }
}

/// Ordered mapping of strategy key to configuration.
///
/// Built once at start-up and handed to the comparator by value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyCatalog {
    entries: Vec<(String, StrategyConfig)>,
}

impl StrategyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five reference strategies.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert("current", current());
        catalog.insert("aggressive", aggressive());
        catalog.insert("conservative", conservative());
        catalog.insert("momentum", momentum());
        catalog.insert("mean-reversion", mean_reversion());
        catalog
    }

    /// Insert or replace; replacing keeps the original position.
    pub fn insert(&mut self, key: &str, config: StrategyConfig) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = config,
            None => self.entries.push((key.to_string(), config)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&StrategyConfig> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StrategyConfig)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn periods(rsi: usize, short: usize, medium: usize, long: usize) -> IndicatorPeriods {
    IndicatorPeriods {
        rsi,
        ma_short: short,
        ma_medium: medium,
        ma_long: long,
        ..IndicatorPeriods::default()
    }
}

fn current() -> StrategyConfig {
    StrategyConfig {
        name: "Current (RSI14 + MACD + 3 MAs)".into(),
        periods: periods(14, 20, 50, 200),
        rules: RuleSet::new(vec![Condition::RsiBelow(40.0)], vec![Condition::RsiAbove(60.0)]),
    }
}

fn aggressive() -> StrategyConfig {
    StrategyConfig {
        name: "Aggressive (RSI10 + Short MAs)".into(),
        periods: periods(10, 10, 30, 100),
        rules: RuleSet::new(
            vec![
                Condition::RsiBelow(35.0),
                Condition::MacdBullish,
                Condition::PriceAboveMa(MaKind::Short),
            ],
            vec![Condition::RsiAbove(65.0), Condition::MacdBearish],
        ),
    }
}

fn conservative() -> StrategyConfig {
    StrategyConfig {
        name: "Conservative (RSI20 + Long MAs)".into(),
        periods: periods(20, 50, 100, 200),
        rules: RuleSet::new(
            vec![
                Condition::RsiBelow(25.0),
                Condition::MacdBullish,
                Condition::PriceAboveMa(MaKind::Short),
            ],
            vec![Condition::RsiAbove(75.0), Condition::MacdBearish],
        ),
    }
}

fn momentum() -> StrategyConfig {
    StrategyConfig {
        name: "Momentum (MACD + Volume)".into(),
        periods: periods(14, 20, 50, 200),
        rules: RuleSet::new(
            vec![Condition::MacdBullish, Condition::PriceAboveMa(MaKind::Short)],
            vec![Condition::MacdBearish],
        ),
    }
}

fn mean_reversion() -> StrategyConfig {
    StrategyConfig {
        name: "Mean Reversion (BB + RSI)".into(),
        periods: periods(14, 20, 50, 200),
        rules: RuleSet::new(
            vec![Condition::RsiBelow(20.0), Condition::PriceAboveMa(MaKind::Short)],
            vec![Condition::RsiAbove(80.0)],
        ),
    }
}
