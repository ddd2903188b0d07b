//! Open position and closed trade records.

use chrono::NaiveDateTime;
use serde::Serialize;

/// A long position. At most one exists at a time, owned by the portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub shares: f64,
    pub invested_capital: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }
}

/// A closed round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub entry_date: NaiveDateTime,
    pub exit_date: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    pub profit: f64,
    pub profit_percent: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.profit > 0.0
    }
}
