//! Market data port trait.

use crate::domain::error::TradesimError;
use crate::domain::ohlcv::PriceBar;

pub trait DataPort {
    /// Bars for `symbol`, ascending by timestamp.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, TradesimError>;
}
