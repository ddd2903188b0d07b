//! Trade log export port trait.

use std::path::Path;

use crate::domain::error::TradesimError;
use crate::domain::position::Trade;

pub trait ReportPort {
    fn write_trades(&self, trades: &[Trade], output_path: &Path) -> Result<(), TradesimError>;
}
