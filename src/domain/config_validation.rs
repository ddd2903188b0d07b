//! Configuration validation.
//!
//! Checks the `[backtest]` section and individual `[strategy.<key>]`
//! sections before anything runs.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;

pub const BACKTEST_SECTION: &str = "backtest";
pub const STRATEGY_PREFIX: &str = "strategy.";

const PERIOD_KEYS: [&str; 5] = [
    "rsi_period",
    "ma_short",
    "ma_medium",
    "ma_long",
    "bollinger_period",
];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let defaults = BacktestConfig::default();
    BacktestConfig {
        initial_capital: config.get_double(
            BACKTEST_SECTION,
            "initial_capital",
            defaults.initial_capital,
        ),
        position_size: config.get_double(BACKTEST_SECTION, "position_size", defaults.position_size),
        commission_rate: config.get_double(BACKTEST_SECTION, "commission", defaults.commission_rate),
        ..defaults
    }
    .validate()
}

/// `(key, section)` pairs for each strategy section, in file order.
pub fn strategy_sections(config: &dyn ConfigPort) -> Vec<(String, String)> {
    config
        .sections()
        .into_iter()
        .filter_map(|section| {
            let key = section.strip_prefix(STRATEGY_PREFIX)?.trim().to_string();
            if key.is_empty() {
                None
            } else {
                Some((key, section))
            }
        })
        .collect()
}

/// Periods at least 1, a non-negative band width, and non-empty `buy` and `sell`.
pub fn validate_strategy_section(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<(), TradesimError> {
    for key in PERIOD_KEYS {
        if config.get_int(section, key, 1) < 1 {
            return Err(TradesimError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("{} must be at least 1", key),
            });
        }
    }

    let k = config.get_double(section, "bollinger_k", 2.0);
    if !k.is_finite() || k < 0.0 {
        return Err(TradesimError::ConfigInvalid {
            section: section.to_string(),
            key: "bollinger_k".to_string(),
            reason: "bollinger_k must be non-negative".to_string(),
        });
    }

    for key in ["buy", "sell"] {
        match config.get_string(section, key) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(TradesimError::ConfigMissing {
                    section: section.to_string(),
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}
