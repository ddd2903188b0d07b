//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::comparator::{ComparisonReport, StrategyFailure, compare_strategies};
use crate::domain::config_validation::{
    BACKTEST_SECTION, strategy_sections, validate_backtest_config, validate_strategy_section,
};
use crate::domain::error::TradesimError;
use crate::domain::indicator::IndicatorPeriods;
use crate::domain::rule::{RuleSet, format_conditions};
use crate::domain::rule_parser;
use crate::domain::strategy::{StrategyCatalog, StrategyConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Indicator strategy backtester")]
pub struct Cli {
    /// Log filter (e.g. info, debug, tradesim=trace); RUST_LOG wins when set
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one strategy
    Backtest {
        /// CSV file, or a directory holding <SYMBOL>.csv
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        strategy: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        /// Write the trade log as CSV
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// Backtest several strategies and rank them by Sharpe ratio
    Compare {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        /// Comma-separated strategy keys; all when omitted
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<String>,
    },
    /// List available strategies
    List {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            data,
            strategy,
            config,
            symbol,
            export,
        } => run_backtest(
            &data,
            &strategy,
            config.as_deref(),
            symbol.as_deref(),
            export.as_deref(),
        ),
        Command::Compare {
            data,
            config,
            symbol,
            strategies,
        } => run_compare(&data, config.as_deref(), symbol.as_deref(), &strategies),
        Command::List { config } => run_list(config.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn load_optional_config(path: Option<&Path>) -> Result<Option<FileConfigAdapter>, TradesimError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let adapter = FileConfigAdapter::from_file(path)?;
            validate_backtest_config(&adapter)?;
            Ok(Some(adapter))
        }
        None => Ok(None),
    }
}

fn run_backtest(
    data: &Path,
    strategy_key: &str,
    config_path: Option<&Path>,
    symbol: Option<&str>,
    export: Option<&Path>,
) -> Result<(), TradesimError> {
    let adapter = load_optional_config(config_path)?;
    let (catalog, failures) = build_catalog(adapter.as_ref().map(|a| a as &dyn ConfigPort));
    let bt_config = build_backtest_config(adapter.as_ref().map(|a| a as &dyn ConfigPort), symbol);

    if let Some(failure) = failures.into_iter().find(|f| f.name == strategy_key) {
        return Err(failure.error);
    }
    let strategy = catalog
        .get(strategy_key)
        .ok_or_else(|| TradesimError::UnknownStrategy {
            name: strategy_key.to_string(),
        })?;
    eprintln!("Loading strategy: {}", strategy.name);

    let csv = CsvAdapter::new(data.to_path_buf());
    let bars = csv.fetch_bars(&bt_config.symbol)?;
    eprintln!("Running backtest: {} bars of {}", bars.len(), bt_config.symbol);

    let result = backtest_engine::run_backtest(&bars, strategy, &bt_config)?;
    print_summary(&result);

    if let Some(path) = export {
        csv.write_trades(&result.trade_log, path)?;
        eprintln!("\nTrade log written to: {}", path.display());
    }
    Ok(())
}

fn run_compare(
    data: &Path,
    config_path: Option<&Path>,
    symbol: Option<&str>,
    names: &[String],
) -> Result<(), TradesimError> {
    let adapter = load_optional_config(config_path)?;
    let (catalog, mut failures) = build_catalog(adapter.as_ref().map(|a| a as &dyn ConfigPort));
    let bt_config = build_backtest_config(adapter.as_ref().map(|a| a as &dyn ConfigPort), symbol);

    let csv = CsvAdapter::new(data.to_path_buf());
    let bars = csv.fetch_bars(&bt_config.symbol)?;

    let names: Vec<String> = names
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if !names.is_empty() {
        failures.retain(|f| names.contains(&f.name));
    }
    let runnable: Vec<String> = if names.is_empty() {
        catalog.keys().map(str::to_string).collect()
    } else {
        names
            .into_iter()
            .filter(|n| !failures.iter().any(|f| &f.name == n))
            .collect()
    };
    eprintln!(
        "Comparing {} strategies on {} bars of {}",
        runnable.len() + failures.len(),
        bars.len(),
        bt_config.symbol
    );

    let mut report = if runnable.is_empty() {
        ComparisonReport::default()
    } else {
        compare_strategies(&bars, &catalog, &runnable, &bt_config)?
    };
    report.prepend_failures(failures);
    print_comparison(&report);

    if report.rows.is_empty() {
        if let Some(failure) = report.failures.into_iter().next() {
            return Err(failure.error);
        }
    }
    Ok(())
}

fn run_list(config_path: Option<&Path>) -> Result<(), TradesimError> {
    let adapter = load_optional_config(config_path)?;
    let (catalog, failures) = build_catalog(adapter.as_ref().map(|a| a as &dyn ConfigPort));

    for (key, strategy) in catalog.iter() {
        println!("{:<16} {}", key, strategy.name);
        println!("{:<16}   buy:  {}", "", format_conditions(&strategy.rules.buy));
        println!("{:<16}   sell: {}", "", format_conditions(&strategy.rules.sell));
    }
    for failure in &failures {
        eprintln!("skipped {}: {}", failure.name, failure.error);
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TradesimError> {
    let adapter = load_optional_config(Some(config_path))?;
    let (catalog, failures) = build_catalog(adapter.as_ref().map(|a| a as &dyn ConfigPort));
    if let Some(failure) = failures.into_iter().next() {
        return Err(failure.error);
    }
    eprintln!("Config validated successfully");
    eprintln!("  Strategies: {}", catalog.keys().collect::<Vec<_>>().join(", "));
    Ok(())
}

/// `[backtest]` values over defaults; `symbol_override` beats the file.
pub fn build_backtest_config(
    adapter: Option<&dyn ConfigPort>,
    symbol_override: Option<&str>,
) -> BacktestConfig {
    let defaults = BacktestConfig::default();
    let Some(adapter) = adapter else {
        return BacktestConfig {
            symbol: symbol_override.map(str::to_string).unwrap_or(defaults.symbol),
            ..defaults
        };
    };

    let symbol = symbol_override
        .map(str::to_string)
        .or_else(|| adapter.get_string(BACKTEST_SECTION, "symbol"))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(defaults.symbol);

    BacktestConfig {
        symbol,
        period: adapter.get_string(BACKTEST_SECTION, "period"),
        initial_capital: adapter.get_double(
            BACKTEST_SECTION,
            "initial_capital",
            defaults.initial_capital,
        ),
        position_size: adapter.get_double(BACKTEST_SECTION, "position_size", defaults.position_size),
        commission_rate: adapter.get_double(
            BACKTEST_SECTION,
            "commission",
            defaults.commission_rate,
        ),
    }
}

fn get_period(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TradesimError> {
    let value = adapter.get_int(section, key, default as i64);
    usize::try_from(value)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or_else(|| TradesimError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be at least 1", key),
        })
}

fn parse_rule_list(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<crate::domain::rule::Condition>, TradesimError> {
    let text = adapter.get_string(section, key).unwrap_or_default();
    rule_parser::parse(&text).map_err(|e| {
        eprintln!(
            "error: failed to parse [{}] {}:\n{}",
            section,
            key,
            e.display_with_context(&text)
        );
        TradesimError::from(e)
    })
}

/// Build one strategy from a `[strategy.<key>]` section.
pub fn build_strategy(
    adapter: &dyn ConfigPort,
    key: &str,
    section: &str,
) -> Result<StrategyConfig, TradesimError> {
    validate_strategy_section(adapter, section)?;
    let defaults = IndicatorPeriods::default();
    let periods = IndicatorPeriods {
        rsi: get_period(adapter, section, "rsi_period", defaults.rsi)?,
        ma_short: get_period(adapter, section, "ma_short", defaults.ma_short)?,
        ma_medium: get_period(adapter, section, "ma_medium", defaults.ma_medium)?,
        ma_long: get_period(adapter, section, "ma_long", defaults.ma_long)?,
        bollinger_period: get_period(
            adapter,
            section,
            "bollinger_period",
            defaults.bollinger_period,
        )?,
        bollinger_k: adapter.get_double(section, "bollinger_k", defaults.bollinger_k),
    };

    let strategy = StrategyConfig {
        name: adapter
            .get_string(section, "name")
            .unwrap_or_else(|| key.to_string()),
        periods,
        rules: RuleSet::new(
            parse_rule_list(adapter, section, "buy")?,
            parse_rule_list(adapter, section, "sell")?,
        ),
    };
    strategy.validate()?;
    Ok(strategy)
}

/// Strategy sections of the config, or the built-in catalog when there are none.
///
/// Each section is built on its own; one that fails is returned as a
/// `StrategyFailure` named by its key and left out of the catalog.
pub fn build_catalog(adapter: Option<&dyn ConfigPort>) -> (StrategyCatalog, Vec<StrategyFailure>) {
    let sections = adapter.map(strategy_sections).unwrap_or_default();
    let Some(adapter) = adapter.filter(|_| !sections.is_empty()) else {
        return (StrategyCatalog::builtin(), Vec::new());
    };

    let mut catalog = StrategyCatalog::new();
    let mut failures = Vec::new();
    for (key, section) in &sections {
        match build_strategy(adapter, key, section) {
            Ok(strategy) => catalog.insert(key, strategy),
            Err(error) => {
                tracing::warn!(strategy = %key, %error, "strategy section skipped");
                failures.push(StrategyFailure {
                    name: key.clone(),
                    error,
                });
            }
        }
    }
    (catalog, failures)
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== {} ===", result.strategy_name);
    eprintln!("Symbol:           {}", result.symbol);
    eprintln!("Period:           {}", result.period);
    eprintln!("Total Return:     {:.2}%", m.total_return);
    eprintln!("Win Rate:         {:.1}%", m.win_rate);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Max Drawdown:     {:.2}%", m.max_drawdown);
    eprintln!("Total Trades:     {}", m.total_trades);
    eprintln!("Avg Profit/Trade: {:.2}%", m.avg_profit_per_trade);
    eprintln!("Best Trade:       {:.2}%", m.best_trade);
    eprintln!("Worst Trade:      {:.2}%", m.worst_trade);
    eprintln!("Buy & Hold:       {:.2}%", m.buy_hold_return);
    eprintln!("Final Equity:     ${:.2}", result.final_equity);
}

fn print_comparison(report: &ComparisonReport) {
    eprintln!(
        "\n{:<4} {:<34} {:>9} {:>8} {:>7} {:>8} {:>6} {:>9}",
        "#", "Strategy", "Return", "Win", "Sharpe", "MaxDD", "Trades", "B&H"
    );
    for (rank, row) in report.rows.iter().enumerate() {
        eprintln!(
            "{:<4} {:<34} {:>8.2}% {:>7.1}% {:>7.2} {:>7.2}% {:>6} {:>8.2}%",
            rank + 1,
            row.name,
            row.total_return,
            row.win_rate,
            row.sharpe_ratio,
            row.max_drawdown,
            row.trades,
            row.buy_hold_return,
        );
    }
    if let Some(best) = report.best() {
        eprintln!("\nBest: {} (Sharpe {:.2})", best.name, best.sharpe_ratio);
    }
    if !report.failures.is_empty() {
        eprintln!("\nSkipped:");
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.name, failure.error);
        }
    }
}
