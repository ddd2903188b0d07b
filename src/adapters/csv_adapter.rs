//! CSV price data and trade log adapter.

use crate::domain::error::TradesimError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::position::Trade;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const TRADE_HEADER: [&str; 7] = [
    "Entry Date",
    "Exit Date",
    "Entry Price",
    "Exit Price",
    "Shares",
    "Profit ($)",
    "Profit (%)",
];

/// Reads `<dir>/<SYMBOL>.csv`, or `path` itself when it names a file.
pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        if self.base_path.is_dir() {
            self.base_path.join(format!("{}.csv", symbol))
        } else {
            self.base_path.clone()
        }
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` (or with a space), and epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(ms) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, TradesimError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TradesimError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.deserialize::<BarRow>().enumerate() {
            let row = result.map_err(|e| TradesimError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;
            let timestamp =
                parse_timestamp(&row.timestamp).ok_or_else(|| TradesimError::DataSource {
                    reason: format!(
                        "invalid timestamp '{}' on data row {}",
                        row.timestamp,
                        line + 1
                    ),
                })?;

            let bar = PriceBar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            };
            if !bar.has_valid_prices() {
                return Err(TradesimError::DataSource {
                    reason: format!(
                        "non-positive or non-finite value on data row {} of {}",
                        line + 1,
                        path.display()
                    ),
                });
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);
        tracing::debug!(symbol, path = %path.display(), bars = bars.len(), "loaded price data");
        Ok(bars)
    }
}

impl ReportPort for CsvAdapter {
    fn write_trades(&self, trades: &[Trade], output_path: &Path) -> Result<(), TradesimError> {
        let export_err = |e: csv::Error| TradesimError::Export {
            reason: format!("{}: {}", output_path.display(), e),
        };

        let mut wtr = csv::Writer::from_path(output_path).map_err(export_err)?;
        wtr.write_record(TRADE_HEADER).map_err(export_err)?;
        for trade in trades {
            wtr.write_record([
                format_timestamp(&trade.entry_date),
                format_timestamp(&trade.exit_date),
                format!("{:.2}", trade.entry_price),
                format!("{:.2}", trade.exit_price),
                format!("{:.6}", trade.shares),
                format!("{:.2}", trade.profit),
                format!("{:.2}", trade.profit_percent),
            ])
            .map_err(export_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BTC_CSV: &str = "timestamp,open,high,low,close,volume\n\
        2024-01-16,105.0,115.0,100.0,110.0,60000\n\
        2024-01-15,100.0,110.0,90.0,105.0,50000\n\
        2024-01-17,110.0,120.0,105.0,115.0,55000.5\n";

    fn setup_test_data() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("BTC.csv"), BTC_CSV).unwrap();
        fs::write(
            dir.path().join("EMPTY.csv"),
            "timestamp,open,high,low,close,volume\n",
        )
        .unwrap();
        dir
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn fetch_bars_sorted_ascending() {
        let dir = setup_test_data();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_bars("BTC").unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, ymd(2024, 1, 15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[2].volume, 55000.5);
    }

    #[test]
    fn fetch_bars_from_single_file() {
        let dir = setup_test_data();
        let adapter = CsvAdapter::new(dir.path().join("BTC.csv"));
        let bars = adapter.fetch_bars("ANYTHING").unwrap();
        assert_eq!(bars.len(), 3);
    }

    #[test]
    fn empty_file_gives_no_bars() {
        let dir = setup_test_data();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(adapter.fetch_bars("EMPTY").unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_data_source_error() {
        let dir = setup_test_data();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("XYZ").unwrap_err();
        assert!(matches!(err, TradesimError::DataSource { .. }));
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "timestamp,open,high,low,close,volume\n15/01/2024,1,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("BAD").unwrap_err();
        assert!(err.to_string().contains("15/01/2024"));
    }

    #[test]
    fn nan_close_is_rejected_with_row_number() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("NAN.csv"),
            "timestamp,open,high,low,close,volume\n\
             2024-01-01,100,100,100,100,1\n\
             2024-01-02,90,90,90,NaN,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("NAN").unwrap_err();
        assert!(matches!(err, TradesimError::DataSource { .. }));
        assert!(err.to_string().contains("data row 2"));
    }

    #[test]
    fn infinite_and_non_positive_prices_are_rejected() {
        let dir = TempDir::new().unwrap();
        for (symbol, row) in [
            ("INF", "2024-01-01,100,inf,100,100,1"),
            ("ZERO", "2024-01-01,100,100,100,0,1"),
            ("NEG", "2024-01-01,100,100,-5,100,1"),
        ] {
            fs::write(
                dir.path().join(format!("{symbol}.csv")),
                format!("timestamp,open,high,low,close,volume\n{row}\n"),
            )
            .unwrap();
        }
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        for symbol in ["INF", "ZERO", "NEG"] {
            let err = adapter.fetch_bars(symbol).unwrap_err();
            assert!(err.to_string().contains("data row 1"), "{symbol}: {err}");
        }
    }

    #[test]
    fn parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(
            parse_timestamp("2024-01-15T09:30:00"),
            ymd(2024, 1, 15).date().and_hms_opt(9, 30, 0)
        );
        // 2024-01-15T00:00:00Z
        assert_eq!(parse_timestamp("1705276800000"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn write_trades_has_seven_columns() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("trades.csv");
        let trades = vec![
            Trade {
                entry_date: ymd(2024, 1, 5),
                exit_date: ymd(2024, 1, 7),
                entry_price: 105.0,
                exit_price: 96.0,
                shares: 1.9029,
                profit: -17.2,
                profit_percent: -8.6,
            },
            Trade {
                entry_date: ymd(2024, 1, 10),
                exit_date: ymd(2024, 1, 10),
                entry_price: 103.0,
                exit_price: 103.0,
                shares: 1.8,
                profit: -0.4,
                profit_percent: -0.2,
            },
        ];

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        adapter.write_trades(&trades, &out).unwrap();

        let mut rdr = csv::Reader::from_path(&out).unwrap();
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, TRADE_HEADER);

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 7);
        assert_eq!(&rows[0][0], "2024-01-05 00:00:00");
        assert_eq!(&rows[0][2], "105.00");
        assert_eq!(&rows[0][6], "-8.60");
        assert_eq!(&rows[1][1], "2024-01-10 00:00:00");
    }

    #[test]
    fn write_trades_to_missing_directory_fails() {
        let adapter = CsvAdapter::new(PathBuf::from("."));
        let err = adapter
            .write_trades(&[], Path::new("/nonexistent/dir/trades.csv"))
            .unwrap_err();
        assert!(matches!(err, TradesimError::Export { .. }));
    }
}
