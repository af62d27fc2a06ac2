//! SQLite adapter: daily bars in, signal/trade/summary tables out.

use crate::domain::error::CrosswatchError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::record::{SignalRecord, SummaryRecord, TradeRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportSink;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CrosswatchError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| CrosswatchError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| CrosswatchError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, CrosswatchError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| CrosswatchError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, CrosswatchError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| CrosswatchError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), CrosswatchError> {
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ohlcv (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (symbol, date)
            );
            CREATE TABLE IF NOT EXISTS trade_signals (
                run_at TEXT NOT NULL,
                date TEXT NOT NULL,
                symbol TEXT NOT NULL,
                rsi REAL,
                ma_fast REAL,
                ma_slow REAL,
                signal TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS backtest_log (
                run_at TEXT NOT NULL,
                symbol TEXT NOT NULL,
                entry_date TEXT NOT NULL,
                entry_price REAL NOT NULL,
                exit_date TEXT NOT NULL,
                exit_price REAL NOT NULL,
                return_pct REAL NOT NULL,
                outcome TEXT NOT NULL,
                exit_reason TEXT NOT NULL,
                bars_held INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS summary (
                run_at TEXT NOT NULL,
                symbol TEXT NOT NULL,
                total_trades INTEGER NOT NULL,
                wins INTEGER NOT NULL,
                win_ratio REAL NOT NULL,
                average_return REAL NOT NULL,
                forced_exits INTEGER NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| CrosswatchError::Database {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    pub fn insert_bars(&self, bars: &[OhlcvBar]) -> Result<(), CrosswatchError> {
        let mut conn = self.connection()?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| CrosswatchError::Database {
                reason: e.to_string(),
            })?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (symbol, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.symbol,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume as i64
                ],
            )
            .map_err(|e: rusqlite::Error| CrosswatchError::Database {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| CrosswatchError::Database {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

fn sink_error(table: &str, e: rusqlite::Error) -> CrosswatchError {
    CrosswatchError::SinkWrite {
        sink: format!("sqlite:{}", table),
        reason: e.to_string(),
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, CrosswatchError> {
        let unavailable = |e: rusqlite::Error| CrosswatchError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        };

        let conn = self.connection()?;

        let start_str = start_date.format(DATE_FORMAT).to_string();
        let end_str = end_date.format(DATE_FORMAT).to_string();

        let query = "SELECT symbol, date, open, high, low, close, volume
                     FROM ohlcv
                     WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC";

        let mut stmt = conn.prepare(query).map_err(unavailable)?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                let volume: i64 = row.get(6)?;
                Ok(OhlcvBar {
                    symbol: row.get(0)?,
                    date,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: volume.max(0) as u64,
                })
            })
            .map_err(unavailable)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(unavailable)?);
        }

        Ok(bars)
    }
}

impl ReportSink for SqliteAdapter {
    fn write_signals(&self, records: &[SignalRecord]) -> Result<(), CrosswatchError> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| sink_error("trade_signals", e))?;

        for record in records {
            tx.execute(
                "INSERT INTO trade_signals (run_at, date, symbol, rsi, ma_fast, ma_slow, signal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.run_at,
                    record.date.format(DATE_FORMAT).to_string(),
                    record.symbol,
                    record.rsi,
                    record.ma_fast,
                    record.ma_slow,
                    record.signal
                ],
            )
            .map_err(|e| sink_error("trade_signals", e))?;
        }

        tx.commit().map_err(|e| sink_error("trade_signals", e))
    }

    fn write_trades(&self, records: &[TradeRecord]) -> Result<(), CrosswatchError> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| sink_error("backtest_log", e))?;

        for record in records {
            tx.execute(
                "INSERT INTO backtest_log (run_at, symbol, entry_date, entry_price, exit_date,
                     exit_price, return_pct, outcome, exit_reason, bars_held)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.run_at,
                    record.symbol,
                    record.entry_date.format(DATE_FORMAT).to_string(),
                    record.entry_price,
                    record.exit_date.format(DATE_FORMAT).to_string(),
                    record.exit_price,
                    record.return_pct,
                    record.outcome,
                    record.exit_reason,
                    record.bars_held as i64
                ],
            )
            .map_err(|e| sink_error("backtest_log", e))?;
        }

        tx.commit().map_err(|e| sink_error("backtest_log", e))
    }

    fn write_summary(&self, record: &SummaryRecord) -> Result<(), CrosswatchError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO summary (run_at, symbol, total_trades, wins, win_ratio,
                 average_return, forced_exits)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.run_at,
                record.symbol,
                record.total_trades as i64,
                record.wins as i64,
                record.win_ratio,
                record.average_return,
                record.forced_exits as i64
            ],
        )
        .map_err(|e| sink_error("summary", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::metrics::Summary;
    use crate::domain::record::{RunStamp, ALL_SYMBOLS};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(symbol: &str, date: NaiveDate, close: f64) -> OhlcvBar {
        OhlcvBar {
            symbol: symbol.to_string(),
            date,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn count_rows(adapter: &SqliteAdapter, table: &str) -> i64 {
        let sql = match table {
            "trade_signals" => "SELECT COUNT(*) FROM trade_signals",
            "backtest_log" => "SELECT COUNT(*) FROM backtest_log",
            "summary" => "SELECT COUNT(*) FROM summary",
            other => panic!("unknown table {other}"),
        };
        adapter
            .connection()
            .unwrap()
            .query_row(sql, [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn from_config_missing_path() {
        let config = FileConfigAdapter::from_string("[run]\nsymbols = TCS.NS\n").unwrap();
        match SqliteAdapter::from_config(&config) {
            Err(CrosswatchError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
        assert_eq!(count_rows(&adapter, "summary"), 0);
    }

    #[test]
    fn fetch_bars_filters_and_orders() {
        let adapter = adapter();
        adapter
            .insert_bars(&[
                bar("TCS.NS", date(2024, 1, 3), 102.0),
                bar("TCS.NS", date(2024, 1, 1), 100.0),
                bar("TCS.NS", date(2024, 1, 2), 101.0),
                bar("INFY.NS", date(2024, 1, 2), 50.0),
            ])
            .unwrap();

        let fetched = adapter
            .fetch_bars("TCS.NS", date(2024, 1, 1), date(2024, 1, 2))
            .unwrap();

        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].date, date(2024, 1, 1));
        assert_eq!(fetched[1].close, 101.0);
        assert_eq!(fetched[1].volume, 1000);
    }

    #[test]
    fn fetch_unknown_symbol_is_empty() {
        let adapter = adapter();
        let fetched = adapter
            .fetch_bars("NOPE.NS", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();
        assert!(fetched.is_empty());
    }

    #[test]
    fn fetch_without_schema_is_unavailable() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        let err = adapter
            .fetch_bars("TCS.NS", date(2024, 1, 1), date(2024, 1, 2))
            .unwrap_err();
        assert!(matches!(err, CrosswatchError::DataUnavailable { .. }));
    }

    #[test]
    fn report_rows_are_appended() {
        let adapter = adapter();
        let run = RunStamp::new(date(2024, 6, 3).and_hms_opt(16, 0, 0).unwrap());
        let signal = SignalRecord {
            run_at: "2024-06-03 16:00:00".into(),
            date: date(2024, 6, 3),
            symbol: "INFY.NS".into(),
            rsi: Some(27.5),
            ma_fast: None,
            ma_slow: None,
            signal: "HOLD".into(),
        };

        adapter.write_signals(&[signal.clone(), signal]).unwrap();
        adapter
            .write_summary(&SummaryRecord::new(&run, ALL_SYMBOLS, &Summary::empty()))
            .unwrap();
        adapter.write_trades(&[]).unwrap();

        assert_eq!(count_rows(&adapter, "trade_signals"), 2);
        assert_eq!(count_rows(&adapter, "summary"), 1);
        assert_eq!(count_rows(&adapter, "backtest_log"), 0);
    }

    #[test]
    fn write_without_schema_is_sink_error() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        let run = RunStamp::new(date(2024, 6, 3).and_hms_opt(16, 0, 0).unwrap());
        let err = adapter
            .write_summary(&SummaryRecord::new(&run, ALL_SYMBOLS, &Summary::empty()))
            .unwrap_err();
        assert!(matches!(err, CrosswatchError::SinkWrite { .. }));
    }
}
