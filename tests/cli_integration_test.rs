//! CLI integration tests: real INI and CSV files on disk, all three modes.
//!
//! Bars are dated so the series ends today, since a run stamps itself with
//! the local clock and fetches history backwards from it.

mod common;

use chrono::{Duration, Local};
use common::*;
use crosswatch::cli::{self, Cli, Mode};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn reports(&self) -> PathBuf {
        self.path().join("reports")
    }

    fn write_symbol(&self, symbol: &str, closes: &[f64]) {
        let today = Local::now().date_naive();
        let start = today - Duration::days(closes.len() as i64 - 1);
        let mut content = String::from("date,open,high,low,close,volume\n");
        for (i, close) in closes.iter().enumerate() {
            let date = start + Duration::days(i as i64);
            content.push_str(&format!(
                "{},{},{},{},{},{}\n",
                date,
                close,
                close + 1.0,
                close - 1.0,
                close,
                100_000 + i * 1000
            ));
        }
        fs::write(self.path().join("data").join(format!("{}.csv", symbol)), content).unwrap();
    }

    fn write_config(&self, symbols: &str, extra: &str) -> PathBuf {
        let path = self.path().join("crosswatch.ini");
        let content = format!(
            "[run]\nsymbols = {}\n\n[data]\nsource = csv\ncsv_dir = {}\n\n[report]\noutput_dir = {}\n\n{}",
            symbols,
            self.path().join("data").display(),
            self.reports().display(),
            extra
        );
        fs::write(&path, content).unwrap();
        path
    }

    fn read_report(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.reports().join(name))
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }
}

fn cli(config: PathBuf, mode: Mode) -> Cli {
    Cli {
        config,
        mode,
        symbols: None,
        window: None,
        verbose: false,
    }
}

mod backtest_mode {
    use super::*;

    #[test]
    fn writes_trade_log_and_summaries() {
        let ws = Workspace::new();
        ws.write_symbol("TCS.NS", &scenario_closes());
        let config = ws.write_config("tcs.ns", "");

        let code = cli::run(cli(config, Mode::Backtest));

        assert_eq!(code, ExitCode::SUCCESS);
        let trades = ws.read_report("backtest_log.csv");
        assert_eq!(trades.len(), 2);
        assert!(trades[0].starts_with("run_at,symbol,entry_date,entry_price"));
        assert!(trades[1].contains(",TCS.NS,"));
        assert!(trades[1].ends_with(",Win,max_hold,5"));

        let summary = ws.read_report("summary.csv");
        assert_eq!(summary.len(), 3);
        assert!(summary[1].contains(",TCS.NS,1,1,1.0,"));
        assert!(summary[2].contains(",ALL,1,1,1.0,"));
    }

    #[test]
    fn repeated_runs_append_without_new_header() {
        let ws = Workspace::new();
        ws.write_symbol("TCS.NS", &scenario_closes());
        let config = ws.write_config("TCS.NS", "");

        assert_eq!(cli::run(cli(config.clone(), Mode::Backtest)), ExitCode::SUCCESS);
        assert_eq!(cli::run(cli(config, Mode::Backtest)), ExitCode::SUCCESS);

        let trades = ws.read_report("backtest_log.csv");
        assert_eq!(trades.len(), 3);
        assert_eq!(trades.iter().filter(|l| l.starts_with("run_at")).count(), 1);
    }

    #[test]
    fn window_override_excludes_signal() {
        let ws = Workspace::new();
        ws.write_symbol("TCS.NS", &scenario_closes());
        let config = ws.write_config("TCS.NS", "");

        let mut args = cli(config, Mode::Backtest);
        args.window = Some(10);
        assert_eq!(cli::run(args), ExitCode::SUCCESS);

        assert!(!ws.reports().join("backtest_log.csv").exists());
        let summary = ws.read_report("summary.csv");
        assert!(summary[2].contains(",ALL,0,0,0.0,0.0,0"));
    }

    #[test]
    fn partial_failure_still_succeeds() {
        let ws = Workspace::new();
        ws.write_symbol("TCS.NS", &scenario_closes());
        let config = ws.write_config("TCS.NS,MISSING.NS", "");

        assert_eq!(cli::run(cli(config, Mode::Backtest)), ExitCode::SUCCESS);
    }

    #[test]
    fn all_symbols_missing_exits_5() {
        let ws = Workspace::new();
        let config = ws.write_config("MISSING.NS,ALSO.NS", "");

        assert_eq!(cli::run(cli(config, Mode::Backtest)), ExitCode::from(5));
    }

    #[test]
    fn symbols_override_replaces_config() {
        let ws = Workspace::new();
        ws.write_symbol("TCS.NS", &scenario_closes());
        let config = ws.write_config("MISSING.NS", "");

        let mut args = cli(config, Mode::Backtest);
        args.symbols = Some("tcs.ns".into());
        assert_eq!(cli::run(args), ExitCode::SUCCESS);
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_sink {
    use super::*;

    #[test]
    fn backtest_rows_land_in_database() {
        let ws = Workspace::new();
        ws.write_symbol("TCS.NS", &scenario_closes());
        let db = ws.path().join("crosswatch.db");
        let extra = format!("[sqlite]\npath = {}\n", db.display());
        let config = ws.write_config("TCS.NS", &extra);
        let content = fs::read_to_string(&config)
            .unwrap()
            .replace("[report]\n", "[report]\nsink = sqlite\n");
        fs::write(&config, content).unwrap();

        assert_eq!(cli::run(cli(config.clone(), Mode::Backtest)), ExitCode::SUCCESS);

        assert!(!ws.reports().exists());
        let conn = rusqlite::Connection::open(&db).unwrap();
        let count = |sql: &str| -> i64 { conn.query_row(sql, [], |row| row.get(0)).unwrap() };
        assert_eq!(count("SELECT COUNT(*) FROM backtest_log"), 1);
        assert_eq!(count("SELECT COUNT(*) FROM summary"), 2);
        assert_eq!(
            count("SELECT COUNT(*) FROM summary WHERE symbol = 'ALL' AND total_trades = 1"),
            1
        );
    }
}

mod live_mode {
    use super::*;

    #[test]
    fn writes_latest_signal() {
        let ws = Workspace::new();
        ws.write_symbol("INFY.NS", &scenario_closes()[..=SCENARIO_BUY_INDEX]);
        ws.write_symbol("TCS.NS", &scenario_closes());
        let config = ws.write_config("INFY.NS,TCS.NS", "");

        assert_eq!(cli::run(cli(config, Mode::Live)), ExitCode::SUCCESS);

        let signals = ws.read_report("trade_signals.csv");
        assert_eq!(signals.len(), 3);
        assert_eq!(signals[0], "run_at,date,symbol,rsi,ma_fast,ma_slow,signal");
        assert!(signals[1].contains(",INFY.NS,24.87,100.75,100.3,BUY"));
        assert!(signals[2].contains(",TCS.NS,") && signals[2].ends_with(",HOLD"));
    }

    #[test]
    fn short_history_still_succeeds() {
        let ws = Workspace::new();
        ws.write_symbol("NEW.NS", &[100.0; 5]);
        let config = ws.write_config("NEW.NS", "");

        assert_eq!(cli::run(cli(config, Mode::Live)), ExitCode::SUCCESS);
        assert!(!ws.reports().join("trade_signals.csv").exists());
    }
}

mod ml_mode {
    use super::*;

    #[test]
    fn trains_on_csv_history() {
        let ws = Workspace::new();
        ws.write_symbol("TCS.NS", &scenario_closes());
        let config = ws.write_config("TCS.NS", "[ml]\nepochs = 50\n");

        assert_eq!(cli::run(cli(config, Mode::Ml)), ExitCode::SUCCESS);
    }

    #[test]
    fn insufficient_history_exits_5() {
        let ws = Workspace::new();
        ws.write_symbol("NEW.NS", &[100.0; 20]);
        let config = ws.write_config("NEW.NS", "");

        assert_eq!(cli::run(cli(config, Mode::Ml)), ExitCode::from(5));
    }
}

mod configuration_errors {
    use super::*;

    #[test]
    fn missing_config_file_exits_2() {
        let ws = Workspace::new();
        let code = cli::run(cli(ws.path().join("nope.ini"), Mode::Live));
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn invalid_value_exits_2_before_fetching() {
        let ws = Workspace::new();
        ws.write_symbol("TCS.NS", &scenario_closes());
        let config = ws.write_config("TCS.NS", "[exit]\nrsi_exit = 150\n");

        assert_eq!(cli::run(cli(config, Mode::Backtest)), ExitCode::from(2));
        assert!(!ws.reports().exists());
    }

    #[test]
    fn duplicate_symbol_override_exits_2() {
        let ws = Workspace::new();
        let config = ws.write_config("TCS.NS", "");

        let mut args = cli(config, Mode::Live);
        args.symbols = Some("TCS.NS,tcs.ns".into());
        assert_eq!(cli::run(args), ExitCode::from(2));
    }

    #[test]
    fn zero_window_override_exits_2() {
        let ws = Workspace::new();
        let config = ws.write_config("TCS.NS", "");

        let mut args = cli(config, Mode::Backtest);
        args.window = Some(0);
        assert_eq!(cli::run(args), ExitCode::from(2));
    }
}
