//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::log_alert_adapter::LogAlertAdapter;
use crate::domain::backtest::{BacktestConfig, DEFAULT_WINDOW};
use crate::domain::config_validation::validate_run_config;
use crate::domain::error::CrosswatchError;
use crate::domain::exit_policy::{DEFAULT_MAX_HOLD_BARS, DEFAULT_RSI_EXIT};
use crate::domain::ml::{Direction, MlConfig};
use crate::domain::metrics::SymbolSummary;
use crate::domain::pipeline::{
    run_backtest_mode, run_live_mode, run_ml_mode, BacktestRun, LiveRun, MlRun, PipelineSettings,
    RunReport, DEFAULT_BACKTEST_HISTORY_DAYS, DEFAULT_LIVE_HISTORY_DAYS, DEFAULT_ML_HISTORY_DAYS,
};
use crate::domain::record::{RunStamp, ALL_SYMBOLS};
use crate::domain::universe::parse_symbols;
use crate::ports::alert_port::AlertPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportSink;

/// Overrides `[alert] webhook_url` so the secret can live in `.env`.
pub const WEBHOOK_ENV_VAR: &str = "CROSSWATCH_WEBHOOK_URL";
pub const DEFAULT_OUTPUT_DIR: &str = "reports";
pub const DEFAULT_TIMEOUT_SECS: usize = 30;

#[derive(Parser, Debug)]
#[command(
    name = "crosswatch",
    about = "Daily RSI / moving-average crossover signals, backtests and direction model"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(short, long, value_enum, default_value_t = Mode::Live)]
    pub mode: Mode,
    /// Comma-separated symbols, replacing [run] symbols
    #[arg(long)]
    pub symbols: Option<String>,
    /// Backtest window in bars, replacing [run] backtest_window
    #[arg(long)]
    pub window: Option<usize>,
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Classify the latest bar of each symbol
    Live,
    /// Simulate the signal over the recent window
    Backtest,
    /// Train and evaluate the next-day direction model
    Ml,
}

pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug,crosswatch=debug")
        } else {
            EnvFilter::new("info,crosswatch=info")
        }
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .with(filter)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    info!(config = %cli.config.display(), mode = ?cli.mode, "starting");
    let mut config = match load_config(&cli.config) {
        Ok(c) => c,
        Err(code) => return code,
    };
    apply_overrides(
        &mut config,
        cli.symbols.as_deref(),
        cli.window,
        std::env::var(WEBHOOK_ENV_VAR).ok().as_deref(),
    );

    let settings = match validate_run_config(&config).and_then(|_| build_settings(&config)) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };
    let data = match build_data_port(&config) {
        Ok(d) => d,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };
    let sink = match build_report_sink(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };
    let alert = build_alert_port(&config);
    let stamp = RunStamp::new(Local::now().naive_local());

    execute(cli.mode, data.as_ref(), sink.as_ref(), alert.as_ref(), &settings, &stamp)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        error!("{e}");
        ExitCode::from(&e)
    })
}

/// Fold CLI flags and the webhook environment variable into the loaded
/// config so validation sees the effective values.
pub fn apply_overrides(
    config: &mut FileConfigAdapter,
    symbols: Option<&str>,
    window: Option<usize>,
    webhook_url: Option<&str>,
) {
    if let Some(symbols) = symbols {
        config.set("run", "symbols", symbols);
    }
    if let Some(window) = window {
        config.set("run", "backtest_window", &window.to_string());
    }
    if let Some(url) = webhook_url.filter(|u| !u.trim().is_empty()) {
        config.set("alert", "webhook_url", url);
    }
}

fn positive(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int(section, key, default as i64)).unwrap_or(default)
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<PipelineSettings, CrosswatchError> {
    let raw = config
        .get_string("run", "symbols")
        .ok_or_else(|| CrosswatchError::ConfigMissing {
            section: "run".into(),
            key: "symbols".into(),
        })?;
    let symbols = parse_symbols(&raw).map_err(|e| CrosswatchError::ConfigInvalid {
        section: "run".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    })?;

    Ok(PipelineSettings {
        symbols,
        backtest: BacktestConfig {
            window: positive(config, "run", "backtest_window", DEFAULT_WINDOW),
            rsi_exit: config.get_double("exit", "rsi_exit", DEFAULT_RSI_EXIT),
            max_hold_bars: positive(config, "exit", "max_hold_bars", DEFAULT_MAX_HOLD_BARS),
        },
        backtest_history_days: config.get_int(
            "run",
            "backtest_history_days",
            DEFAULT_BACKTEST_HISTORY_DAYS,
        ),
        live_history_days: config.get_int("run", "live_history_days", DEFAULT_LIVE_HISTORY_DAYS),
        ml: MlConfig {
            train_fraction: config.get_double("ml", "train_fraction", 0.8),
            epochs: positive(config, "ml", "epochs", 500),
            learning_rate: config.get_double("ml", "learning_rate", 0.1),
        },
        ml_history_days: config.get_int("ml", "history_days", DEFAULT_ML_HISTORY_DAYS),
    })
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, CrosswatchError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        #[cfg(feature = "http")]
        "yahoo" => {
            use crate::adapters::yahoo_adapter::{YahooAdapter, DEFAULT_BASE_URL};
            let base_url = config
                .get_string("data", "base_url")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
            let timeout = positive(config, "data", "timeout_secs", DEFAULT_TIMEOUT_SECS);
            Ok(Box::new(YahooAdapter::new(&base_url, timeout as u64)?))
        }
        "csv" => {
            let dir = config
                .get_string("data", "csv_dir")
                .ok_or_else(|| CrosswatchError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(open_sqlite(config)?)),
        other => Err(CrosswatchError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unsupported source '{}'", other),
        }),
    }
}

pub fn build_report_sink(config: &dyn ConfigPort) -> Result<Box<dyn ReportSink>, CrosswatchError> {
    let sink = config
        .get_string("report", "sink")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match sink.as_str() {
        "csv" => Ok(Box::new(csv_report_sink(config))),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(open_sqlite(config)?)),
        other => Err(CrosswatchError::ConfigInvalid {
            section: "report".into(),
            key: "sink".into(),
            reason: format!("unsupported sink '{}'", other),
        }),
    }
}

pub fn csv_report_sink(config: &dyn ConfigPort) -> CsvReportAdapter {
    let dir = config
        .get_string("report", "output_dir")
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());
    CsvReportAdapter::new(PathBuf::from(dir))
}

#[cfg(feature = "sqlite")]
fn open_sqlite(
    config: &dyn ConfigPort,
) -> Result<crate::adapters::sqlite_adapter::SqliteAdapter, CrosswatchError> {
    let adapter = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(adapter)
}

/// Webhook when a URL is configured (and the http feature is on), else the log.
pub fn build_alert_port(config: &dyn ConfigPort) -> Box<dyn AlertPort> {
    let url = config
        .get_string("alert", "webhook_url")
        .filter(|u| !u.trim().is_empty());

    #[cfg(feature = "http")]
    {
        use crate::adapters::webhook_alert_adapter::WebhookAlertAdapter;
        if let Some(url) = url {
            let timeout = positive(config, "data", "timeout_secs", DEFAULT_TIMEOUT_SECS);
            match WebhookAlertAdapter::new(&url, timeout as u64) {
                Ok(adapter) => return Box::new(adapter),
                Err(e) => warn!(error = %e, "webhook unavailable, alerts go to the log"),
            }
        }
    }
    #[cfg(not(feature = "http"))]
    let _ = url;

    Box::new(LogAlertAdapter)
}

/// Run one mode against already-built collaborators and map the outcome to
/// an exit code.
pub fn execute(
    mode: Mode,
    data: &dyn DataPort,
    sink: &dyn ReportSink,
    alert: &dyn AlertPort,
    settings: &PipelineSettings,
    stamp: &RunStamp,
) -> ExitCode {
    let report = match mode {
        Mode::Live => {
            let live = run_live_mode(data, sink, alert, settings, stamp);
            print_live(&live);
            live.report
        }
        Mode::Backtest => {
            let backtest = run_backtest_mode(data, sink, alert, settings, stamp);
            print_backtest(&backtest);
            backtest.report
        }
        Mode::Ml => {
            let ml = run_ml_mode(data, alert, settings, stamp);
            print_ml(&ml);
            ml.report
        }
    };
    exit_code_for(&report)
}

pub fn exit_code_for(report: &RunReport) -> ExitCode {
    for skipped in &report.skipped {
        warn!(symbol = %skipped.symbol, reason = %skipped.reason, "symbol skipped");
    }
    if report.all_failed() {
        error!("no symbol could be processed");
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn print_live(run: &LiveRun) {
    println!(
        "{:<14} {:<10} {:>8} {:>10} {:>10}  Signal",
        "Symbol", "Date", "RSI", "MA20", "MA50"
    );
    for s in &run.signals {
        println!(
            "{:<14} {:<10} {:>8} {:>10} {:>10}  {}",
            s.symbol,
            s.date,
            fmt_opt(s.rsi),
            fmt_opt(s.ma_fast),
            fmt_opt(s.ma_slow),
            s.kind
        );
    }
    for symbol in &run.unavailable {
        println!("{:<14} signal unavailable (insufficient history)", symbol);
    }
}

fn print_backtest(run: &BacktestRun) {
    for result in &run.results {
        println!(
            "{} window {} .. {} ({} bars, {} BUY signals)",
            result.symbol,
            result.window_start.map_or_else(|| "-".into(), |d| d.to_string()),
            result.window_end.map_or_else(|| "-".into(), |d| d.to_string()),
            result.bars_evaluated,
            result.buy_signals.len(),
        );
        for t in &result.trades {
            println!(
                "  {} {:>10.2} -> {} {:>10.2}  {:>+7.2}%  {:<4} {}",
                t.entry_date,
                t.entry_price,
                t.exit_date,
                t.exit_price,
                t.return_pct * 100.0,
                t.outcome,
                t.exit_reason
            );
        }
    }

    println!();
    println!(
        "{:<14} {:>6} {:>5} {:>9} {:>10} {:>7}",
        "Symbol", "Trades", "Wins", "WinRatio", "AvgReturn", "Forced"
    );
    let overall = SymbolSummary {
        symbol: ALL_SYMBOLS.to_string(),
        summary: run.summary.clone(),
    };
    for entry in run.per_symbol.iter().chain(std::iter::once(&overall)) {
        println!(
            "{:<14} {:>6} {:>5} {:>8.1}% {:>+9.2}% {:>7}",
            entry.symbol,
            entry.summary.total_trades,
            entry.summary.wins,
            entry.summary.win_ratio * 100.0,
            entry.summary.average_return * 100.0,
            entry.summary.forced_exits,
        );
    }
}

fn print_ml(run: &MlRun) {
    for model in &run.models {
        let m = &model.confusion;
        println!(
            "{}: accuracy {:.1}% ({} train / {} test rows)",
            model.symbol,
            model.accuracy * 100.0,
            model.train_rows,
            model.test_rows
        );
        println!("  confusion [actual x predicted] DOWN: {:?} UP: {:?}", m.counts[0], m.counts[1]);
        for class in [Direction::Down, Direction::Up] {
            println!(
                "  {:<4} precision {:.2} recall {:.2}",
                class,
                m.precision(class),
                m.recall(class)
            );
        }
        if let (Some(date), Some(direction), Some(p)) = (
            model.latest_date,
            model.latest_prediction,
            model.latest_probability_up,
        ) {
            println!("  next session after {}: {} (p_up {:.2})", date, direction, p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn cli_parses_mode_and_overrides() {
        let cli = Cli::parse_from([
            "crosswatch",
            "--config",
            "c.ini",
            "--mode",
            "backtest",
            "--symbols",
            "tcs.ns",
            "--window",
            "60",
            "-v",
        ]);
        assert_eq!(cli.mode, Mode::Backtest);
        assert_eq!(cli.symbols.as_deref(), Some("tcs.ns"));
        assert_eq!(cli.window, Some(60));
        assert!(cli.verbose);
    }

    #[test]
    fn mode_defaults_to_live() {
        let cli = Cli::parse_from(["crosswatch", "-c", "c.ini"]);
        assert_eq!(cli.mode, Mode::Live);
        assert!(!cli.verbose);
    }

    #[test]
    fn build_settings_defaults() {
        let settings = build_settings(&config("[run]\nsymbols = reliance.ns, infy.ns\n")).unwrap();
        assert_eq!(settings.symbols, vec!["RELIANCE.NS", "INFY.NS"]);
        assert_eq!(settings.backtest, BacktestConfig::default());
        assert_eq!(settings.backtest_history_days, 730);
        assert_eq!(settings.live_history_days, 182);
        assert_eq!(settings.ml, MlConfig::default());
        assert_eq!(settings.ml_history_days, 365);
    }

    #[test]
    fn build_settings_reads_sections() {
        let settings = build_settings(&config(
            "[run]\nsymbols = TCS.NS\nbacktest_window = 60\n[exit]\nrsi_exit = 65\nmax_hold_bars = 10\n[ml]\nepochs = 50\n",
        ))
        .unwrap();
        assert_eq!(settings.backtest.window, 60);
        assert_eq!(settings.backtest.rsi_exit, 65.0);
        assert_eq!(settings.backtest.max_hold_bars, 10);
        assert_eq!(settings.ml.epochs, 50);
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut cfg = config("[run]\nsymbols = TCS.NS\nbacktest_window = 126\n");
        apply_overrides(&mut cfg, Some("infy.ns,wipro.ns"), Some(30), Some("https://hooks.test/x"));
        let settings = build_settings(&cfg).unwrap();
        assert_eq!(settings.symbols, vec!["INFY.NS", "WIPRO.NS"]);
        assert_eq!(settings.backtest.window, 30);
        assert_eq!(
            cfg.get_string("alert", "webhook_url").as_deref(),
            Some("https://hooks.test/x")
        );
    }

    #[test]
    fn blank_webhook_env_is_ignored() {
        let mut cfg = config("[run]\nsymbols = TCS.NS\n");
        apply_overrides(&mut cfg, None, None, Some("  "));
        assert_eq!(cfg.get_string("alert", "webhook_url"), None);
    }

    #[test]
    fn csv_source_without_dir_fails() {
        let err = build_data_port(&config("[data]\nsource = csv\n")).err().unwrap();
        assert!(matches!(err, CrosswatchError::ConfigMissing { .. }));
    }

    #[test]
    fn unknown_source_fails() {
        let err = build_data_port(&config("[data]\nsource = ftp\n")).err().unwrap();
        assert!(matches!(err, CrosswatchError::ConfigInvalid { .. }));
    }

    #[test]
    fn report_sink_uses_output_dir() {
        let sink = csv_report_sink(&config("[report]\noutput_dir = out/daily\n"));
        assert_eq!(sink.output_dir(), Path::new("out/daily"));
        let sink = csv_report_sink(&config("[run]\n"));
        assert_eq!(sink.output_dir(), Path::new(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn unknown_sink_fails() {
        let err = build_report_sink(&config("[report]\nsink = gsheet\n")).err().unwrap();
        assert!(matches!(err, CrosswatchError::ConfigInvalid { .. }));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_sink_and_source_share_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("crosswatch.db");
        let cfg = config(&format!(
            "[data]\nsource = sqlite\n[report]\nsink = sqlite\n[sqlite]\npath = {}\n",
            path.display()
        ));

        assert!(build_report_sink(&cfg).is_ok());
        let data = build_data_port(&cfg).unwrap();
        let today = Local::now().date_naive();
        assert!(data.fetch_bars("TCS.NS", today, today).unwrap().is_empty());
        assert!(path.exists());
    }

    #[test]
    fn exit_code_reflects_failures() {
        use crate::domain::pipeline::SkippedSymbol;

        let mut report = RunReport::default();
        assert_eq!(exit_code_for(&report), ExitCode::SUCCESS);

        report.skipped.push(SkippedSymbol {
            symbol: "XYZ".into(),
            reason: "no data".into(),
        });
        assert_eq!(exit_code_for(&report), ExitCode::from(5));

        report.processed.push("TCS.NS".into());
        assert_eq!(exit_code_for(&report), ExitCode::SUCCESS);
    }
}
