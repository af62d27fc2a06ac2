//! Run orchestration for the live, backtest and ml modes.
//!
//! Each symbol is fetched and processed on its own: a failure is logged,
//! recorded as skipped and never stops the remaining symbols. Sink and alert
//! deliveries are best-effort and only logged on failure.

use crate::domain::alert::{format_backtest_alert, format_live_alert, format_ml_alert};
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::error::CrosswatchError;
use crate::domain::frame::IndicatorFrame;
use crate::domain::metrics::{Summary, SymbolSummary};
use crate::domain::ml::{train_and_evaluate, MlConfig, ModelReport};
use crate::domain::ohlcv::{validate_series, OhlcvBar};
use crate::domain::record::{RunStamp, SignalRecord, SummaryRecord, TradeRecord, ALL_SYMBOLS};
use crate::domain::signal::Signal;
use crate::ports::alert_port::AlertPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportSink;
use chrono::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BACKTEST_HISTORY_DAYS: i64 = 730;
pub const DEFAULT_LIVE_HISTORY_DAYS: i64 = 182;
pub const DEFAULT_ML_HISTORY_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub symbols: Vec<String>,
    pub backtest: BacktestConfig,
    pub backtest_history_days: i64,
    pub live_history_days: i64,
    pub ml: MlConfig,
    pub ml_history_days: i64,
}

impl PipelineSettings {
    pub fn new(symbols: Vec<String>) -> Self {
        Self {
            symbols,
            backtest: BacktestConfig::default(),
            backtest_history_days: DEFAULT_BACKTEST_HISTORY_DAYS,
            live_history_days: DEFAULT_LIVE_HISTORY_DAYS,
            ml: MlConfig::default(),
            ml_history_days: DEFAULT_ML_HISTORY_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub processed: Vec<String>,
    pub skipped: Vec<SkippedSymbol>,
}

impl RunReport {
    /// True when symbols were requested and none could be processed.
    pub fn all_failed(&self) -> bool {
        self.processed.is_empty() && !self.skipped.is_empty()
    }

    fn record<T>(&mut self, symbol: &str, outcome: Result<T, CrosswatchError>) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.processed.push(symbol.to_string());
                Some(value)
            }
            Err(e) => {
                warn!(symbol, error = %e, "skipping symbol");
                self.skipped.push(SkippedSymbol {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveRun {
    pub report: RunReport,
    pub signals: Vec<Signal>,
    /// Processed symbols whose latest bar lacked RSI or either moving average.
    pub unavailable: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRun {
    pub report: RunReport,
    pub results: Vec<BacktestResult>,
    pub summary: Summary,
    pub per_symbol: Vec<SymbolSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MlRun {
    pub report: RunReport,
    pub models: Vec<ModelReport>,
}

/// Fetch, validate and compute indicators for one symbol.
pub fn load_symbol(
    data: &dyn DataPort,
    symbol: &str,
    run: &RunStamp,
    history_days: i64,
) -> Result<(Vec<OhlcvBar>, IndicatorFrame), CrosswatchError> {
    let end = run.today();
    let start = end - Duration::days(history_days);
    let bars = data.fetch_bars(symbol, start, end)?;
    if bars.is_empty() {
        return Err(CrosswatchError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("no bars between {} and {}", start, end),
        });
    }
    validate_series(symbol, &bars)?;
    debug!(symbol, bars = bars.len(), "loaded bars");
    let frame = IndicatorFrame::compute(symbol, &bars);
    Ok((bars, frame))
}

pub fn run_live_mode(
    data: &dyn DataPort,
    sink: &dyn ReportSink,
    alert: &dyn AlertPort,
    settings: &PipelineSettings,
    run: &RunStamp,
) -> LiveRun {
    let mut report = RunReport::default();
    let mut signals = Vec::new();
    let mut unavailable = Vec::new();

    for symbol in settings.symbols.iter().map(String::as_str) {
        let loaded = load_symbol(data, symbol, run, settings.live_history_days);
        let Some((_, frame)) = report.record(symbol, loaded) else {
            continue;
        };
        match Signal::latest(&frame).filter(Signal::is_evaluable) {
            Some(signal) => {
                info!(symbol, signal = %signal.kind, date = %signal.date, "latest signal");
                signals.push(signal);
            }
            None => {
                info!(symbol, "latest bar lacks indicator history");
                unavailable.push(symbol.to_string());
            }
        }
    }

    let records: Vec<SignalRecord> = signals.iter().map(|s| SignalRecord::new(run, s)).collect();
    if !records.is_empty() {
        deliver("signals", sink.write_signals(&records));
    }
    if !report.processed.is_empty() {
        deliver("alert", alert.send(&format_live_alert(run, &signals, &unavailable)));
    }

    LiveRun {
        report,
        signals,
        unavailable,
    }
}

/// Backtest one symbol over its configured history.
pub fn backtest_symbol(
    data: &dyn DataPort,
    symbol: &str,
    settings: &PipelineSettings,
    run: &RunStamp,
) -> Result<BacktestResult, CrosswatchError> {
    let (bars, frame) = load_symbol(data, symbol, run, settings.backtest_history_days)?;
    let policy = settings.backtest.exit_policy();
    run_backtest(symbol, &bars, &frame, &settings.backtest, &policy)
}

pub fn run_backtest_mode(
    data: &dyn DataPort,
    sink: &dyn ReportSink,
    alert: &dyn AlertPort,
    settings: &PipelineSettings,
    run: &RunStamp,
) -> BacktestRun {
    let mut report = RunReport::default();
    let mut results = Vec::new();

    for symbol in settings.symbols.iter().map(String::as_str) {
        let outcome = backtest_symbol(data, symbol, settings, run);
        if let Some(result) = report.record(symbol, outcome) {
            info!(
                symbol,
                trades = result.trades.len(),
                buys = result.buy_signals.len(),
                "backtest complete"
            );
            results.push(result);
        }
    }

    let trades: Vec<_> = results.iter().flat_map(|r| r.trades.iter().cloned()).collect();
    let summary = Summary::compute(&trades);
    let per_symbol =
        SymbolSummary::compute_per_symbol(results.iter().map(|r| r.symbol.as_str()), &trades);

    if !trades.is_empty() {
        let records: Vec<TradeRecord> = trades.iter().map(|t| TradeRecord::new(run, t)).collect();
        deliver("trades", sink.write_trades(&records));
    }
    if !report.processed.is_empty() {
        for entry in &per_symbol {
            deliver(
                "summary",
                sink.write_summary(&SummaryRecord::new(run, &entry.symbol, &entry.summary)),
            );
        }
        deliver(
            "summary",
            sink.write_summary(&SummaryRecord::new(run, ALL_SYMBOLS, &summary)),
        );
        deliver(
            "alert",
            alert.send(&format_backtest_alert(run, &summary, &per_symbol)),
        );
    }

    info!(
        total_trades = summary.total_trades,
        win_ratio = summary.win_ratio,
        average_return = summary.average_return,
        "backtest summary"
    );

    BacktestRun {
        report,
        results,
        summary,
        per_symbol,
    }
}

pub fn run_ml_mode(
    data: &dyn DataPort,
    alert: &dyn AlertPort,
    settings: &PipelineSettings,
    run: &RunStamp,
) -> MlRun {
    let mut report = RunReport::default();
    let mut models = Vec::new();

    for symbol in settings.symbols.iter().map(String::as_str) {
        let outcome = load_symbol(data, symbol, run, settings.ml_history_days)
            .and_then(|(bars, frame)| train_and_evaluate(symbol, &bars, &frame, &settings.ml));
        if let Some(model) = report.record(symbol, outcome) {
            info!(
                symbol,
                accuracy = model.accuracy,
                test_rows = model.test_rows,
                "model evaluated"
            );
            models.push(model);
        }
    }

    if !models.is_empty() {
        deliver("alert", alert.send(&format_ml_alert(run, &models)));
    }

    MlRun { report, models }
}

fn deliver(channel: &str, outcome: Result<(), CrosswatchError>) {
    if let Err(e) = outcome {
        warn!(channel, error = %e, "delivery failed");
    }
}
