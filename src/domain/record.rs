//! Flat rows handed to the reporting sink, tagged with the run timestamp.

use crate::domain::metrics::Summary;
use crate::domain::position::Trade;
use crate::domain::signal::Signal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Symbol used for the summary row covering every symbol of a run.
pub const ALL_SYMBOLS: &str = "ALL";

/// Timestamp taken once at the start of a run and stamped on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStamp {
    pub started_at: NaiveDateTime,
}

impl RunStamp {
    pub fn new(started_at: NaiveDateTime) -> Self {
        Self { started_at }
    }

    pub fn today(&self) -> NaiveDate {
        self.started_at.date()
    }

    fn label(&self) -> String {
        self.started_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    pub run_at: String,
    pub date: NaiveDate,
    pub symbol: String,
    pub rsi: Option<f64>,
    pub ma_fast: Option<f64>,
    pub ma_slow: Option<f64>,
    pub signal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub run_at: String,
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub return_pct: f64,
    pub outcome: String,
    pub exit_reason: String,
    pub bars_held: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub run_at: String,
    pub symbol: String,
    pub total_trades: usize,
    pub wins: usize,
    pub win_ratio: f64,
    pub average_return: f64,
    pub forced_exits: usize,
}

impl SignalRecord {
    pub fn new(run: &RunStamp, signal: &Signal) -> Self {
        Self {
            run_at: run.label(),
            date: signal.date,
            symbol: signal.symbol.clone(),
            rsi: signal.rsi.map(round2),
            ma_fast: signal.ma_fast.map(round2),
            ma_slow: signal.ma_slow.map(round2),
            signal: signal.kind.to_string(),
        }
    }
}

impl TradeRecord {
    pub fn new(run: &RunStamp, trade: &Trade) -> Self {
        Self {
            run_at: run.label(),
            symbol: trade.symbol.clone(),
            entry_date: trade.entry_date,
            entry_price: trade.entry_price,
            exit_date: trade.exit_date,
            exit_price: trade.exit_price,
            return_pct: trade.return_pct,
            outcome: trade.outcome.to_string(),
            exit_reason: trade.exit_reason.to_string(),
            bars_held: trade.bars_held,
        }
    }
}

impl SummaryRecord {
    pub fn new(run: &RunStamp, symbol: &str, summary: &Summary) -> Self {
        Self {
            run_at: run.label(),
            symbol: symbol.to_string(),
            total_trades: summary.total_trades,
            wins: summary.wins,
            win_ratio: summary.win_ratio,
            average_return: summary.average_return,
            forced_exits: summary.forced_exits,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
