#![allow(dead_code)]

use chrono::NaiveDate;
use crosswatch::domain::error::CrosswatchError;
pub use crosswatch::domain::ohlcv::OhlcvBar;
use crosswatch::domain::record::{RunStamp, SignalRecord, SummaryRecord, TradeRecord};
use crosswatch::ports::alert_port::AlertPort;
use crosswatch::ports::data_port::DataPort;
use crosswatch::ports::report_port::ReportSink;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, CrosswatchError> {
        self.requests
            .borrow_mut()
            .push((symbol.to_string(), start_date, end_date));
        if let Some(reason) = self.errors.get(symbol) {
            return Err(CrosswatchError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub signals: RefCell<Vec<SignalRecord>>,
    pub trades: RefCell<Vec<TradeRecord>>,
    pub summaries: RefCell<Vec<SummaryRecord>>,
}

impl ReportSink for MemorySink {
    fn write_signals(&self, records: &[SignalRecord]) -> Result<(), CrosswatchError> {
        self.signals.borrow_mut().extend_from_slice(records);
        Ok(())
    }

    fn write_trades(&self, records: &[TradeRecord]) -> Result<(), CrosswatchError> {
        self.trades.borrow_mut().extend_from_slice(records);
        Ok(())
    }

    fn write_summary(&self, record: &SummaryRecord) -> Result<(), CrosswatchError> {
        self.summaries.borrow_mut().push(record.clone());
        Ok(())
    }
}

/// Rejects every write.
pub struct FailingSink;

impl ReportSink for FailingSink {
    fn write_signals(&self, _records: &[SignalRecord]) -> Result<(), CrosswatchError> {
        Err(sink_down())
    }

    fn write_trades(&self, _records: &[TradeRecord]) -> Result<(), CrosswatchError> {
        Err(sink_down())
    }

    fn write_summary(&self, _record: &SummaryRecord) -> Result<(), CrosswatchError> {
        Err(sink_down())
    }
}

fn sink_down() -> CrosswatchError {
    CrosswatchError::SinkWrite {
        sink: "test".into(),
        reason: "unavailable".into(),
    }
}

#[derive(Default)]
pub struct RecordingAlert {
    pub messages: RefCell<Vec<String>>,
    pub fail: bool,
}

impl RecordingAlert {
    pub fn failing() -> Self {
        Self {
            messages: RefCell::new(Vec::new()),
            fail: true,
        }
    }
}

impl AlertPort for RecordingAlert {
    fn send(&self, message: &str) -> Result<(), CrosswatchError> {
        self.messages.borrow_mut().push(message.to_string());
        if self.fail {
            return Err(CrosswatchError::AlertDelivery {
                reason: "channel down".into(),
            });
        }
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn run_stamp() -> RunStamp {
    RunStamp::new(date(2024, 6, 3).and_hms_opt(16, 0, 0).unwrap())
}

/// Consecutive daily bars from 2024-01-01.
pub fn make_bars(symbol: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            symbol: symbol.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: (close - 1.0).max(0.0),
            close,
            volume: 100_000 + (i as u64 % 5) * 10_000,
        })
        .collect()
}

/// 80 closes producing exactly one BUY, at index 65 (2024-03-06, close 86.5):
/// RSI 24.87, MA20 100.75 crossing above MA50 100.30. An early spike leaves
/// the MA50 window so the fast average crosses while price is depressed.
pub fn scenario_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 15];
    closes.push(200.0);
    closes.extend(std::iter::repeat(100.0).take(30));
    closes.extend((0..20).map(|j| 115.0 - 1.5 * j as f64));
    closes.extend((1..=14).map(|k| 86.5 + 2.0 * k as f64));
    closes
}

pub const SCENARIO_BUY_INDEX: usize = 65;

pub fn scenario_bars(symbol: &str) -> Vec<OhlcvBar> {
    make_bars(symbol, &scenario_closes())
}

pub fn flat_bars(symbol: &str, count: usize) -> Vec<OhlcvBar> {
    make_bars(symbol, &vec![100.0; count])
}
