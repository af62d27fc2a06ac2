//! Append-only CSV reporting sink.
//!
//! One file per record category under the output directory. A header row is
//! written only when the file is created (or found empty).

use crate::domain::error::CrosswatchError;
use crate::domain::record::{SignalRecord, SummaryRecord, TradeRecord};
use crate::ports::report_port::ReportSink;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub const SIGNALS_FILE: &str = "trade_signals.csv";
pub const TRADES_FILE: &str = "backtest_log.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn append<T: Serialize>(&self, file_name: &str, records: &[T]) -> Result<(), CrosswatchError> {
        let sink_err = |reason: String| CrosswatchError::SinkWrite {
            sink: file_name.to_string(),
            reason,
        };

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| sink_err(format!("cannot create {}: {}", self.output_dir.display(), e)))?;

        let path = self.output_dir.join(file_name);
        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| sink_err(format!("cannot open {}: {}", path.display(), e)))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| sink_err(e.to_string()))?;
        }
        writer.flush().map_err(|e| sink_err(e.to_string()))
    }
}

impl ReportSink for CsvReportAdapter {
    fn write_signals(&self, records: &[SignalRecord]) -> Result<(), CrosswatchError> {
        self.append(SIGNALS_FILE, records)
    }

    fn write_trades(&self, records: &[TradeRecord]) -> Result<(), CrosswatchError> {
        self.append(TRADES_FILE, records)
    }

    fn write_summary(&self, record: &SummaryRecord) -> Result<(), CrosswatchError> {
        self.append(SUMMARY_FILE, std::slice::from_ref(record))
    }
}
