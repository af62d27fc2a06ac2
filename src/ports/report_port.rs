//! Reporting sink port trait.
//!
//! Three append-only categories: signal events, trade rows and summary rows.
//! Callers treat every write as best-effort.

use crate::domain::error::CrosswatchError;
use crate::domain::record::{SignalRecord, SummaryRecord, TradeRecord};

pub trait ReportSink {
    fn write_signals(&self, records: &[SignalRecord]) -> Result<(), CrosswatchError>;

    fn write_trades(&self, records: &[TradeRecord]) -> Result<(), CrosswatchError>;

    fn write_summary(&self, record: &SummaryRecord) -> Result<(), CrosswatchError>;
}
