//! Daily OHLCV bar representation and input-contract checks.

use crate::domain::error::CrosswatchError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Check a fetched series against the ingestion contract: ascending unique
/// dates and non-negative, finite prices.
pub fn validate_series(symbol: &str, bars: &[OhlcvBar]) -> Result<(), CrosswatchError> {
    for (i, bar) in bars.iter().enumerate() {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(CrosswatchError::InvalidSeries {
                symbol: symbol.to_string(),
                reason: format!("negative or non-finite price on {}", bar.date),
            });
        }
        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(CrosswatchError::InvalidSeries {
                symbol: symbol.to_string(),
                reason: format!(
                    "dates not strictly ascending at {} (previous {})",
                    bar.date,
                    bars[i - 1].date
                ),
            });
        }
    }
    Ok(())
}
