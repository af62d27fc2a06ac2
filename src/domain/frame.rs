//! Per-bar indicator frame aligned to a symbol's bar series.

use crate::domain::indicator::macd::calculate_macd_default;
use crate::domain::indicator::{calculate_rsi, calculate_sma, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub const RSI_PERIOD: usize = 14;
pub const FAST_MA_PERIOD: usize = 20;
pub const SLOW_MA_PERIOD: usize = 50;

/// RSI(14), SMA(20), SMA(50) and the MACD line for every bar of one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub rsi: IndicatorSeries,
    pub ma_fast: IndicatorSeries,
    pub ma_slow: IndicatorSeries,
    pub macd: IndicatorSeries,
}

/// The indicator values of a single bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub rsi: Option<f64>,
    pub ma_fast: Option<f64>,
    pub ma_slow: Option<f64>,
}

impl IndicatorFrame {
    pub fn compute(symbol: &str, bars: &[OhlcvBar]) -> Self {
        Self {
            symbol: symbol.to_string(),
            dates: bars.iter().map(|b| b.date).collect(),
            rsi: calculate_rsi(bars, RSI_PERIOD),
            ma_fast: calculate_sma(bars, FAST_MA_PERIOD),
            ma_slow: calculate_sma(bars, SLOW_MA_PERIOD),
            macd: calculate_macd_default(bars),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn snapshot(&self, index: usize) -> Option<IndicatorSnapshot> {
        let date = *self.dates.get(index)?;
        Some(IndicatorSnapshot {
            date,
            rsi: self.rsi.value_at(index),
            ma_fast: self.ma_fast.value_at(index),
            ma_slow: self.ma_slow.value_at(index),
        })
    }

    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        self.len().checked_sub(1).and_then(|i| self.snapshot(i))
    }
}
