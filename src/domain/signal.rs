//! Buy-signal classification.
//!
//! BUY iff RSI < 30 and the fast MA has just crossed above the slow MA:
//! previous fast <= previous slow and current fast > current slow.
//! Any missing value yields HOLD.

use crate::domain::frame::{IndicatorFrame, IndicatorSnapshot};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

pub const RSI_OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Hold,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Hold => write!(f, "HOLD"),
        }
    }
}

/// A classified bar together with the values that produced the classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub date: NaiveDate,
    pub symbol: String,
    pub kind: SignalKind,
    pub rsi: Option<f64>,
    pub ma_fast: Option<f64>,
    pub ma_slow: Option<f64>,
}

impl Signal {
    /// Classify bar `index` of `frame`. `None` when the index is out of range.
    pub fn at(frame: &IndicatorFrame, index: usize) -> Option<Self> {
        let current = frame.snapshot(index)?;
        Some(Self {
            date: current.date,
            symbol: frame.symbol.clone(),
            kind: evaluate_at(frame, index),
            rsi: current.rsi,
            ma_fast: current.ma_fast,
            ma_slow: current.ma_slow,
        })
    }

    pub fn latest(frame: &IndicatorFrame) -> Option<Self> {
        frame.len().checked_sub(1).and_then(|i| Self::at(frame, i))
    }

    /// True when every indicator the rule needs was defined on this bar.
    pub fn is_evaluable(&self) -> bool {
        self.rsi.is_some() && self.ma_fast.is_some() && self.ma_slow.is_some()
    }
}

pub fn evaluate(previous: Option<&IndicatorSnapshot>, current: &IndicatorSnapshot) -> SignalKind {
    let Some(previous) = previous else {
        return SignalKind::Hold;
    };

    let (Some(rsi), Some(fast), Some(slow), Some(prev_fast), Some(prev_slow)) = (
        current.rsi,
        current.ma_fast,
        current.ma_slow,
        previous.ma_fast,
        previous.ma_slow,
    ) else {
        return SignalKind::Hold;
    };

    let oversold = rsi < RSI_OVERSOLD;
    let crossed_above = prev_fast <= prev_slow && fast > slow;

    if oversold && crossed_above {
        SignalKind::Buy
    } else {
        SignalKind::Hold
    }
}

pub fn evaluate_at(frame: &IndicatorFrame, index: usize) -> SignalKind {
    let Some(current) = frame.snapshot(index) else {
        return SignalKind::Hold;
    };
    let previous = index.checked_sub(1).and_then(|i| frame.snapshot(i));
    evaluate(previous.as_ref(), &current)
}

pub fn evaluate_series(frame: &IndicatorFrame) -> Vec<SignalKind> {
    (0..frame.len()).map(|i| evaluate_at(frame, i)).collect()
}
