//! MACD (Moving Average Convergence Divergence) line.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//!
//! Only the line feeds the classifier features; no signal line is computed.
//! Warmup: the line is defined once the slow EMA is, i.e. from index slow - 1.

use crate::domain::indicator::{calculate_ema, IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;

pub fn calculate_macd(bars: &[OhlcvBar], fast: usize, slow: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd { fast, slow };
    if fast == 0 || slow == 0 {
        return IndicatorSeries::undefined(indicator_type, bars.iter().map(|b| b.date));
    }

    let ema_fast = calculate_ema(bars, fast);
    let ema_slow = calculate_ema(bars, slow);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            date: bar.date,
            value: match (ema_fast.value_at(i), ema_slow.value_at(i)) {
                (Some(f), Some(s)) => Some(f - s),
                _ => None,
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(bars: &[OhlcvBar]) -> IndicatorSeries {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW)
}
