//! Single-symbol backtest simulator.
//!
//! Walks the last `window` bars chronologically. A BUY opens a position at
//! that bar's close when none is open; the exit policy is consulted on every
//! later bar; anything still open on the final bar is force-closed there with
//! [`ExitReason::EndOfWindow`].

use crate::domain::error::CrosswatchError;
use crate::domain::exit_policy::{
    ExitPolicy, RsiOrMaxHold, DEFAULT_MAX_HOLD_BARS, DEFAULT_RSI_EXIT,
};
use crate::domain::frame::IndicatorFrame;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{ExitReason, Position, Trade};
use crate::domain::signal::{evaluate_at, Signal, SignalKind};
use chrono::NaiveDate;

/// Roughly six months of trading days.
pub const DEFAULT_WINDOW: usize = 126;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub window: usize,
    pub rsi_exit: f64,
    pub max_hold_bars: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            rsi_exit: DEFAULT_RSI_EXIT,
            max_hold_bars: DEFAULT_MAX_HOLD_BARS,
        }
    }
}

impl BacktestConfig {
    pub fn exit_policy(&self) -> RsiOrMaxHold {
        RsiOrMaxHold {
            rsi_exit: self.rsi_exit,
            max_hold_bars: self.max_hold_bars,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub trades: Vec<Trade>,
    /// Every BUY fired inside the window, including ones ignored while a position was open.
    pub buy_signals: Vec<Signal>,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub bars_evaluated: usize,
}

pub fn run_backtest(
    symbol: &str,
    bars: &[OhlcvBar],
    frame: &IndicatorFrame,
    config: &BacktestConfig,
    policy: &dyn ExitPolicy,
) -> Result<BacktestResult, CrosswatchError> {
    if bars.len() != frame.len() {
        return Err(CrosswatchError::FrameMismatch {
            bars: bars.len(),
            frame: frame.len(),
        });
    }

    let start = bars.len().saturating_sub(config.window);
    let window = &bars[start..];
    let mut result = BacktestResult {
        symbol: symbol.to_string(),
        trades: Vec::new(),
        buy_signals: Vec::new(),
        window_start: window.first().map(|b| b.date),
        window_end: window.last().map(|b| b.date),
        bars_evaluated: window.len(),
    };

    let Some(last) = bars.len().checked_sub(1) else {
        return Ok(result);
    };
    let mut open: Option<Position> = None;

    for (i, bar) in bars.iter().enumerate().skip(start) {
        let Some(snapshot) = frame.snapshot(i) else {
            continue;
        };

        if let Some(position) = open.take() {
            let held = position.bars_held(i);
            match policy.should_exit(&position, held, &snapshot) {
                Some(reason) => result.trades.push(position.close(bar.date, i, bar.close, reason)),
                None if i == last => result.trades.push(position.close(
                    bar.date,
                    i,
                    bar.close,
                    ExitReason::EndOfWindow,
                )),
                None => open = Some(position),
            }
        }

        if evaluate_at(frame, i) != SignalKind::Buy {
            continue;
        }
        if let Some(signal) = Signal::at(frame, i) {
            result.buy_signals.push(signal);
        }
        if open.is_none() && i < last {
            open = Some(Position {
                symbol: symbol.to_string(),
                entry_date: bar.date,
                entry_index: i,
                entry_price: bar.close,
            });
        }
    }

    Ok(result)
}
