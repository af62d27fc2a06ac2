//! Exit rules for open positions.
//!
//! The simulator asks the policy on every bar after entry. End-of-window
//! closure is handled by the simulator itself, not by the policy.

use crate::domain::frame::IndicatorSnapshot;
use crate::domain::position::{ExitReason, Position};

pub const DEFAULT_RSI_EXIT: f64 = 70.0;
pub const DEFAULT_MAX_HOLD_BARS: usize = 5;

pub trait ExitPolicy {
    /// `bars_held` is at least 1; the entry bar itself is never offered.
    fn should_exit(
        &self,
        position: &Position,
        bars_held: usize,
        snapshot: &IndicatorSnapshot,
    ) -> Option<ExitReason>;
}

/// Exit on the first bar where RSI is above `rsi_exit`, or once
/// `max_hold_bars` bars have elapsed since entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiOrMaxHold {
    pub rsi_exit: f64,
    pub max_hold_bars: usize,
}

impl Default for RsiOrMaxHold {
    fn default() -> Self {
        Self {
            rsi_exit: DEFAULT_RSI_EXIT,
            max_hold_bars: DEFAULT_MAX_HOLD_BARS,
        }
    }
}

impl ExitPolicy for RsiOrMaxHold {
    fn should_exit(
        &self,
        _position: &Position,
        bars_held: usize,
        snapshot: &IndicatorSnapshot,
    ) -> Option<ExitReason> {
        if snapshot.rsi.is_some_and(|rsi| rsi > self.rsi_exit) {
            Some(ExitReason::RsiExit)
        } else if bars_held >= self.max_hold_bars {
            Some(ExitReason::MaxHold)
        } else {
            None
        }
    }
}
