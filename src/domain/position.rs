//! Open positions and the closed trades they become.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_index: usize,
    pub entry_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExitReason {
    /// RSI rose above the exit threshold.
    RsiExit,
    /// The maximum holding period elapsed.
    MaxHold,
    /// Still open on the last bar of the window; force-closed there.
    EndOfWindow,
}

impl ExitReason {
    pub fn is_forced(&self) -> bool {
        matches!(self, ExitReason::EndOfWindow)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "Win"),
            Outcome::Loss => write!(f, "Loss"),
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::RsiExit => write!(f, "rsi_exit"),
            ExitReason::MaxHold => write!(f, "max_hold"),
            ExitReason::EndOfWindow => write!(f, "end_of_window"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    /// (exit - entry) / entry, as a fraction.
    pub return_pct: f64,
    pub outcome: Outcome,
    pub exit_reason: ExitReason,
    pub bars_held: usize,
}

impl Position {
    pub fn bars_held(&self, index: usize) -> usize {
        index.saturating_sub(self.entry_index)
    }

    pub fn unrealized_return(&self, price: f64) -> f64 {
        if self.entry_price > 0.0 {
            (price - self.entry_price) / self.entry_price
        } else {
            0.0
        }
    }

    pub fn close(
        self,
        exit_date: NaiveDate,
        exit_index: usize,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Trade {
        let return_pct = self.unrealized_return(exit_price);
        Trade {
            bars_held: self.bars_held(exit_index),
            symbol: self.symbol,
            entry_date: self.entry_date,
            entry_price: self.entry_price,
            exit_date,
            exit_price,
            return_pct,
            outcome: if return_pct > 0.0 {
                Outcome::Win
            } else {
                Outcome::Loss
            },
            exit_reason,
        }
    }
}
