//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod frame;
pub mod signal;
pub mod position;
pub mod exit_policy;
pub mod backtest;
pub mod metrics;
pub mod ml;
pub mod record;
pub mod alert;
pub mod pipeline;
pub mod universe;
pub mod config_validation;
pub mod error;
