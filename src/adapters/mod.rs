//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod log_alert_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
#[cfg(feature = "http")]
pub mod webhook_alert_adapter;
#[cfg(feature = "http")]
pub mod yahoo_adapter;
