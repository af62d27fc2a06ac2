//! Port traits: the boundaries the domain talks through.

pub mod alert_port;
pub mod config_port;
pub mod data_port;
pub mod report_port;
