//! Alert adapter that writes messages to the log.

use crate::domain::error::CrosswatchError;
use crate::ports::alert_port::AlertPort;
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertAdapter;

impl AlertPort for LogAlertAdapter {
    fn send(&self, message: &str) -> Result<(), CrosswatchError> {
        for line in message.lines() {
            info!(target: "crosswatch::alert", "{}", line);
        }
        Ok(())
    }
}
