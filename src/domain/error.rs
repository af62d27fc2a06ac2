//! Domain error types.

/// Top-level error type for crosswatch.
#[derive(Debug, thiserror::Error)]
pub enum CrosswatchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("invalid bar series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("insufficient history for {symbol}: have {bars} rows, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("indicator frame length {frame} does not match {bars} bars")]
    FrameMismatch { bars: usize, frame: usize },

    #[error("sink {sink} rejected write: {reason}")]
    SinkWrite { sink: String, reason: String },

    #[error("alert delivery failed: {reason}")]
    AlertDelivery { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CrosswatchError> for std::process::ExitCode {
    fn from(err: &CrosswatchError) -> Self {
        let code: u8 = match err {
            CrosswatchError::Io(_) | CrosswatchError::Database { .. } => 1,
            CrosswatchError::ConfigParse { .. }
            | CrosswatchError::ConfigMissing { .. }
            | CrosswatchError::ConfigInvalid { .. } => 2,
            CrosswatchError::DataUnavailable { .. }
            | CrosswatchError::InvalidSeries { .. }
            | CrosswatchError::InsufficientHistory { .. }
            | CrosswatchError::FrameMismatch { .. } => 5,
            CrosswatchError::SinkWrite { .. } | CrosswatchError::AlertDelivery { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
