//! Configuration validation.
//!
//! Every check runs before any symbol is fetched; the first failure aborts the run.

use crate::domain::error::CrosswatchError;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), CrosswatchError> {
    validate_symbols(config)?;
    validate_positive_int(config, "run", "backtest_window")?;
    validate_positive_int(config, "run", "backtest_history_days")?;
    validate_positive_int(config, "run", "live_history_days")?;
    validate_exit(config)?;
    validate_data_source(config)?;
    validate_report_sink(config)?;
    validate_ml(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> CrosswatchError {
    CrosswatchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), CrosswatchError> {
    match config.get_string("run", "symbols") {
        Some(s) if !s.trim().is_empty() => parse_symbols(&s)
            .map(|_| ())
            .map_err(|e| invalid("run", "symbols", e.to_string())),
        _ => Err(CrosswatchError::ConfigMissing {
            section: "run".to_string(),
            key: "symbols".to_string(),
        }),
    }
}

fn validate_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), CrosswatchError> {
    if config.get_int(section, key, 1) < 1 {
        return Err(invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(())
}

fn validate_exit(config: &dyn ConfigPort) -> Result<(), CrosswatchError> {
    let rsi_exit = config.get_double("exit", "rsi_exit", 70.0);
    if rsi_exit <= 0.0 || rsi_exit > 100.0 {
        return Err(invalid("exit", "rsi_exit", "rsi_exit must be in (0, 100]"));
    }
    validate_positive_int(config, "exit", "max_hold_bars")
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), CrosswatchError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => match config.get_string("data", "csv_dir") {
            Some(dir) if !dir.trim().is_empty() => Ok(()),
            _ => Err(CrosswatchError::ConfigMissing {
                section: "data".to_string(),
                key: "csv_dir".to_string(),
            }),
        },
        "yahoo" => {
            if cfg!(feature = "http") {
                validate_positive_int(config, "data", "timeout_secs")
            } else {
                Err(invalid(
                    "data",
                    "source",
                    "yahoo source requires the http feature",
                ))
            }
        }
        "sqlite" => {
            require_sqlite("data", "source")?;
            validate_sqlite_path(config)
        }
        other => Err(invalid(
            "data",
            "source",
            format!("unknown source '{}', expected csv, yahoo or sqlite", other),
        )),
    }
}

fn validate_report_sink(config: &dyn ConfigPort) -> Result<(), CrosswatchError> {
    let sink = config
        .get_string("report", "sink")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match sink.as_str() {
        "csv" => Ok(()),
        "sqlite" => {
            require_sqlite("report", "sink")?;
            validate_sqlite_path(config)
        }
        other => Err(invalid(
            "report",
            "sink",
            format!("unknown sink '{}', expected csv or sqlite", other),
        )),
    }
}

fn require_sqlite(section: &str, key: &str) -> Result<(), CrosswatchError> {
    if cfg!(feature = "sqlite") {
        Ok(())
    } else {
        Err(invalid(section, key, "sqlite requires the sqlite feature"))
    }
}

fn validate_sqlite_path(config: &dyn ConfigPort) -> Result<(), CrosswatchError> {
    match config.get_string("sqlite", "path") {
        Some(path) if !path.trim().is_empty() => {
            validate_positive_int(config, "sqlite", "pool_size")
        }
        _ => Err(CrosswatchError::ConfigMissing {
            section: "sqlite".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_ml(config: &dyn ConfigPort) -> Result<(), CrosswatchError> {
    let fraction = config.get_double("ml", "train_fraction", 0.8);
    if fraction <= 0.0 || fraction >= 1.0 {
        return Err(invalid(
            "ml",
            "train_fraction",
            "train_fraction must be between 0 and 1",
        ));
    }
    let learning_rate = config.get_double("ml", "learning_rate", 0.1);
    if learning_rate <= 0.0 {
        return Err(invalid(
            "ml",
            "learning_rate",
            "learning_rate must be positive",
        ));
    }
    validate_positive_int(config, "ml", "epochs")?;
    validate_positive_int(config, "ml", "history_days")
}
