//! Plain-text alert bodies for each run mode.

use crate::domain::metrics::{Summary, SymbolSummary};
use crate::domain::ml::{Direction, ModelReport};
use crate::domain::record::RunStamp;
use crate::domain::signal::{Signal, SignalKind};
use std::fmt::Write;

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

/// One line per evaluated symbol, BUYs first, then symbols with no signal.
pub fn format_live_alert(run: &RunStamp, signals: &[Signal], unavailable: &[String]) -> String {
    let buys = signals.iter().filter(|s| s.kind == SignalKind::Buy).count();
    let mut out = format!(
        "Live signals {} ({} BUY of {} evaluated)\n",
        run.today(),
        buys,
        signals.len()
    );

    let ordered = signals
        .iter()
        .filter(|s| s.kind == SignalKind::Buy)
        .chain(signals.iter().filter(|s| s.kind != SignalKind::Buy));
    for signal in ordered {
        let _ = writeln!(
            out,
            "{}: {} on {} (RSI {}, MA20 {}, MA50 {})",
            signal.symbol,
            signal.kind,
            signal.date,
            fmt_opt(signal.rsi),
            fmt_opt(signal.ma_fast),
            fmt_opt(signal.ma_slow),
        );
    }
    for symbol in unavailable {
        let _ = writeln!(out, "{}: signal unavailable (insufficient history)", symbol);
    }

    out.trim_end().to_string()
}

pub fn format_backtest_alert(
    run: &RunStamp,
    overall: &Summary,
    per_symbol: &[SymbolSummary],
) -> String {
    let mut out = format!(
        "Backtest {}: {} trades, win ratio {:.1}%, avg return {:+.2}%, {} forced exits\n",
        run.today(),
        overall.total_trades,
        overall.win_ratio * 100.0,
        overall.average_return * 100.0,
        overall.forced_exits,
    );
    for entry in per_symbol {
        let _ = writeln!(
            out,
            "{}: {} trades, {} wins, avg {:+.2}%",
            entry.symbol,
            entry.summary.total_trades,
            entry.summary.wins,
            entry.summary.average_return * 100.0,
        );
    }
    out.trim_end().to_string()
}

pub fn format_ml_alert(run: &RunStamp, reports: &[ModelReport]) -> String {
    let mut out = format!("Direction model {}\n", run.today());
    for report in reports {
        let prediction = match (report.latest_prediction, report.latest_probability_up) {
            (Some(direction), Some(p)) => {
                let confidence = if direction == Direction::Up { p } else { 1.0 - p };
                format!("{} ({:.0}%)", direction, confidence * 100.0)
            }
            _ => "n/a".to_string(),
        };
        let _ = writeln!(
            out,
            "{}: next {} | test accuracy {:.1}% on {} rows",
            report.symbol,
            prediction,
            report.accuracy * 100.0,
            report.test_rows,
        );
    }
    out.trim_end().to_string()
}
