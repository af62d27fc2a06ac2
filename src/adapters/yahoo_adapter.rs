//! Yahoo Finance chart API data adapter.
//!
//! Fetches daily bars from `/v8/finance/chart/<SYMBOL>` with `period1` and
//! `period2` epoch bounds. Rows with any missing OHLCV value are dropped.
//! Timestamps are shifted by the exchange's GMT offset before taking the date.

use crate::domain::error::CrosswatchError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Duration, NaiveDate};
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

pub struct YahooAdapter {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl YahooAdapter {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, CrosswatchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(StdDuration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CrosswatchError::ConfigInvalid {
                section: "data".to_string(),
                key: "base_url".to_string(),
                reason: format!("cannot build HTTP client: {}", e),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn chart_url(&self, symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> String {
        let period1 = start_date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive; extend to the end of end_date.
        let period2 = (end_date + Duration::days(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "{}/v8/finance/chart/{}?interval=1d&period1={}&period2={}",
            self.base_url, symbol, period1, period2
        )
    }
}

impl DataPort for YahooAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, CrosswatchError> {
        let unavailable = |reason: String| CrosswatchError::DataUnavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let url = self.chart_url(symbol, start_date, end_date);
        debug!(symbol, %url, "requesting chart");

        let body = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| unavailable(format!("request failed: {}", e)))?;

        parse_chart(symbol, &body, start_date, end_date)
    }
}

/// Decode a chart response body into ascending, de-duplicated daily bars.
pub fn parse_chart(
    symbol: &str,
    body: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<OhlcvBar>, CrosswatchError> {
    let unavailable = |reason: String| CrosswatchError::DataUnavailable {
        symbol: symbol.to_string(),
        reason,
    };

    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| unavailable(format!("malformed chart response: {}", e)))?;

    if let Some(error) = response.chart.error {
        return Err(unavailable(format!("{}: {}", error.code, error.description)));
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| unavailable("empty chart result".to_string()))?;
    let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let Some(quote) = data.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut bars: Vec<OhlcvBar> = Vec::new();
    for (i, &ts) in data.timestamp.iter().enumerate() {
        let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            quote.volume.get(i).copied().flatten(),
        ) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        if date < start_date || date > end_date {
            continue;
        }

        let bar = OhlcvBar {
            symbol: symbol.to_string(),
            date,
            open,
            high,
            low,
            close,
            volume,
        };
        // Intraday refreshes can repeat the latest date; keep the newest row.
        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            _ => bars.push(bar),
        }
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Ok(bars)
}
