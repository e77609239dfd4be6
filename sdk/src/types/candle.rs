//! Historical series types served by `/api/history`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One-minute stock candle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleData {
    /// Ticker symbol.
    pub symbol: String,
    /// Bucket start.
    pub timestamp: String,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Matched volume.
    #[serde(default)]
    pub volume: u64,
    /// Volume classified as active buying.
    #[serde(default)]
    pub active_buy_vol: u64,
    /// Volume classified as active selling.
    #[serde(default)]
    pub active_sell_vol: u64,
}

/// One-minute index candle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexCandleData {
    /// Index name.
    #[serde(default)]
    pub index_name: String,
    /// Bucket start.
    pub timestamp: String,
    /// Open value.
    pub open: f64,
    /// High value.
    pub high: f64,
    /// Low value.
    pub low: f64,
    /// Close value.
    pub close: f64,
    /// Matched volume.
    #[serde(default)]
    pub volume: u64,
}

/// One sample of futures contract history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivativesHistory {
    /// Contract symbol.
    pub contract: String,
    /// Sample time.
    pub timestamp: String,
    /// Contract price.
    pub price: f64,
    /// Futures minus spot.
    pub basis: f64,
    /// Open interest.
    #[serde(default)]
    pub open_interest: u64,
}

/// Parses a backend timestamp.
///
/// Accepts RFC 3339 and naive ISO-8601 (interpreted as UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let ts = parse_timestamp("2026-01-05T02:15:00Z").expect("timestamp");
        assert_eq!(ts.timestamp(), 1_767_579_300);
    }

    #[test]
    fn test_parse_timestamp_naive() {
        let ts = parse_timestamp("2026-01-05T02:15:00.250").expect("timestamp");
        assert_eq!(ts.timestamp(), 1_767_579_300);
    }

    #[test]
    fn test_parse_timestamp_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}
