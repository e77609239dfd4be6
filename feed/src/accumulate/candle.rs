//! One-minute OHLC candles folded from live prices.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tickerboard_sdk::types::parse_timestamp;
use tickerboard_sdk::{CandleData, IndexCandleData, MarketSnapshot};

use super::Accumulate;

/// Default candles retained.
pub const DEFAULT_MAX_CANDLES: usize = 1_000;

const BUCKET_SECS: i64 = 60;

/// One OHLC bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    /// Bucket start, unix seconds.
    pub time: i64,
    /// Open.
    pub open: f64,
    /// High.
    pub high: f64,
    /// Low.
    pub low: f64,
    /// Close.
    pub close: f64,
}

impl Candle {
    fn flat(time: i64, price: f64) -> Self {
        Self {
            time,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    /// Converts a historical stock candle. Returns `None` if the timestamp
    /// does not parse.
    #[must_use]
    pub fn from_stock(candle: &CandleData) -> Option<Self> {
        let time = parse_timestamp(&candle.timestamp)?.timestamp();
        Some(Self {
            time: bucket_start(time),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
        })
    }

    /// Converts a historical index candle. Returns `None` if the timestamp
    /// does not parse.
    #[must_use]
    pub fn from_index(candle: &IndexCandleData) -> Option<Self> {
        let time = parse_timestamp(&candle.timestamp)?.timestamp();
        Some(Self {
            time: bucket_start(time),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
        })
    }
}

fn bucket_start(unix_secs: i64) -> i64 {
    unix_secs.div_euclid(BUCKET_SECS) * BUCKET_SECS
}

/// Live candle series for one symbol.
#[derive(Debug, Clone)]
pub struct CandleBuilder {
    symbol: String,
    capacity: usize,
    candles: VecDeque<Candle>,
}

impl CandleBuilder {
    /// Creates a builder for `symbol`.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_capacity(symbol, DEFAULT_MAX_CANDLES)
    }

    /// Creates a builder retaining at most `capacity` candles.
    #[must_use]
    pub fn with_capacity(symbol: impl Into<String>, capacity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            capacity: capacity.max(1),
            candles: VecDeque::new(),
        }
    }

    /// Returns the tracked symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Replaces the series with historical candles, sorted by time.
    pub fn seed(&mut self, history: impl IntoIterator<Item = Candle>) {
        let mut candles: Vec<Candle> = history.into_iter().collect();
        candles.sort_by_key(|candle| candle.time);
        candles.dedup_by_key(|candle| candle.time);
        let skip = candles.len().saturating_sub(self.capacity);
        self.candles = candles.into_iter().skip(skip).collect();
    }

    /// Folds a live price observed at `now` into the current minute.
    ///
    /// Returns false for non-positive prices and for prices older than the
    /// newest bucket.
    pub fn record_at(&mut self, price: f64, now: DateTime<Utc>) -> bool {
        if !(price > 0.0) {
            return false;
        }

        let bucket = bucket_start(now.timestamp());
        match self.candles.back_mut() {
            Some(last) if last.time == bucket => {
                last.high = last.high.max(price);
                last.low = last.low.min(price);
                last.close = price;
            }
            Some(last) if last.time > bucket => return false,
            _ => {
                if self.candles.len() == self.capacity {
                    self.candles.pop_front();
                }
                self.candles.push_back(Candle::flat(bucket, price));
            }
        }
        true
    }

    /// Returns the candles, oldest first.
    #[must_use]
    pub fn candles(&self) -> Vec<Candle> {
        self.candles.iter().copied().collect()
    }

    /// Returns the newest candle.
    #[must_use]
    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }
}

impl Accumulate<MarketSnapshot> for CandleBuilder {
    fn accumulate(&mut self, snapshot: &MarketSnapshot) {
        if let Some(price) = snapshot.last_price_of(&self.symbol) {
            self.record_at(price, Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 2, minute, second)
            .single()
            .expect("valid time")
    }

    #[test]
    fn test_prices_fold_into_minute_buckets() {
        let mut builder = CandleBuilder::new("FPT");
        builder.record_at(100.0, at(15, 0));
        builder.record_at(102.0, at(15, 20));
        builder.record_at(99.0, at(15, 40));
        builder.record_at(101.0, at(16, 5));

        let candles = builder.candles();
        assert_eq!(candles.len(), 2);
        assert_eq!(
            candles[0],
            Candle {
                time: 1_767_579_300,
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 99.0,
            }
        );
        assert_eq!(candles[1].open, 101.0);
        assert_eq!(candles[1].time, 1_767_579_360);
    }

    #[test]
    fn test_rejects_zero_and_out_of_order() {
        let mut builder = CandleBuilder::new("FPT");
        assert!(!builder.record_at(0.0, at(15, 0)));
        assert!(builder.record_at(50.0, at(16, 0)));
        assert!(!builder.record_at(51.0, at(15, 59)));
        assert_eq!(builder.candles().len(), 1);
    }

    #[test]
    fn test_seed_then_continue_live() {
        let history = vec![
            CandleData {
                symbol: "FPT".to_string(),
                timestamp: "2026-01-05T02:16:00".to_string(),
                open: 10.0,
                high: 11.0,
                low: 9.5,
                close: 10.5,
                ..Default::default()
            },
            CandleData {
                symbol: "FPT".to_string(),
                timestamp: "2026-01-05T02:15:00Z".to_string(),
                open: 9.0,
                high: 10.0,
                low: 9.0,
                close: 10.0,
                ..Default::default()
            },
            CandleData {
                symbol: "FPT".to_string(),
                timestamp: "garbage".to_string(),
                ..Default::default()
            },
        ];
        let mut builder = CandleBuilder::new("FPT");
        builder.seed(history.iter().filter_map(Candle::from_stock));
        assert_eq!(builder.candles().len(), 2);
        assert_eq!(builder.candles()[0].time, 1_767_579_300);

        builder.record_at(12.0, at(16, 30));
        let latest = builder.latest().copied().expect("latest");
        assert_eq!(latest.open, 10.0);
        assert_eq!(latest.high, 12.0);
        assert_eq!(latest.close, 12.0);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut builder = CandleBuilder::with_capacity("FPT", 2);
        for minute in 0..4 {
            builder.record_at(10.0, at(minute, 0));
        }
        let times: Vec<i64> = builder.candles().iter().map(|c| c.time).collect();
        assert_eq!(times, vec![1_767_578_520, 1_767_578_580]);
    }
}
