//! Rolling per-symbol price history for sparklines.

use std::collections::{HashMap, VecDeque};

use tickerboard_sdk::MarketSnapshot;

use super::Accumulate;

/// Default points retained per symbol.
pub const DEFAULT_SPARKLINE_POINTS: usize = 50;

/// Bounded price history per symbol.
///
/// A price is appended only when it differs from the last stored price, and
/// the zero "no trade yet" sentinel is skipped.
#[derive(Debug, Clone)]
pub struct SparklineBook {
    capacity: usize,
    series: HashMap<String, VecDeque<f64>>,
}

impl Default for SparklineBook {
    fn default() -> Self {
        Self::new(DEFAULT_SPARKLINE_POINTS)
    }
}

impl SparklineBook {
    /// Creates a book retaining at most `capacity` points per symbol.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: HashMap::new(),
        }
    }

    /// Returns the per-symbol capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records a price. Returns true if a point was appended.
    pub fn record(&mut self, symbol: &str, price: f64) -> bool {
        if !(price > 0.0) {
            return false;
        }

        let series = self.series.entry(symbol.to_string()).or_default();
        if series.back() == Some(&price) {
            return false;
        }
        if series.len() == self.capacity {
            series.pop_front();
        }
        series.push_back(price);
        true
    }

    /// Returns the history for a symbol, oldest first.
    #[must_use]
    pub fn points(&self, symbol: &str) -> Vec<f64> {
        self.series
            .get(symbol)
            .map(|series| series.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the number of points held for a symbol.
    #[must_use]
    pub fn len_of(&self, symbol: &str) -> usize {
        self.series.get(symbol).map_or(0, VecDeque::len)
    }

    /// Returns the number of tracked symbols.
    #[must_use]
    pub fn symbols(&self) -> usize {
        self.series.len()
    }

    /// Drops all history.
    pub fn clear(&mut self) {
        self.series.clear();
    }
}

impl Accumulate<MarketSnapshot> for SparklineBook {
    fn accumulate(&mut self, snapshot: &MarketSnapshot) {
        for (symbol, price) in &snapshot.prices {
            self.record(symbol, price.last_price);
        }
    }
}
