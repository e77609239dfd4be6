//! Market snapshot types.
//!
//! Mirrors the unified snapshot served by `GET /api/market/snapshot` and pushed
//! on the `market` channel.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::foreign::ForeignSummary;

/// Last traded price and daily bands for one symbol.
///
/// Missing fields decode as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceData {
    /// Last traded price. `0.0` means the symbol has not traded yet.
    pub last_price: f64,

    /// Absolute change against the reference price.
    pub change: f64,

    /// Percentage change against the reference price.
    pub change_pct: f64,

    /// Reference (prior close) price.
    pub ref_price: f64,

    /// Daily ceiling price.
    pub ceiling: f64,

    /// Daily floor price.
    pub floor: f64,
}

impl PriceData {
    /// Returns true if the symbol carries a real traded price.
    #[must_use]
    pub fn has_price(&self) -> bool {
        self.last_price > 0.0
    }
}

/// Active buy/sell classification of the session's volume for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Ticker symbol.
    pub symbol: String,

    /// Volume classified as active buying.
    pub mua_chu_dong_volume: u64,

    /// Value classified as active buying.
    pub mua_chu_dong_value: f64,

    /// Volume classified as active selling.
    pub ban_chu_dong_volume: u64,

    /// Value classified as active selling.
    pub ban_chu_dong_value: f64,

    /// Volume that could not be classified.
    pub neutral_volume: u64,

    /// Total session volume.
    pub total_volume: u64,

    /// Last update time as reported by the backend.
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl SessionStats {
    /// Ratio of active buy volume to total volume (0.0 when there is no volume).
    #[must_use]
    pub fn buy_ratio(&self) -> f64 {
        if self.total_volume == 0 {
            return 0.0;
        }
        self.mua_chu_dong_volume as f64 / self.total_volume as f64
    }
}

/// One intraday sample of an index value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayPoint {
    /// Sample time.
    pub timestamp: String,
    /// Index value.
    pub value: f64,
}

/// Index level and breadth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexData {
    /// Index identifier, e.g. `VN30`.
    pub index_id: String,
    /// Current value.
    pub value: f64,
    /// Prior close.
    pub prior_value: f64,
    /// Absolute change.
    pub change: f64,
    /// Relative change.
    pub ratio_change: f64,
    /// Total matched volume.
    pub total_volume: u64,
    /// Advancing constituents.
    pub advances: u32,
    /// Declining constituents.
    pub declines: u32,
    /// Unchanged constituents.
    pub no_changes: u32,
    /// Intraday series.
    #[serde(default)]
    pub intraday: Vec<IntradayPoint>,
    /// Advances over advances plus declines.
    pub advance_ratio: f64,
    /// Last update time.
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Front-month futures contract state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivativesData {
    /// Contract symbol.
    pub symbol: String,
    /// Last traded price.
    pub last_price: f64,
    /// Absolute change.
    pub change: f64,
    /// Percentage change.
    pub change_pct: f64,
    /// Session volume.
    pub volume: u64,
    /// Best bid.
    pub bid_price: f64,
    /// Best ask.
    pub ask_price: f64,
    /// Futures minus spot index.
    pub basis: f64,
    /// Basis as a percentage of spot.
    pub basis_pct: f64,
    /// True when futures trade above spot.
    pub is_premium: bool,
    /// Last update time.
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// One sample of the futures basis trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisPoint {
    /// Sample time.
    pub timestamp: String,
    /// Contract symbol.
    pub futures_symbol: String,
    /// Futures price.
    pub futures_price: f64,
    /// Spot index value.
    pub spot_value: f64,
    /// Futures minus spot.
    pub basis: f64,
    /// Basis as a percentage of spot.
    pub basis_pct: f64,
    /// True when futures trade above spot.
    pub is_premium: bool,
}

/// Unified market snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Session statistics keyed by symbol.
    #[serde(default)]
    pub quotes: HashMap<String, SessionStats>,

    /// Prices keyed by symbol.
    #[serde(default)]
    pub prices: HashMap<String, PriceData>,

    /// Indices keyed by index id.
    #[serde(default)]
    pub indices: HashMap<String, IndexData>,

    /// Foreign investor aggregate.
    #[serde(default)]
    pub foreign: Option<ForeignSummary>,

    /// Futures state.
    #[serde(default)]
    pub derivatives: Option<DerivativesData>,
}

impl MarketSnapshot {
    /// Returns the price for a symbol, if present.
    #[must_use]
    pub fn price(&self, symbol: &str) -> Option<&PriceData> {
        self.prices.get(symbol)
    }

    /// Returns the last price of a stock symbol, falling back to the futures
    /// contract when the symbol is not a listed stock.
    #[must_use]
    pub fn last_price_of(&self, symbol: &str) -> Option<f64> {
        self.prices
            .get(symbol)
            .map(|p| p.last_price)
            .or_else(|| self.derivatives.as_ref().map(|d| d.last_price))
    }
}

/// Response of `GET /api/market/volume-stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeStatsResponse {
    /// Per-symbol session statistics.
    pub stats: Vec<SessionStats>,
}

/// Response of `GET /api/vn30-components`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vn30Components {
    /// Constituent symbols.
    pub symbols: Vec<String>,
}
