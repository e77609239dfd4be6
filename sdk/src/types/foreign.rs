//! Foreign investor flow types.

use serde::{Deserialize, Serialize};

/// Foreign investor activity for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignInvestorData {
    /// Ticker symbol.
    pub symbol: String,
    /// Volume bought by foreign investors.
    pub buy_volume: u64,
    /// Volume sold by foreign investors.
    pub sell_volume: u64,
    /// Net volume (buy minus sell).
    pub net_volume: i64,
    /// Value bought.
    pub buy_value: f64,
    /// Value sold.
    pub sell_value: f64,
    /// Net value (buy minus sell).
    pub net_value: f64,
    /// Total foreign ownership room.
    pub total_room: u64,
    /// Remaining foreign ownership room.
    pub current_room: u64,
    /// Buy volume per minute.
    #[serde(default)]
    pub buy_speed_per_min: f64,
    /// Sell volume per minute.
    #[serde(default)]
    pub sell_speed_per_min: f64,
    /// Change of buy speed.
    #[serde(default)]
    pub buy_acceleration: f64,
    /// Change of sell speed.
    #[serde(default)]
    pub sell_acceleration: f64,
    /// Last update time.
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Market-wide foreign investor aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignSummary {
    /// Total value bought.
    pub total_buy_value: f64,
    /// Total value sold.
    pub total_sell_value: f64,
    /// Cumulative net value for the session.
    pub total_net_value: f64,
    /// Total volume bought.
    pub total_buy_volume: u64,
    /// Total volume sold.
    pub total_sell_volume: u64,
    /// Cumulative net volume for the session.
    pub total_net_volume: i64,
    /// Largest net buyers.
    #[serde(default)]
    pub top_buy: Vec<ForeignInvestorData>,
    /// Largest net sellers.
    #[serde(default)]
    pub top_sell: Vec<ForeignInvestorData>,
}

/// Response of `GET /api/market/foreign-detail`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignDetailResponse {
    /// Market-wide aggregate.
    pub summary: ForeignSummary,
    /// Per-symbol breakdown.
    #[serde(default)]
    pub stocks: Vec<ForeignInvestorData>,
}
