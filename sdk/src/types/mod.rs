//! Wire types for the Tickerboard backend.
//!
//! These mirror the JSON documents served over REST and pushed over the
//! realtime channels.

pub mod alert;
pub mod candle;
pub mod foreign;
pub mod market;
pub mod session;

pub use alert::{filter_alerts, Alert, AlertPayload, AlertSeverity, AlertType};
pub use candle::{parse_timestamp, CandleData, DerivativesHistory, IndexCandleData};
pub use foreign::{ForeignDetailResponse, ForeignInvestorData, ForeignSummary};
pub use market::{
    BasisPoint, DerivativesData, IndexData, IntradayPoint, MarketSnapshot, PriceData,
    SessionStats, VolumeStatsResponse, Vn30Components,
};
pub use session::{trading_date, MarketSession};
