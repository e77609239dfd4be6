//! Tickerboard SDK - client library for the Tickerboard market-data backend.
//!
//! This crate provides the wire types, REST client and push transport used
//! by the realtime subscription layer in `tickerboard-feed`.
//!
//! # Modules
//!
//! - [`types`] - snapshot, foreign flow, alert and candle types; session clock
//! - [`client`] - [`MarketClient`] for the `/api` REST endpoints
//! - [`ws`] - [`Channel`], [`WsConfig`], frame decoding and [`Transport`]
//!
//! # Example
//!
//! ```rust
//! use tickerboard_sdk::{Channel, WsConfig};
//!
//! let config = WsConfig::new("ws://127.0.0.1:8000").with_token("secret");
//! let url = config.channel_url(Channel::Market).unwrap();
//! assert_eq!(url, "ws://127.0.0.1:8000/ws/market?token=secret");
//! ```

pub mod client;
pub mod error;
pub mod types;
pub mod ws;

pub use client::{ClientConfig, ClientError, MarketClient};
pub use error::SdkError;
pub use types::{
    Alert, AlertPayload, AlertSeverity, AlertType, BasisPoint, CandleData, DerivativesData,
    ForeignDetailResponse, ForeignInvestorData, ForeignSummary, IndexCandleData, MarketSession,
    MarketSnapshot, PriceData, SessionStats,
};
pub use ws::{
    decode, Channel, Frame, FrameStream, Inbound, Transport, TungsteniteTransport, WsConfig,
    WsError,
};
