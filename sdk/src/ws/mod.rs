//! Realtime push channels.
//!
//! This module provides the closed set of push channels, URL construction,
//! frame decoding and the transport seam used by the subscription layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use tickerboard_sdk::types::MarketSnapshot;
//! use tickerboard_sdk::ws::{decode, Channel, Inbound, Transport, TungsteniteTransport, WsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WsConfig::new("ws://127.0.0.1:8000").with_token("secret");
//!     let mut frames = TungsteniteTransport::default()
//!         .open(&config.channel_url(Channel::Market)?)
//!         .await?;
//!
//!     while let Some(Ok(frame)) = frames.next().await {
//!         if let Inbound::Payload(snapshot) = decode::<MarketSnapshot>(&frame) {
//!             println!("{} prices", snapshot.prices.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod messages;
pub mod transport;

pub use config::WsConfig;
pub use error::WsError;
pub use messages::{decode, Channel, Frame, Inbound};
pub use transport::{FrameStream, Transport, TungsteniteTransport};
