//! HTTP client for the Tickerboard REST API.
//!
//! This module provides a typed client for the backend's market and history
//! endpoints. It also serves as the fallback producer for realtime channels.
//!
//! # Example
//!
//! ```rust,ignore
//! use tickerboard_sdk::client::MarketClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MarketClient::with_base_url("http://127.0.0.1:8000/api")?;
//!
//!     let snapshot = client.get_snapshot().await?;
//!     println!("{} symbols priced", snapshot.prices.len());
//!
//!     let alerts = client.get_alerts(50).await?;
//!     println!("{} recent alerts", alerts.len());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::MarketClient;
