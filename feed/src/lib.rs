//! Tickerboard Feed - resilient realtime data acquisition for the dashboard.
//!
//! This crate keeps one push subscription per channel alive, falls back to
//! REST polling when push is unavailable, promotes back when it recovers, and
//! folds delivered values into bounded accumulators.
//!
//! # Components
//!
//! - [`poller`]: Polling engine with in-flight guard
//! - [`subscription`]: Live channel manager and subscription handles
//! - [`accumulate`]: Sparklines, flow history, alert log, live candles
//! - [`views`]: View models built from channel and poller state
//! - [`config`]: Monitor configuration
//! - [`metrics`]: Feed metrics

pub mod accumulate;
pub mod config;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod subscription;
pub mod views;

#[cfg(test)]
mod testing;

pub use accumulate::{
    Accumulate, AlertLog, Candle, CandleBuilder, Feed, FlowHistory, FlowPoint, Notifier,
    SparklineBook, TerminalBell,
};
pub use config::{ConfigError, MonitorConfig};
pub use error::FeedError;
pub use metrics::{FeedMetrics, MetricsSnapshot};
pub use poller::{fetcher, Fetcher, PollLoop, PollState, Poller};
pub use subscription::{
    ChannelState, ConnectionStatus, FeedHub, Subscription, SubscriptionOptions,
};
