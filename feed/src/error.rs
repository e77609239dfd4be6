//! Error types for the feed layer.
//!
//! `FeedError` is the consumer-visible error stored in subscription and
//! poller state, so it is `Clone` and carries rendered messages only.

use thiserror::Error;
use tickerboard_sdk::{Channel, ClientError, WsError};

/// Errors surfaced to subscribers and pollers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The push connection failed or dropped.
    #[error("push transport error on {channel}: {message}")]
    Transport {
        /// Channel whose connection failed.
        channel: Channel,
        /// Rendered transport error.
        message: String,
    },

    /// A polling producer returned an error.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A polling producer panicked.
    #[error("producer panicked: {0}")]
    Panicked(String),

    /// The subscription or poller has shut down.
    #[error("feed closed")]
    Closed,

    /// Options failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FeedError {
    /// Wraps a transport error for the given channel.
    #[must_use]
    pub fn transport(channel: Channel, error: &WsError) -> Self {
        Self::Transport {
            channel,
            message: error.to_string(),
        }
    }

    /// Returns true if this error came from the push transport.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<ClientError> for FeedError {
    fn from(err: ClientError) -> Self {
        Self::Fetch(err.to_string())
    }
}
