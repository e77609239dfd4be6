//! Observable subscription state.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::FeedError;

/// Connection status reported to consumers.
///
/// `Connected` covers both a live push connection and an active fallback;
/// [`ChannelState::is_live`] tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// A push connection attempt is pending.
    Connecting,
    /// Data is flowing from push or fallback.
    Connected,
    /// The push connection dropped and a retry is scheduled.
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Latest value plus liveness for one channel.
#[derive(Debug)]
pub struct ChannelState<T> {
    /// Most recent value from push or fallback.
    pub data: Option<Arc<T>>,
    /// Connection status.
    pub status: ConnectionStatus,
    /// Most recent transport or fetch error.
    pub error: Option<FeedError>,
    /// True iff the push connection is the current driver.
    pub is_live: bool,
    /// Consecutive failed push attempts.
    pub attempts: u32,
    /// Number of push connections opened so far.
    pub generation: u64,
    /// True while the fallback poller is the driver.
    pub in_fallback: bool,
}

impl<T> Default for ChannelState<T> {
    fn default() -> Self {
        Self {
            data: None,
            status: ConnectionStatus::Connecting,
            error: None,
            is_live: false,
            attempts: 0,
            generation: 0,
            in_fallback: false,
        }
    }
}

impl<T> Clone for ChannelState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            status: self.status,
            error: self.error.clone(),
            is_live: self.is_live,
            attempts: self.attempts,
            generation: self.generation,
            in_fallback: self.in_fallback,
        }
    }
}

impl<T> ChannelState<T> {
    /// Returns true if an error is showing over previously received data.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.error.is_some() && self.data.is_some()
    }

    /// Returns true if an error is showing and nothing was ever received.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.error.is_some() && self.data.is_none()
    }

    /// Returns true while waiting for the first value.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = ChannelState::<u32>::default();
        assert_eq!(state.status, ConnectionStatus::Connecting);
        assert!(!state.is_live);
        assert!(state.is_loading());
        assert_eq!(state.generation, 0);
    }

    #[test]
    fn test_stale_and_blocked() {
        let mut state = ChannelState::<u32> {
            error: Some(FeedError::Closed),
            ..Default::default()
        };
        assert!(state.is_blocked());
        assert!(!state.is_stale());

        state.data = Some(Arc::new(1));
        assert!(state.is_stale());
        assert!(!state.is_blocked());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionStatus::Disconnected.to_string(), "disconnected");
    }
}
