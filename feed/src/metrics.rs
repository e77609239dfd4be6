//! Feed metrics.
//!
//! Atomic counters shared by every subscription created from one hub.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for push connections, fallback polling and frame handling.
#[derive(Debug)]
pub struct FeedMetrics {
    /// Push connection attempts started.
    connect_attempts: AtomicU64,

    /// Push connections that opened.
    connections_opened: AtomicU64,

    /// Push connections that closed or failed.
    connections_closed: AtomicU64,

    /// Payload frames delivered from push.
    push_messages: AtomicU64,

    /// Control frames discarded.
    control_frames: AtomicU64,

    /// Malformed or binary frames dropped.
    ignored_frames: AtomicU64,

    /// Times a subscription demoted to polling.
    fallback_activations: AtomicU64,

    /// Fallback fetches completed.
    fallback_polls: AtomicU64,

    /// Fallback fetches that failed.
    fallback_errors: AtomicU64,

    /// Fallback responses discarded by the generation check.
    stale_discards: AtomicU64,

    /// Manual reconnect requests.
    manual_reconnects: AtomicU64,

    /// Start time for uptime.
    start_time: Instant,
}

impl Default for FeedMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedMetrics {
    /// Creates a new metrics instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_attempts: AtomicU64::new(0),
            connections_opened: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
            push_messages: AtomicU64::new(0),
            control_frames: AtomicU64::new(0),
            ignored_frames: AtomicU64::new(0),
            fallback_activations: AtomicU64::new(0),
            fallback_polls: AtomicU64::new(0),
            fallback_errors: AtomicU64::new(0),
            stale_discards: AtomicU64::new(0),
            manual_reconnects: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a push connection attempt.
    pub fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an opened push connection.
    pub fn record_open(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a closed or failed push connection.
    pub fn record_close(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a payload delivered from push.
    pub fn record_push_message(&self) {
        self.push_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a discarded control frame.
    pub fn record_control_frame(&self) {
        self.control_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a dropped frame.
    pub fn record_ignored_frame(&self) {
        self.ignored_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a demotion to fallback polling.
    pub fn record_fallback_activation(&self) {
        self.fallback_activations.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed fallback fetch.
    pub fn record_fallback_poll(&self, failed: bool) {
        self.fallback_polls.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.fallback_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a fallback response rejected as stale.
    pub fn record_stale_discard(&self) {
        self.stale_discards.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a manual reconnect.
    pub fn record_manual_reconnect(&self) {
        self.manual_reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns push connection attempts.
    #[must_use]
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    /// Returns opened push connections.
    #[must_use]
    pub fn connections_opened(&self) -> u64 {
        self.connections_opened.load(Ordering::Relaxed)
    }

    /// Returns closed push connections.
    #[must_use]
    pub fn connections_closed(&self) -> u64 {
        self.connections_closed.load(Ordering::Relaxed)
    }

    /// Returns payloads delivered from push.
    #[must_use]
    pub fn push_messages(&self) -> u64 {
        self.push_messages.load(Ordering::Relaxed)
    }

    /// Returns discarded control frames.
    #[must_use]
    pub fn control_frames(&self) -> u64 {
        self.control_frames.load(Ordering::Relaxed)
    }

    /// Returns dropped frames.
    #[must_use]
    pub fn ignored_frames(&self) -> u64 {
        self.ignored_frames.load(Ordering::Relaxed)
    }

    /// Returns demotions to fallback.
    #[must_use]
    pub fn fallback_activations(&self) -> u64 {
        self.fallback_activations.load(Ordering::Relaxed)
    }

    /// Returns completed fallback fetches.
    #[must_use]
    pub fn fallback_polls(&self) -> u64 {
        self.fallback_polls.load(Ordering::Relaxed)
    }

    /// Returns failed fallback fetches.
    #[must_use]
    pub fn fallback_errors(&self) -> u64 {
        self.fallback_errors.load(Ordering::Relaxed)
    }

    /// Returns stale fallback responses discarded.
    #[must_use]
    pub fn stale_discards(&self) -> u64 {
        self.stale_discards.load(Ordering::Relaxed)
    }

    /// Returns manual reconnects.
    #[must_use]
    pub fn manual_reconnects(&self) -> u64 {
        self.manual_reconnects.load(Ordering::Relaxed)
    }

    /// Returns uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns a snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connect_attempts: self.connect_attempts(),
            connections_opened: self.connections_opened(),
            connections_closed: self.connections_closed(),
            push_messages: self.push_messages(),
            control_frames: self.control_frames(),
            ignored_frames: self.ignored_frames(),
            fallback_activations: self.fallback_activations(),
            fallback_polls: self.fallback_polls(),
            fallback_errors: self.fallback_errors(),
            stale_discards: self.stale_discards(),
            manual_reconnects: self.manual_reconnects(),
            uptime_secs: self.uptime().as_secs(),
        }
    }
}

/// Snapshot of feed metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Push connection attempts.
    pub connect_attempts: u64,
    /// Opened push connections.
    pub connections_opened: u64,
    /// Closed push connections.
    pub connections_closed: u64,
    /// Payloads delivered from push.
    pub push_messages: u64,
    /// Discarded control frames.
    pub control_frames: u64,
    /// Dropped frames.
    pub ignored_frames: u64,
    /// Demotions to fallback.
    pub fallback_activations: u64,
    /// Completed fallback fetches.
    pub fallback_polls: u64,
    /// Failed fallback fetches.
    pub fallback_errors: u64,
    /// Stale fallback responses discarded.
    pub stale_discards: u64,
    /// Manual reconnects.
    pub manual_reconnects: u64,
    /// Uptime in seconds.
    pub uptime_secs: u64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Attempts: {}, Opened: {}, Closed: {}, Push: {}, Ignored: {}, Fallbacks: {}, Polls: {} ({} failed), Stale: {}",
            self.connect_attempts,
            self.connections_opened,
            self.connections_closed,
            self.push_messages,
            self.ignored_frames,
            self.fallback_activations,
            self.fallback_polls,
            self.fallback_errors,
            self.stale_discards
        )
    }
}
