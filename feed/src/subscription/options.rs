//! Subscription options.
//!
//! Builder-style options for one channel subscription, including the
//! optional fallback producer and the reconnect policy.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::error::FeedError;
use crate::poller::{fetcher, Fetcher};

/// Default fallback polling interval in milliseconds.
pub const DEFAULT_FALLBACK_INTERVAL_MS: u64 = 5_000;

/// Default consecutive failures before demoting to fallback.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Default base reconnect delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Default reconnect delay cap in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Default interval between promotion attempts in milliseconds.
pub const DEFAULT_PROMOTION_INTERVAL_MS: u64 = 30_000;

/// Default capacity of the update broadcast.
pub const DEFAULT_UPDATE_BUFFER: usize = 256;

/// Options for one channel subscription.
pub struct SubscriptionOptions<T> {
    /// Token appended to the push URL, overriding the hub's token.
    pub token: Option<String>,
    /// Producer polled while push is unavailable.
    pub fallback: Option<Fetcher<T>>,
    /// Fallback polling interval.
    pub fallback_interval: Duration,
    /// Consecutive failures before demoting to fallback.
    pub max_reconnect_attempts: u32,
    /// Base reconnect delay.
    pub base_delay: Duration,
    /// Reconnect delay cap.
    pub max_delay: Duration,
    /// Interval between promotion attempts while on fallback.
    pub promotion_interval: Duration,
    /// Capacity of the update broadcast.
    pub update_buffer: usize,
}

impl<T> Default for SubscriptionOptions<T> {
    fn default() -> Self {
        Self {
            token: None,
            fallback: None,
            fallback_interval: Duration::from_millis(DEFAULT_FALLBACK_INTERVAL_MS),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            promotion_interval: Duration::from_millis(DEFAULT_PROMOTION_INTERVAL_MS),
            update_buffer: DEFAULT_UPDATE_BUFFER,
        }
    }
}

impl<T> Clone for SubscriptionOptions<T> {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            fallback: self.fallback.clone(),
            fallback_interval: self.fallback_interval,
            max_reconnect_attempts: self.max_reconnect_attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            promotion_interval: self.promotion_interval,
            update_buffer: self.update_buffer,
        }
    }
}

impl<T> fmt::Debug for SubscriptionOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionOptions")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("fallback", &self.fallback.is_some())
            .field("fallback_interval", &self.fallback_interval)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("promotion_interval", &self.promotion_interval)
            .field("update_buffer", &self.update_buffer)
            .finish()
    }
}

impl<T> SubscriptionOptions<T> {
    /// Creates options with defaults and no fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the push token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the fallback producer.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Fetcher<T>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Sets the fallback producer from an async closure.
    #[must_use]
    pub fn with_fallback_fn<E, F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<FeedError>,
        T: 'static,
    {
        self.with_fallback(fetcher(f))
    }

    /// Sets the fallback polling interval.
    #[must_use]
    pub fn with_fallback_interval(mut self, interval: Duration) -> Self {
        self.fallback_interval = interval;
        self
    }

    /// Sets the failure count that triggers fallback.
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Sets the reconnect backoff bounds.
    #[must_use]
    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Sets the promotion interval.
    #[must_use]
    pub fn with_promotion_interval(mut self, interval: Duration) -> Self {
        self.promotion_interval = interval;
        self
    }

    /// Sets the update broadcast capacity.
    #[must_use]
    pub fn with_update_buffer(mut self, capacity: usize) -> Self {
        self.update_buffer = capacity;
        self
    }

    /// Returns the reconnect delay after `attempts` consecutive failures.
    ///
    /// `min(base * 2^attempts, max_delay)`, saturating on overflow.
    #[must_use]
    pub fn backoff_delay(&self, attempts: u32) -> Duration {
        let factor = 2u32.checked_pow(attempts).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidConfig`] if any interval is zero, the
    /// delay cap is below the base delay, or a count is zero.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.fallback_interval.is_zero() {
            return Err(FeedError::InvalidConfig(
                "fallback interval must be greater than 0".to_string(),
            ));
        }
        if self.promotion_interval.is_zero() {
            return Err(FeedError::InvalidConfig(
                "promotion interval must be greater than 0".to_string(),
            ));
        }
        if self.base_delay.is_zero() {
            return Err(FeedError::InvalidConfig(
                "base delay must be greater than 0".to_string(),
            ));
        }
        if self.max_delay < self.base_delay {
            return Err(FeedError::InvalidConfig(
                "max delay must not be below base delay".to_string(),
            ));
        }
        if self.max_reconnect_attempts == 0 {
            return Err(FeedError::InvalidConfig(
                "max reconnect attempts must be greater than 0".to_string(),
            ));
        }
        if self.update_buffer == 0 {
            return Err(FeedError::InvalidConfig(
                "update buffer must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
