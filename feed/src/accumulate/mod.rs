//! Domain accumulators.
//!
//! Accumulators fold every value delivered by a subscription into bounded
//! derived state. A [`Feed`] pairs a subscription with its accumulator and
//! applies each delivered value exactly once.

mod alerts;
mod candle;
mod flow;
mod sparkline;

use std::sync::Arc;

pub use alerts::{AlertLog, Notifier, TerminalBell, DEFAULT_MAX_ALERTS};
pub use candle::{Candle, CandleBuilder, DEFAULT_MAX_CANDLES};
pub use flow::{FlowHistory, FlowPoint, DEFAULT_FLOW_POINTS};
pub use sparkline::{SparklineBook, DEFAULT_SPARKLINE_POINTS};

use crate::subscription::Subscription;

/// Folds delivered values into derived state.
pub trait Accumulate<T> {
    /// Applies one delivered value.
    fn accumulate(&mut self, value: &T);
}

impl<T, A, B> Accumulate<T> for (A, B)
where
    A: Accumulate<T>,
    B: Accumulate<T>,
{
    fn accumulate(&mut self, value: &T) {
        self.0.accumulate(value);
        self.1.accumulate(value);
    }
}

/// A subscription driving an accumulator.
#[derive(Debug)]
pub struct Feed<T, A> {
    subscription: Subscription<T>,
    accumulator: A,
}

impl<T, A> Feed<T, A>
where
    T: Send + Sync + 'static,
    A: Accumulate<T>,
{
    /// Pairs a subscription with an accumulator.
    pub fn new(subscription: Subscription<T>, accumulator: A) -> Self {
        Self {
            subscription,
            accumulator,
        }
    }

    /// Waits for the next value, folds it in and returns it.
    ///
    /// Returns `None` once the subscription has shut down.
    pub async fn next(&mut self) -> Option<Arc<T>> {
        let value = self.subscription.next_update().await?;
        self.accumulator.accumulate(&value);
        Some(value)
    }

    /// Returns the subscription.
    #[must_use]
    pub fn subscription(&self) -> &Subscription<T> {
        &self.subscription
    }

    /// Returns the accumulator.
    #[must_use]
    pub fn accumulator(&self) -> &A {
        &self.accumulator
    }

    /// Returns the accumulator mutably.
    pub fn accumulator_mut(&mut self) -> &mut A {
        &mut self.accumulator
    }

    /// Splits the feed into its parts.
    pub fn into_parts(self) -> (Subscription<T>, A) {
        (self.subscription, self.accumulator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::subscription::{FeedHub, SubscriptionOptions};
    use crate::testing::scripted_transport;
    use serde_json::json;
    use tickerboard_sdk::{
        Alert, AlertPayload, AlertSeverity, AlertType, Channel, MarketSnapshot, WsConfig,
    };

    fn hub() -> (FeedHub, crate::testing::ScriptedAttempts) {
        let (transport, attempts) = scripted_transport();
        let hub = FeedHub::with_transport(WsConfig::new("ws://feed.test"), transport)
            .expect("valid config");
        (hub, attempts)
    }

    #[derive(Default)]
    struct Count(usize);

    impl Accumulate<MarketSnapshot> for Count {
        fn accumulate(&mut self, _value: &MarketSnapshot) {
            self.0 += 1;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_market_feed_builds_sparklines() {
        let (hub, mut attempts) = hub();
        let sub = hub
            .subscribe::<MarketSnapshot>(Channel::Market, SubscriptionOptions::new())
            .expect("subscribe");
        let mut feed = Feed::new(sub, (SparklineBook::default(), Count::default()));

        let socket = attempts.next().await.accept();
        for price in [25.0, 25.0, 25.5] {
            socket.send_json(&json!({"prices": {"HPG": {"last_price": price}}}));
        }
        for _ in 0..3 {
            feed.next().await.expect("snapshot");
        }

        let (sparklines, count) = feed.accumulator();
        assert_eq!(sparklines.points("HPG"), vec![25.0, 25.5]);
        assert_eq!(count.0, 3);
        assert!(feed.subscription().is_live());
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_feed_merges_fallback_batch_and_push() {
        let (hub, mut attempts) = hub();
        let batch = vec![Alert {
            id: "a1".to_string(),
            alert_type: AlertType::BasisDivergence,
            severity: AlertSeverity::Warning,
            symbol: "VN30F1M".to_string(),
            message: "basis widened".to_string(),
            timestamp: "2026-01-05T10:00:00".to_string(),
            data: serde_json::Value::Null,
        }];
        let options = SubscriptionOptions::new()
            .with_max_reconnect_attempts(1)
            .with_fallback_fn(move || {
                let batch = batch.clone();
                async move { Ok::<_, FeedError>(AlertPayload::Batch(batch)) }
            });
        let sub = hub
            .subscribe::<AlertPayload>(Channel::Alerts, options)
            .expect("subscribe");
        let mut feed = Feed::new(sub, AlertLog::default());

        attempts.next().await.fail("refused");
        feed.next().await.expect("fallback batch");
        assert_eq!(feed.accumulator().len(), 1);

        // A promotion succeeds and the same alert arrives again over push.
        let socket = attempts.next().await.accept();
        socket.send_json(&json!({
            "id": "a1",
            "alert_type": "basis_divergence",
            "severity": "warning",
            "symbol": "VN30F1M",
            "message": "basis widened",
            "timestamp": "2026-01-05T10:00:00"
        }));
        socket.send_json(&json!({
            "id": "a2",
            "alert_type": "volume_spike",
            "severity": "critical",
            "symbol": "FPT",
            "message": "volume 5x",
            "timestamp": "2026-01-05T10:01:00"
        }));

        // Fallback polls between demotion and promotion may add batches.
        while !feed.accumulator().contains("a2") {
            feed.next().await.expect("update");
        }
        let ids: Vec<&str> = feed.accumulator().alerts().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
        assert!(feed.subscription().is_live());
    }
}
