//! Live channel subscriptions.
//!
//! A [`FeedHub`] opens one [`Subscription`] per channel. Each subscription is
//! an actor task that keeps a push connection alive with capped exponential
//! backoff, demotes to a polling fallback after repeated failures, and
//! periodically tries to promote back to push. Fallback responses are tagged
//! with the connection generation so a response started before a push
//! connection opened is never applied after it.
//!
//! # Example
//!
//! ```rust,ignore
//! use tickerboard_feed::{FeedHub, SubscriptionOptions};
//! use tickerboard_sdk::{Channel, MarketClient, MarketSnapshot, WsConfig};
//!
//! let client = MarketClient::with_defaults()?;
//! let hub = FeedHub::new(WsConfig::default())?;
//! let mut market = hub.subscribe::<MarketSnapshot>(
//!     Channel::Market,
//!     SubscriptionOptions::new().with_fallback_fn(move || {
//!         let client = client.clone();
//!         async move { client.get_snapshot().await }
//!     }),
//! )?;
//!
//! while let Some(snapshot) = market.next_update().await {
//!     println!("live={} prices={}", market.is_live(), snapshot.prices.len());
//! }
//! ```

mod options;
mod state;
mod worker;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tickerboard_sdk::{Channel, Transport, TungsteniteTransport, WsConfig};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::warn;

pub use options::{
    SubscriptionOptions, DEFAULT_BASE_DELAY_MS, DEFAULT_FALLBACK_INTERVAL_MS,
    DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_PROMOTION_INTERVAL_MS,
    DEFAULT_UPDATE_BUFFER,
};
pub use state::{ChannelState, ConnectionStatus};

use crate::error::FeedError;
use crate::metrics::FeedMetrics;
use worker::{ChannelWorker, Command};

/// Opens channel subscriptions against one push endpoint.
#[derive(Clone)]
pub struct FeedHub {
    ws: WsConfig,
    transport: Arc<dyn Transport>,
    metrics: Arc<FeedMetrics>,
}

impl fmt::Debug for FeedHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedHub")
            .field("url", &self.ws.url)
            .finish_non_exhaustive()
    }
}

impl FeedHub {
    /// Creates a hub using the WebSocket transport.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidConfig`] if the push config is invalid.
    pub fn new(ws: WsConfig) -> Result<Self, FeedError> {
        Self::with_transport(ws, Arc::new(TungsteniteTransport::default()))
    }

    /// Creates a hub with a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidConfig`] if the push config is invalid.
    pub fn with_transport(ws: WsConfig, transport: Arc<dyn Transport>) -> Result<Self, FeedError> {
        ws.validate()
            .map_err(|e| FeedError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            ws,
            transport,
            metrics: Arc::new(FeedMetrics::new()),
        })
    }

    /// Returns the push config.
    #[must_use]
    pub fn config(&self) -> &WsConfig {
        &self.ws
    }

    /// Returns metrics shared by all subscriptions from this hub.
    #[must_use]
    pub fn metrics(&self) -> Arc<FeedMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Subscribes to a channel and starts connecting immediately.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidConfig`] if the options are invalid or the
    /// channel URL cannot be built.
    pub fn subscribe<T>(
        &self,
        channel: Channel,
        options: SubscriptionOptions<T>,
    ) -> Result<Subscription<T>, FeedError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        options.validate()?;

        let mut ws = self.ws.clone();
        if let Some(token) = &options.token {
            ws = ws.with_token(token.clone());
        }
        let url = ws
            .channel_url(channel)
            .map_err(|e| FeedError::InvalidConfig(e.to_string()))?;

        let (state_tx, state) = watch::channel(ChannelState::default());
        let (updates_tx, updates) = broadcast::channel(options.update_buffer);
        let (commands, commands_rx) = mpsc::unbounded_channel();

        let worker = ChannelWorker::new(
            channel,
            url,
            Arc::clone(&self.transport),
            options,
            Arc::clone(&self.metrics),
            state_tx,
            updates_tx,
            commands_rx,
        );
        let task = tokio::spawn(worker.run());

        Ok(Subscription {
            channel,
            state,
            updates,
            commands,
            task,
        })
    }
}

/// Handle to one channel subscription.
///
/// Dropping the handle tears the subscription down: timers are cleared, the
/// socket is closed and no further state is published.
#[derive(Debug)]
pub struct Subscription<T> {
    channel: Channel,
    state: watch::Receiver<ChannelState<T>>,
    updates: broadcast::Receiver<Arc<T>>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl<T> Subscription<T>
where
    T: Send + Sync + 'static,
{
    /// Returns the subscribed channel.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn state(&self) -> ChannelState<T> {
        self.state.borrow().clone()
    }

    /// Returns the latest value.
    #[must_use]
    pub fn data(&self) -> Option<Arc<T>> {
        self.state.borrow().data.clone()
    }

    /// Returns the connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.state.borrow().status
    }

    /// Returns the most recent error.
    #[must_use]
    pub fn error(&self) -> Option<FeedError> {
        self.state.borrow().error.clone()
    }

    /// Returns true iff values are arriving over push.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state.borrow().is_live
    }

    /// Drops any connection or fallback and reconnects immediately.
    pub fn reconnect(&self) {
        let _ = self.commands.send(Command::Reconnect);
    }

    /// Returns a receiver observing this subscription's state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ChannelState<T>> {
        self.state.clone()
    }

    /// Waits for the next state change.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Closed`] once the subscription has shut down.
    pub async fn changed(&mut self) -> Result<(), FeedError> {
        self.state.changed().await.map_err(|_| FeedError::Closed)
    }

    /// Waits until the state satisfies `predicate` and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Closed`] if the subscription shuts down first.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&ChannelState<T>) -> bool,
    ) -> Result<ChannelState<T>, FeedError> {
        self.state
            .wait_for(|state| predicate(state))
            .await
            .map(|state| state.clone())
            .map_err(|_| FeedError::Closed)
    }

    /// Waits for the next delivered value.
    ///
    /// Returns `None` once the subscription has shut down. If the consumer
    /// fell behind, skipped values are logged and the newest retained value
    /// is returned.
    pub async fn next_update(&mut self) -> Option<Arc<T>> {
        loop {
            match self.updates.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "subscriber lagged, values skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns an already delivered value without waiting.
    pub fn try_next_update(&mut self) -> Option<Arc<T>> {
        loop {
            match self.updates.try_recv() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "subscriber lagged, values skipped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Shuts the subscription down and waits for the actor to exit.
    pub async fn close(self) {
        let _ = self.commands.send(Command::Shutdown);
        let _ = self.task.await;
    }
}
