//! Per-channel subscription actor.
//!
//! One task owns the socket, the backoff timer, the fallback loop and the
//! promotion timer, and applies every transition sequentially.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tickerboard_sdk::{decode, Channel, Frame, FrameStream, Inbound, Transport, WsError};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, trace, warn};

use super::options::SubscriptionOptions;
use super::state::{ChannelState, ConnectionStatus};
use crate::error::FeedError;
use crate::metrics::FeedMetrics;
use crate::poller::PollLoop;

/// Commands sent from the handle to the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Reconnect,
    Shutdown,
}

enum Link {
    Idle,
    Connecting(BoxFuture<'static, Result<FrameStream, WsError>>),
    Open(FrameStream),
}

enum LinkEvent {
    Opened(FrameStream),
    Frame(Frame),
    Closed(Option<WsError>),
}

/// Fallback result tagged with the generation current when the loop started
/// and the epoch of the loop that produced it.
struct Tagged<T> {
    generation: u64,
    epoch: u64,
    outcome: Result<T, FeedError>,
}

pub(crate) struct ChannelWorker<T> {
    channel: Channel,
    url: String,
    transport: Arc<dyn Transport>,
    options: SubscriptionOptions<T>,
    metrics: Arc<FeedMetrics>,
    state: watch::Sender<ChannelState<T>>,
    updates: broadcast::Sender<Arc<T>>,
    commands: mpsc::UnboundedReceiver<Command>,
    fallback_tx: mpsc::UnboundedSender<Tagged<T>>,
    fallback_rx: mpsc::UnboundedReceiver<Tagged<T>>,
    link: Link,
    backoff: Option<Pin<Box<Sleep>>>,
    fallback: Option<PollLoop>,
    promotion: Option<Interval>,
    attempts: u32,
    generation: u64,
    /// Incremented for every fallback loop started.
    epoch: u64,
}

impl<T> ChannelWorker<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        channel: Channel,
        url: String,
        transport: Arc<dyn Transport>,
        options: SubscriptionOptions<T>,
        metrics: Arc<FeedMetrics>,
        state: watch::Sender<ChannelState<T>>,
        updates: broadcast::Sender<Arc<T>>,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        let (fallback_tx, fallback_rx) = mpsc::unbounded_channel();
        Self {
            channel,
            url,
            transport,
            options,
            metrics,
            state,
            updates,
            commands,
            fallback_tx,
            fallback_rx,
            link: Link::Idle,
            backoff: None,
            fallback: None,
            promotion: None,
            attempts: 0,
            generation: 0,
            epoch: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(channel = %self.channel, "subscription started");
        self.connect();

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Reconnect) => self.reconnect(),
                    Some(Command::Shutdown) | None => break,
                },
                event = next_link_event(&mut self.link) => match event {
                    LinkEvent::Opened(frames) => self.on_open(frames),
                    LinkEvent::Frame(frame) => self.on_frame(&frame),
                    LinkEvent::Closed(error) => self.on_close(error),
                },
                () = backoff_elapsed(&mut self.backoff) => {
                    self.backoff = None;
                    self.connect();
                }
                Some(tagged) = self.fallback_rx.recv() => self.on_fallback(tagged),
                () = promotion_due(&mut self.promotion) => self.promote(),
            }
        }

        self.teardown();
    }

    /// Applies `update` and mirrors the actor's counters into the state.
    fn publish(&self, update: impl FnOnce(&mut ChannelState<T>)) {
        let attempts = self.attempts;
        let generation = self.generation;
        let in_fallback = self.fallback.is_some();
        self.state.send_modify(|state| {
            update(state);
            state.attempts = attempts;
            state.generation = generation;
            state.in_fallback = in_fallback;
        });
    }

    fn connect(&mut self) {
        self.metrics.record_connect_attempt();
        debug!(channel = %self.channel, attempts = self.attempts, "opening push connection");

        // While on fallback the status stays Connected during promotion.
        if self.fallback.is_none() {
            self.publish(|state| state.status = ConnectionStatus::Connecting);
        }
        self.link = Link::Connecting(self.transport.open(&self.url));
    }

    fn on_open(&mut self, frames: FrameStream) {
        self.attempts = 0;
        self.generation += 1;
        self.backoff = None;
        let promoted = self.stop_fallback();
        self.link = Link::Open(frames);
        self.metrics.record_open();

        info!(
            channel = %self.channel,
            generation = self.generation,
            promoted,
            "push connection live"
        );
        self.publish(|state| {
            state.status = ConnectionStatus::Connected;
            state.is_live = true;
            state.error = None;
        });
    }

    fn on_frame(&mut self, frame: &Frame) {
        match decode::<T>(frame) {
            Inbound::Payload(payload) => {
                self.metrics.record_push_message();
                self.deliver(payload, false);
            }
            Inbound::Control => {
                self.metrics.record_control_frame();
                trace!(channel = %self.channel, "control frame");
            }
            Inbound::Ignored(reason) => {
                self.metrics.record_ignored_frame();
                debug!(channel = %self.channel, %reason, "dropping frame");
            }
        }
    }

    fn on_close(&mut self, error: Option<WsError>) {
        self.link = Link::Idle;
        self.attempts = self.attempts.saturating_add(1);
        self.metrics.record_close();
        let error = error.map(|err| FeedError::transport(self.channel, &err));

        if self.fallback.is_some() {
            debug!(channel = %self.channel, "promotion attempt failed, staying on fallback");
            self.publish(|state| {
                if let Some(err) = error {
                    state.error = Some(err);
                }
            });
            return;
        }

        self.publish(|state| {
            state.status = ConnectionStatus::Disconnected;
            state.is_live = false;
            if let Some(err) = error {
                state.error = Some(err);
            }
        });

        if self.attempts >= self.options.max_reconnect_attempts && self.options.fallback.is_some() {
            self.start_fallback();
            return;
        }

        let delay = self.options.backoff_delay(self.attempts);
        warn!(
            channel = %self.channel,
            attempts = self.attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "push connection lost, retrying"
        );
        self.backoff = Some(Box::pin(tokio::time::sleep(delay)));
    }

    fn start_fallback(&mut self) {
        let Some(fetcher) = self.options.fallback.clone() else {
            return;
        };
        if self.fallback.is_some() {
            return;
        }

        self.epoch += 1;
        let generation = self.generation;
        let epoch = self.epoch;
        let tx = self.fallback_tx.clone();
        let metrics = Arc::clone(&self.metrics);
        self.fallback = Some(PollLoop::spawn(
            fetcher,
            self.options.fallback_interval,
            move |outcome| {
                metrics.record_fallback_poll(outcome.is_err());
                let _ = tx.send(Tagged {
                    generation,
                    epoch,
                    outcome,
                });
            },
        ));

        let period = self.options.promotion_interval;
        let mut promotion = tokio::time::interval_at(Instant::now() + period, period);
        promotion.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.promotion = Some(promotion);

        self.metrics.record_fallback_activation();
        warn!(
            channel = %self.channel,
            attempts = self.attempts,
            generation,
            epoch,
            "push unavailable, switching to fallback polling"
        );
        self.publish(|state| {
            state.status = ConnectionStatus::Connected;
            state.is_live = false;
        });
    }

    /// Stops the fallback loop and promotion timer. Returns true if a
    /// fallback was running.
    fn stop_fallback(&mut self) -> bool {
        self.promotion = None;
        match self.fallback.take() {
            Some(poll) => {
                poll.stop();
                true
            }
            None => false,
        }
    }

    fn on_fallback(&mut self, tagged: Tagged<T>) {
        let stale = self.fallback.is_none()
            || tagged.generation != self.generation
            || tagged.epoch != self.epoch;
        if stale {
            self.metrics.record_stale_discard();
            debug!(
                channel = %self.channel,
                captured = tagged.generation,
                current = self.generation,
                loop_epoch = tagged.epoch,
                active_epoch = self.epoch,
                "discarding stale fallback response"
            );
            return;
        }

        match tagged.outcome {
            Ok(payload) => self.deliver(payload, true),
            Err(err) => {
                warn!(channel = %self.channel, error = %err, "fallback fetch failed");
                self.publish(|state| state.error = Some(err));
            }
        }
    }

    fn deliver(&self, payload: T, clear_error: bool) {
        let value = Arc::new(payload);
        self.publish(|state| {
            state.data = Some(Arc::clone(&value));
            if clear_error {
                state.error = None;
            }
        });
        // No receivers is fine.
        let _ = self.updates.send(value);
    }

    fn promote(&mut self) {
        self.attempts = 0;
        info!(channel = %self.channel, "attempting promotion back to push");
        self.connect();
    }

    fn reconnect(&mut self) {
        info!(channel = %self.channel, "manual reconnect");
        self.metrics.record_manual_reconnect();
        self.attempts = 0;
        self.backoff = None;
        self.stop_fallback();
        self.link = Link::Idle;
        self.publish(|state| state.is_live = false);
        self.connect();
    }

    fn teardown(&mut self) {
        self.backoff = None;
        self.stop_fallback();
        self.link = Link::Idle;
        debug!(channel = %self.channel, "subscription closed");
    }
}

async fn next_link_event(link: &mut Link) -> LinkEvent {
    match link {
        Link::Idle => future::pending().await,
        Link::Connecting(connecting) => match connecting.await {
            Ok(frames) => LinkEvent::Opened(frames),
            Err(err) => LinkEvent::Closed(Some(err)),
        },
        Link::Open(frames) => match frames.next().await {
            Some(Ok(frame)) => LinkEvent::Frame(frame),
            Some(Err(WsError::Closed)) | None => LinkEvent::Closed(None),
            Some(Err(err)) => LinkEvent::Closed(Some(err)),
        },
    }
}

async fn backoff_elapsed(backoff: &mut Option<Pin<Box<Sleep>>>) {
    match backoff {
        Some(sleep) => sleep.as_mut().await,
        None => future::pending().await,
    }
}

async fn promotion_due(promotion: &mut Option<Interval>) {
    match promotion {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}
