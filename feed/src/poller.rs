//! Polling engine.
//!
//! [`PollLoop`] invokes an async producer immediately and then on a fixed
//! period, skipping ticks while a previous invocation is unsettled. [`Poller`]
//! wraps it for consumers, publishing `{data, loading, error}` over a
//! `watch` channel.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

use crate::error::FeedError;

/// Shortest accepted polling period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Shared async producer invoked by the polling engine.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, FeedError>> + Send + Sync>;

/// Builds a [`Fetcher`] from a closure returning a future.
///
/// Any error type convertible into [`FeedError`] is accepted, so REST calls
/// returning `ClientError` can be passed directly.
pub fn fetcher<T, E, F, Fut>(f: F) -> Fetcher<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<FeedError>,
    T: 'static,
{
    Arc::new(move || f().map(|result| result.map_err(Into::into)).boxed())
}

/// Runs a producer once, turning a panic into [`FeedError::Panicked`].
async fn invoke<T>(fetcher: Fetcher<T>) -> Result<T, FeedError> {
    AssertUnwindSafe(async move { fetcher().await })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(FeedError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "producer panicked".to_string()
    }
}

/// Timer-driven producer loop with an in-flight guard.
///
/// Outcomes are handed to a sink closure. Stopping the loop cancels the timer
/// only; a request already in flight still reaches the sink, so the sink owns
/// any staleness checks.
#[derive(Debug)]
pub struct PollLoop {
    ticker: JoinHandle<()>,
    refresh_tx: mpsc::UnboundedSender<()>,
    in_flight: Arc<AtomicBool>,
}

impl PollLoop {
    /// Spawns the loop. The first invocation happens immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<T, S>(fetcher: Fetcher<T>, period: Duration, sink: S) -> Self
    where
        T: Send + 'static,
        S: Fn(Result<T, FeedError>) + Send + Sync + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel();
        let in_flight = Arc::new(AtomicBool::new(false));
        let sink = Arc::new(sink);

        let guard = Arc::clone(&in_flight);
        let ticker = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticks.tick() => {}
                    Some(()) = refresh_rx.recv() => {}
                }
                dispatch(&fetcher, &guard, &sink);
            }
        });

        Self {
            ticker,
            refresh_tx,
            in_flight,
        }
    }

    /// Requests an out-of-cycle invocation, subject to the in-flight guard.
    pub fn refresh(&self) {
        let _ = self.refresh_tx.send(());
    }

    /// Returns true while an invocation is unsettled.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Stops the timer.
    pub fn stop(&self) {
        self.ticker.abort();
    }

    /// Returns true once the timer task has stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.ticker.is_finished()
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

fn dispatch<T, S>(fetcher: &Fetcher<T>, in_flight: &Arc<AtomicBool>, sink: &Arc<S>)
where
    T: Send + 'static,
    S: Fn(Result<T, FeedError>) + Send + Sync + 'static,
{
    if in_flight.swap(true, Ordering::AcqRel) {
        trace!("poll tick skipped, previous request still in flight");
        return;
    }

    let fetcher = Arc::clone(fetcher);
    let in_flight = Arc::clone(in_flight);
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        let outcome = invoke(fetcher).await;
        sink(outcome);
        in_flight.store(false, Ordering::Release);
    });
}

/// Consumer-visible polling state.
#[derive(Debug)]
pub struct PollState<T> {
    /// Last successful value.
    pub data: Option<Arc<T>>,
    /// True until the first invocation settles.
    pub loading: bool,
    /// Error from the most recent invocation, cleared by the next success.
    pub error: Option<FeedError>,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }
}

impl<T> Clone for PollState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T> PollState<T> {
    fn apply(&mut self, outcome: Result<T, FeedError>) {
        self.loading = false;
        match outcome {
            Ok(value) => {
                self.data = Some(Arc::new(value));
                self.error = None;
            }
            Err(err) => self.error = Some(err),
        }
    }
}

/// Polls a REST resource on a fixed period.
///
/// Dropping the poller stops the timer; a response arriving afterwards is
/// discarded.
///
/// # Example
///
/// ```rust,ignore
/// let client = MarketClient::with_defaults()?;
/// let mut stats = Poller::spawn(
///     fetcher(move || {
///         let client = client.clone();
///         async move { client.get_volume_stats().await }
///     }),
///     Duration::from_secs(10),
/// );
/// stats.changed().await?;
/// println!("{:?}", stats.data());
/// ```
#[derive(Debug)]
pub struct Poller<T> {
    state: watch::Receiver<PollState<T>>,
    disposed: Arc<AtomicBool>,
    inner: PollLoop,
}

impl<T> Poller<T>
where
    T: Send + Sync + 'static,
{
    /// Spawns a poller. Must be called from within a tokio runtime.
    pub fn spawn(fetcher: Fetcher<T>, period: Duration) -> Self {
        let (tx, state) = watch::channel(PollState::default());
        let disposed = Arc::new(AtomicBool::new(false));

        let guard = Arc::clone(&disposed);
        let inner = PollLoop::spawn(fetcher, period, move |outcome| {
            if guard.load(Ordering::Acquire) {
                trace!("discarding poll result after teardown");
                return;
            }
            tx.send_modify(|state| state.apply(outcome));
        });

        Self {
            state,
            disposed,
            inner,
        }
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn state(&self) -> PollState<T> {
        self.state.borrow().clone()
    }

    /// Returns the last successful value.
    #[must_use]
    pub fn data(&self) -> Option<Arc<T>> {
        self.state.borrow().data.clone()
    }

    /// Returns the most recent error.
    #[must_use]
    pub fn error(&self) -> Option<FeedError> {
        self.state.borrow().error.clone()
    }

    /// Returns true until the first invocation settles.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Triggers an out-of-cycle fetch.
    pub fn refresh(&self) {
        self.inner.refresh();
    }

    /// Returns a receiver observing this poller's state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<PollState<T>> {
        self.state.clone()
    }

    /// Waits for the next state change.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Closed`] once the poller can no longer publish.
    pub async fn changed(&mut self) -> Result<(), FeedError> {
        self.state.changed().await.map_err(|_| FeedError::Closed)
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.disposed.store(true, Ordering::Release);
        self.inner.stop();
    }
}
