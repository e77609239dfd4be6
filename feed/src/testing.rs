//! Scripted doubles for the push transport and polling producers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use tickerboard_sdk::{Frame, FrameStream, Transport, WsError};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::FeedError;
use crate::poller::Fetcher;

/// Transport whose connection attempts are answered by the test.
pub(crate) struct ScriptedTransport {
    attempts: mpsc::UnboundedSender<PendingConnect>,
}

/// Receiving side of a [`ScriptedTransport`].
pub(crate) struct ScriptedAttempts {
    rx: mpsc::UnboundedReceiver<PendingConnect>,
}

pub(crate) fn scripted_transport() -> (Arc<ScriptedTransport>, ScriptedAttempts) {
    let (attempts, rx) = mpsc::unbounded_channel();
    (Arc::new(ScriptedTransport { attempts }), ScriptedAttempts { rx })
}

impl Transport for ScriptedTransport {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<FrameStream, WsError>> {
        let (respond, response) = oneshot::channel();
        let _ = self.attempts.send(PendingConnect {
            url: url.to_string(),
            respond,
        });
        async move {
            response
                .await
                .unwrap_or_else(|_| Err(WsError::Connection("script dropped".to_string())))
        }
        .boxed()
    }
}

impl ScriptedAttempts {
    /// Waits for the next connection attempt.
    pub(crate) async fn next(&mut self) -> PendingConnect {
        self.rx.recv().await.expect("transport dropped")
    }

    /// Returns an attempt if one is already queued.
    pub(crate) fn try_next(&mut self) -> Option<PendingConnect> {
        self.rx.try_recv().ok()
    }
}

/// A connection attempt awaiting the test's verdict.
pub(crate) struct PendingConnect {
    pub(crate) url: String,
    respond: oneshot::Sender<Result<FrameStream, WsError>>,
}

impl PendingConnect {
    /// Opens the connection.
    pub(crate) fn accept(self) -> LiveSocket {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self
            .respond
            .send(Ok(UnboundedReceiverStream::new(rx).boxed()));
        LiveSocket { tx }
    }

    /// Refuses the connection.
    pub(crate) fn fail(self, reason: &str) {
        let _ = self
            .respond
            .send(Err(WsError::Connection(reason.to_string())));
    }
}

/// Server side of an accepted scripted connection.
pub(crate) struct LiveSocket {
    tx: mpsc::UnboundedSender<Result<Frame, WsError>>,
}

impl LiveSocket {
    pub(crate) fn send_text(&self, text: &str) {
        let _ = self.tx.send(Ok(Frame::Text(text.to_string())));
    }

    pub(crate) fn send_json(&self, value: &serde_json::Value) {
        self.send_text(&value.to_string());
    }

    pub(crate) fn send_binary(&self, bytes: &[u8]) {
        let _ = self.tx.send(Ok(Frame::Binary(bytes.to_vec())));
    }

    /// Closes the connection with a close frame.
    pub(crate) fn close(self) {
        let _ = self.tx.send(Err(WsError::Closed));
    }

    /// Breaks the connection with a protocol error.
    pub(crate) fn break_with(self, reason: &str) {
        let _ = self.tx.send(Err(WsError::Protocol(reason.to_string())));
    }

    /// Resolves once the client side has dropped the connection.
    pub(crate) async fn dropped(&self) {
        self.tx.closed().await;
    }
}

/// Producer whose invocations are answered by the test.
pub(crate) fn gated_fetcher<T: Send + 'static>() -> (Fetcher<T>, FetchGate<T>) {
    let (requests, rx) = mpsc::unbounded_channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let fetch: Fetcher<T> = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let (respond, response) = oneshot::channel();
        let _ = requests.send(GateRequest { respond });
        async move { response.await.unwrap_or(Err(FeedError::Closed)) }.boxed()
    });
    (fetch, FetchGate { rx, calls })
}

pub(crate) struct FetchGate<T> {
    rx: mpsc::UnboundedReceiver<GateRequest<T>>,
    calls: Arc<AtomicUsize>,
}

impl<T> FetchGate<T> {
    pub(crate) async fn next(&mut self) -> GateRequest<T> {
        self.rx.recv().await.expect("producer dropped")
    }

    pub(crate) fn try_next(&mut self) -> Option<GateRequest<T>> {
        self.rx.try_recv().ok()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub(crate) struct GateRequest<T> {
    respond: oneshot::Sender<Result<T, FeedError>>,
}

impl<T> GateRequest<T> {
    pub(crate) fn respond(self, outcome: Result<T, FeedError>) {
        let _ = self.respond.send(outcome);
    }
}
