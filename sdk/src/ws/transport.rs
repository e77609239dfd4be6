//! Push transport.
//!
//! The subscription layer opens connections through [`Transport`], so the
//! WebSocket implementation can be swapped for a scripted one in tests.

use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::stream::{BoxStream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::error::WsError;
use super::messages::Frame;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Frames of one open connection.
///
/// The stream yields `Err(WsError::Closed)` or ends when the peer closes.
/// Dropping it closes the connection.
pub type FrameStream = BoxStream<'static, Result<Frame, WsError>>;

/// Opens push connections.
pub trait Transport: Send + Sync + 'static {
    /// Opens a connection to `url`.
    fn open(&self, url: &str) -> BoxFuture<'static, Result<FrameStream, WsError>>;
}

/// WebSocket transport backed by `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct TungsteniteTransport {
    connect_timeout: Duration,
}

impl Default for TungsteniteTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl TungsteniteTransport {
    /// Creates a transport with the given connect timeout.
    #[must_use]
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Transport for TungsteniteTransport {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<FrameStream, WsError>> {
        let url = url.to_string();
        let connect_timeout = self.connect_timeout;

        async move {
            let (ws_stream, _) = tokio::time::timeout(connect_timeout, connect_async(url.as_str()))
                .await
                .map_err(|_| WsError::Connection(format!("timed out after {:?}", connect_timeout)))?
                .map_err(|e| WsError::Connection(e.to_string()))?;

            let frames = ws_stream.filter_map(|message| {
                future::ready(match message {
                    Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
                    Ok(Message::Binary(bytes)) => Some(Ok(Frame::Binary(bytes.to_vec()))),
                    Ok(Message::Close(_)) => Some(Err(WsError::Closed)),
                    // Ping/pong are answered by tungstenite.
                    Ok(_) => None,
                    Err(e) => Some(Err(WsError::from(e))),
                })
            });

            Ok(frames.boxed())
        }
        .boxed()
    }
}
