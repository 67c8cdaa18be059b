//! Persistent socket client for the worker
//!
//! One JSON request frame per script execution, one JSON response frame
//! back. Requests are serialized one at a time over the socket; the worker
//! answers in order.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{HostError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Socket connection to a running worker
pub struct SocketClient {
    stream: Mutex<WsStream>,
    url: String,
}

impl SocketClient {
    /// Connect to the worker, retrying until the timeout elapses
    ///
    /// The worker needs a moment after spawn to bind its socket, so
    /// connection refusals are retried on a short interval.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let deadline = Instant::now() + timeout;

        loop {
            match tokio_tungstenite::connect_async(url).await {
                Ok((stream, _response)) => {
                    log::info!("Connected to worker at {}", url);
                    return Ok(Self {
                        stream: Mutex::new(stream),
                        url: url.to_string(),
                    });
                }
                Err(e) => {
                    if Instant::now() >= deadline {
                        return Err(HostError::Connect {
                            url: url.to_string(),
                            message: e.to_string(),
                        });
                    }
                    log::debug!("Worker not ready at {} ({}), retrying", url, e);
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
            }
        }
    }

    /// The URL this client is connected to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Execute one script and return the worker's result value
    ///
    /// Holds the socket for the whole round trip, so concurrent callers
    /// queue up rather than interleave frames.
    pub async fn request(&self, script_path: &str, params: &Value) -> Result<Value> {
        let payload = serde_json::json!({
            "script_path": script_path,
            "params": params,
        });

        let mut stream = self.stream.lock().await;
        stream
            .send(Message::Text(payload.to_string().into()))
            .await?;

        while let Some(message) = stream.next().await {
            match message? {
                Message::Text(text) => return parse_response(text.as_str()),
                Message::Ping(data) => {
                    stream.send(Message::Pong(data)).await?;
                }
                Message::Close(_) => return Err(HostError::ConnectionClosed),
                _ => {}
            }
        }
        Err(HostError::ConnectionClosed)
    }

    /// Close the socket
    pub async fn close(&self) {
        let mut stream = self.stream.lock().await;
        if let Err(e) = stream.close(None).await {
            log::debug!("Error closing worker socket: {}", e);
        }
    }
}

/// Decode one worker response frame
///
/// `{"status": "success", "result": ...}` yields the result value;
/// `{"status": "error", "message": ...}` yields a script error carrying the
/// worker's message unchanged.
fn parse_response(text: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| HostError::Protocol(format!("response is not JSON: {}", e)))?;

    match value.get("status").and_then(|s| s.as_str()) {
        Some("success") => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
        Some("error") => {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown worker error")
                .to_string();
            Err(HostError::Script { message })
        }
        _ => Err(HostError::Protocol(format!(
            "response has no status field: {}",
            text
        ))),
    }
}
