//! WebSocket implementation of [`Transport`].
//!
//! Each call spawns one connection task that owns the socket and a
//! [`PendingCall`]. The task runs under the call's deadline: when it passes,
//! the socket is dropped mid-connect or mid-read instead of waiting for a
//! graceful close. This holds even when the caller stops waiting early.
//! A waiting caller also aborts the task on the deadline.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::handshake::client::Request as WsRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{COOKIE, ORIGIN, SET_COOKIE};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::call::PendingCall;
use super::cookies::parse_set_cookies;
use super::{CallRequest, CookieSink, Transport};

// ============================================================================
// Constants
// ============================================================================

/// `Origin` header the device's web controller sends.
pub const DEFAULT_ORIGIN: &str = "http://web-control.yololiv.com";

/// Upper bound on the closing handshake after settlement.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Types
// ============================================================================

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WsTransport
// ============================================================================

/// Opens one WebSocket connection per call.
#[derive(Debug, Clone)]
pub struct WsTransport {
    /// `Origin` header value.
    origin: HeaderValue,
}

impl Default for WsTransport {
    fn default() -> Self {
        Self {
            origin: HeaderValue::from_static(DEFAULT_ORIGIN),
        }
    }
}

impl WsTransport {
    /// Creates a transport sending the default `Origin`.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport sending a custom `Origin`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `origin` is not a valid header value.
    pub fn with_origin(origin: &str) -> Result<Self> {
        let origin = HeaderValue::from_str(origin)
            .map_err(|e| Error::config(format!("Invalid origin {origin:?}: {e}")))?;
        Ok(Self { origin })
    }

    /// Builds the handshake request with `Origin` and `Cookie` headers.
    fn build_request(&self, request: &CallRequest) -> Result<WsRequest> {
        let url = request.endpoint.ws_url(&request.path)?;
        let mut ws_request = url.as_str().into_client_request()?;

        let headers = ws_request.headers_mut();
        headers.insert(ORIGIN, self.origin.clone());

        if let Some(cookie) = request.cookie_header.as_deref() {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| Error::invalid_argument(format!("Invalid cookie header: {e}")))?;
            headers.insert(COOKIE, value);
        }

        Ok(ws_request)
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn perform_call(
        &self,
        request: CallRequest,
        cookies: Arc<dyn CookieSink>,
    ) -> Result<Value> {
        let ws_request = self.build_request(&request)?;
        let timeout_ms = request.timeout.as_millis() as u64;
        let deadline = Instant::now() + request.timeout;

        let (call, settled) =
            PendingCall::new(request.id, &request.path, request.expect_reply, deadline);

        trace!(call_id = %request.id, path = %request.path, "Opening connection");

        let task = tokio::spawn(run_call(ws_request, request.payload, call, cookies, timeout_ms));

        match timeout_at(deadline, settled).await {
            Ok(Ok(outcome)) => outcome,
            // Task ended without settling
            Ok(Err(_)) => Err(Error::connection_closed(&request.path)),
            Err(_) => {
                task.abort();
                debug!(call_id = %request.id, path = %request.path, timeout_ms, "Call timed out, connection terminated");
                Err(Error::request_timeout(&request.path, timeout_ms))
            }
        }
    }
}

// ============================================================================
// Connection Task
// ============================================================================

/// Runs one connection under the call's deadline.
async fn run_call(
    ws_request: WsRequest,
    payload: Option<Value>,
    mut call: PendingCall,
    cookies: Arc<dyn CookieSink>,
    timeout_ms: u64,
) {
    let deadline = call.deadline();
    let driven = timeout_at(deadline, drive_call(ws_request, payload, &mut call, cookies)).await;

    if driven.is_err() {
        let error = Error::request_timeout(call.path(), timeout_ms);
        if call.fail(error) {
            debug!(call_id = %call.id(), path = %call.path(), timeout_ms, "Deadline passed, connection dropped");
        }
    }
}

/// Drives one connection from connect to close.
async fn drive_call(
    ws_request: WsRequest,
    payload: Option<Value>,
    call: &mut PendingCall,
    cookies: Arc<dyn CookieSink>,
) {
    let (mut socket, response) = match connect_async(ws_request).await {
        Ok(pair) => pair,
        Err(WsError::Http(response)) => {
            call.fail(Error::handshake(response.status().as_u16()));
            return;
        }
        Err(e) => {
            call.fail(Error::connection(e.to_string()));
            return;
        }
    };

    let received = parse_set_cookies(
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    );
    if !received.is_empty() {
        trace!(call_id = %call.id(), count = received.len(), "Handshake set cookies");
        cookies.store_cookies(received);
    }

    if let Some(payload) = payload {
        let text = match serde_json::to_string(&payload) {
            Ok(text) => text,
            Err(e) => {
                call.fail(Error::Json(e));
                close_quietly(socket).await;
                return;
            }
        };

        if let Err(e) = socket.send(Message::Text(text.into())).await {
            if is_close(&e) {
                call.on_close();
            } else {
                call.fail(Error::connection(e.to_string()));
            }
            return;
        }
    }

    if !call.expects_reply() {
        call.resolve(Value::Null);
        close_quietly(socket).await;
        return;
    }

    while !call.is_settled() {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => {
                call.on_message(text.as_str());
            }

            Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    call.on_message(text);
                }
                Err(_) => {
                    call.fail(Error::protocol("Reply is not valid UTF-8"));
                }
            },

            Some(Ok(Message::Close(_))) | None => {
                call.on_close();
                return;
            }

            Some(Err(e)) if is_close(&e) => {
                call.on_close();
                return;
            }

            Some(Err(e)) => {
                call.fail(Error::connection(e.to_string()));
                return;
            }

            // Ignore Ping, Pong, raw frames
            Some(Ok(_)) => {}
        }
    }

    close_quietly(socket).await;
}

/// Returns `true` for errors that only mean "the peer went away".
fn is_close(error: &WsError) -> bool {
    matches!(
        error,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}

/// Closes the socket, tolerating a connection that is already gone.
async fn close_quietly(mut socket: Socket) {
    let _ = timeout(CLOSE_TIMEOUT, async {
        if socket.close(None).await.is_err() {
            return;
        }
        while let Some(Ok(_)) = socket.next().await {}
    })
    .await;
}
