//! Per-call transport layer.
//!
//! The device exposes its control surface as short-lived WebSocket
//! connections: one connection per logical call. This module turns one
//! [`CallRequest`] into one connection and exactly one settlement.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   CallRequest    ┌──────────────┐   ws://host:port/path   ┌──────────┐
//! │     Client      │ ───────────────► │ WsTransport  │ ──────────────────────► │  Device  │
//! │ (orchestrator)  │ ◄─────────────── │ PendingCall  │ ◄────────────────────── │          │
//! └─────────────────┘  Value / Error   └──────────────┘  Set-Cookie, one frame  └──────────┘
//!          │                                  │
//!          └──────────── CookieSink ◄─────────┘
//! ```
//!
//! # Call Lifecycle
//!
//! 1. Build `ws://{host}:{port}{path}` (fails fast if the host is unset)
//! 2. Connect with `Origin` and, if any, `Cookie` headers
//! 3. Hand `Set-Cookie` headers of the handshake to the [`CookieSink`]
//! 4. Send the payload, if any, as one text frame
//! 5. Settle: immediately for no-reply calls, on the first frame otherwise
//! 6. Close the connection; later events are ignored
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `asset` | HTTP GET of binary resources |
//! | `call` | Settle-once pending call |
//! | `cookies` | Cookie jar and `Set-Cookie` parsing |
//! | `endpoint` | Host and ports, URL construction |
//! | `websocket` | tokio-tungstenite implementation of [`Transport`] |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::CallId;

// ============================================================================
// Submodules
// ============================================================================

/// HTTP GET of binary resources.
pub mod asset;

/// Settle-once pending call.
pub mod call;

/// Cookie jar and `Set-Cookie` parsing.
pub mod cookies;

/// Host and ports, URL construction.
pub mod endpoint;

/// WebSocket implementation of [`Transport`].
pub mod websocket;

/// Scripted transport for unit tests.
#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use asset::AssetFetcher;
pub use call::{PendingCall, Settlement};
pub use cookies::{Cookie, CookieJar};
pub use endpoint::Endpoint;
pub use websocket::WsTransport;

// ============================================================================
// CallRequest
// ============================================================================

/// Everything needed to perform one call.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Identifier used in log lines of this call.
    pub id: CallId,
    /// Endpoint snapshot taken when the call started.
    pub endpoint: Endpoint,
    /// Control path, always starting with `/`.
    pub path: String,
    /// JSON body sent as one text frame right after connecting.
    pub payload: Option<Value>,
    /// Whether to wait for one reply frame.
    pub expect_reply: bool,
    /// Deadline for the whole call, connect included.
    pub timeout: Duration,
    /// Serialized `Cookie` header, if the session holds cookies.
    pub cookie_header: Option<String>,
}

// ============================================================================
// Traits
// ============================================================================

/// Receives cookies set by handshake responses.
pub trait CookieSink: Send + Sync {
    /// Merges cookies into the session, last write wins per name.
    fn store_cookies(&self, cookies: Vec<Cookie>);
}

/// Performs one call over one fresh connection.
///
/// Implementations must settle exactly once and never reuse a connection
/// across calls.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Performs the call.
    ///
    /// Returns the parsed reply, or [`Value::Null`] for no-reply calls and
    /// empty replies.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if the host is unset
    /// - [`Error::Authentication`](crate::Error::Authentication) on a 401 handshake
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) if the
    ///   connection closed before an expected reply
    /// - [`Error::RequestTimeout`](crate::Error::RequestTimeout) past the deadline
    /// - [`Error::Json`](crate::Error::Json) if the reply is not JSON
    async fn perform_call(&self, request: CallRequest, cookies: Arc<dyn CookieSink>)
    -> Result<Value>;
}
