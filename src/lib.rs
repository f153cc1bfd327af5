//! YoloBox Control - remote control client for YoloBox live production devices.
//!
//! This library talks to a YoloBox over its remote-controller protocol:
//! one short-lived WebSocket connection per call, cookie-based sessions and
//! `{orderID, data}` order envelopes.
//!
//! # Architecture
//!
//! The client is split into three layers:
//!
//! - **Transport**: opens a connection per call, sends at most one JSON
//!   frame, settles on the first reply (or right after sending), and
//!   force-closes the socket when the deadline passes
//! - **Client**: tracks the session (TTL, cookies), shares one
//!   authentication between concurrent callers and retries each call at
//!   most once
//! - **Poller**: refreshes the cached device state on a timer without ever
//!   running two cycles at once
//!
//! # Quick Start
//!
//! ```no_run
//! use yolobox_control::{Client, LiveAction, Order, Poller, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder().host("192.168.1.20").build()?;
//!
//!     // One-off calls
//!     let status = client.get_device_status().await?;
//!     println!("Device status: {status}");
//!     client.send(&Order::live(LiveAction::Start)).await?;
//!
//!     // Keep a cached copy of the device state
//!     let poller = Poller::new(client);
//!     poller.connect().await;
//!     println!("Program source: {:?}", poller.state().active_director_id());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`], [`ClientBuilder`], [`ClientConfig`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Call correlation ids |
//! | [`poller`] | [`Poller`], [`DeviceState`], [`ConnectionStatus`] |
//! | [`protocol`] | Paths, orders and reply types |
//! | [`transport`] | Per-call WebSocket transport and asset fetcher |

// ============================================================================
// Modules
// ============================================================================

/// Session and request orchestration.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Identifiers used to correlate log lines.
pub mod identifiers;

/// Polling and cached device state.
pub mod poller;

/// Control protocol message types.
pub mod protocol;

/// Per-call transport.
///
/// Implement [`Transport`] to run the client over something other than
/// WebSockets.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{CallOptions, Client, ClientBuilder, ClientConfig};

// Error types
pub use error::{Error, ErrorKind, Result};

// Identifier types
pub use identifiers::CallId;

// Poller types
pub use poller::{
    ConnectionStatus, DeviceState, NoopObserver, Poller, RefreshOutcome, RefreshPhase,
    StateObserver,
};

// Protocol types
pub use protocol::{
    Director, LiveAction, LiveStatus, Material, Mixer, MixerChange, Order, OrderEnvelope,
};

// Transport types
pub use transport::{CallRequest, Cookie, CookieJar, CookieSink, Endpoint, Transport, WsTransport};
