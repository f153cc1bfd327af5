//! Error types for the YoloBox control client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use yolobox_control::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     let status = client.get_device_status().await?;
//!     println!("{status:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Kinds
//!
//! Every variant is tagged with an [`ErrorKind`] at the point of failure.
//! The retry policy of [`Client`](crate::Client) only looks at the kind,
//! never at the message text.
//!
//! | Kind | Variants | Retried |
//! |------|----------|---------|
//! | Configuration | [`Error::Config`] | never |
//! | Authentication | [`Error::Authentication`] | once, after re-authenticating |
//! | Transient | [`Error::ConnectionClosed`], [`Error::RequestTimeout`] | once, after a short backoff |
//! | Protocol | [`Error::Protocol`], [`Error::Json`] | never |
//! | Transport | [`Error::Connection`], [`Error::Handshake`], [`Error::HttpStatus`], externals | never |
//! | InvalidArgument | [`Error::InvalidArgument`] | never |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// ErrorKind
// ============================================================================

/// Coarse classification of an [`enum@Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Client is not configured well enough to attempt the call.
    Configuration,
    /// Authentication failed or the device answered 401.
    Authentication,
    /// Connection closed before a reply, or the call timed out.
    Transient,
    /// The device answered with something that is not valid JSON.
    Protocol,
    /// Any other connection or HTTP level failure.
    Transport,
    /// Caller supplied an invalid argument.
    InvalidArgument,
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the host is unset or builder values are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Authentication Errors
    // ========================================================================
    /// Authentication failed.
    ///
    /// Returned when the authenticate call fails for any reason, or when a
    /// handshake is rejected with a 401-class status.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Description of the failure.
        message: String,
        /// Handshake status code, when the device answered one.
        status: Option<u16>,
    },

    // ========================================================================
    // Transient Errors
    // ========================================================================
    /// Connection closed before a reply was received.
    #[error("Connection closed before a response was received: {path}")]
    ConnectionClosed {
        /// Control path of the call.
        path: String,
    },

    /// The call did not settle before its deadline.
    #[error("Request {path} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// Control path of the call.
        path: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Connection could not be established or broke mid-call.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Handshake answered with a non-101 status other than 401.
    #[error("Unexpected server response: {status}")]
    Handshake {
        /// HTTP status of the handshake response.
        status: u16,
    },

    /// Asset request answered with a non-200 status.
    #[error("Unexpected status {status} fetching {resource}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// What was being fetched.
        resource: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Reply could not be interpreted.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Caller supplied an invalid argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an authentication error without a status code.
    #[inline]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            status: None,
        }
    }

    /// Creates an authentication error for a rejected handshake.
    #[inline]
    pub fn unauthorized(status: u16) -> Self {
        Self::Authentication {
            message: format!("Unexpected server response: {status}"),
            status: Some(status),
        }
    }

    /// Creates a connection closed error.
    #[inline]
    pub fn connection_closed(path: impl Into<String>) -> Self {
        Self::ConnectionClosed { path: path.into() }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(path: impl Into<String>, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            path: path.into(),
            timeout_ms,
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a handshake status error, tagging 401-class statuses as
    /// authentication failures.
    #[inline]
    pub fn handshake(status: u16) -> Self {
        if status == 401 {
            Self::unauthorized(status)
        } else {
            Self::Handshake { status }
        }
    }

    /// Creates an HTTP status error.
    #[inline]
    pub fn http_status(status: u16, resource: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            resource: resource.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the kind this error was tagged with.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Configuration,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::ConnectionClosed { .. } | Self::RequestTimeout { .. } => ErrorKind::Transient,
            Self::Protocol { .. } | Self::Json(_) => ErrorKind::Protocol,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Connection { .. }
            | Self::Handshake { .. }
            | Self::HttpStatus { .. }
            | Self::Io(_)
            | Self::WebSocket(_)
            | Self::Http(_) => ErrorKind::Transport,
        }
    }

    /// Returns `true` if this is an authentication failure.
    #[inline]
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Returns `true` if a single retry may succeed.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if this is a configuration error.
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

// ============================================================================
// Tests
// ============================================================================
