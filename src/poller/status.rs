//! Coarse connection status reported to the host application.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::{Error, ErrorKind};

// ============================================================================
// ConnectionStatus
// ============================================================================

/// What the host application shows for the device.
///
/// Each failure state carries a message for diagnostics; the variant is
/// the primary status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Waiting for the first refresh.
    #[default]
    Connecting,
    /// At least one read returned data.
    Ok,
    /// Host missing or invalid.
    BadConfig(String),
    /// The device did not answer any read.
    ConnectionFailure(String),
    /// Authentication failed after retries.
    AuthenticationFailure(String),
    /// Any other cycle-level failure.
    UnknownError(String),
}

impl ConnectionStatus {
    /// Maps a cycle-level failure to a status.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        match error.kind() {
            ErrorKind::Configuration => Self::BadConfig(error.to_string()),
            ErrorKind::Authentication => Self::AuthenticationFailure("Authentication failed".into()),
            _ => Self::UnknownError(error.to_string()),
        }
    }

    /// Returns `true` for [`ConnectionStatus::Ok`].
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns the diagnostic message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Connecting | Self::Ok => None,
            Self::BadConfig(message)
            | Self::ConnectionFailure(message)
            | Self::AuthenticationFailure(message)
            | Self::UnknownError(message) => Some(message),
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connecting => "connecting",
            Self::Ok => "ok",
            Self::BadConfig(_) => "bad_config",
            Self::ConnectionFailure(_) => "connection_failure",
            Self::AuthenticationFailure(_) => "authentication_failure",
            Self::UnknownError(_) => "unknown_error",
        };
        match self.message() {
            Some(message) => write!(f, "{label}: {message}"),
            None => f.write_str(label),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_kinds() {
        assert!(matches!(
            ConnectionStatus::from_error(&Error::config("Host is not configured")),
            ConnectionStatus::BadConfig(_)
        ));
        assert_eq!(
            ConnectionStatus::from_error(&Error::handshake(401)),
            ConnectionStatus::AuthenticationFailure("Authentication failed".into())
        );
        assert!(matches!(
            ConnectionStatus::from_error(&Error::connection("refused")),
            ConnectionStatus::UnknownError(_)
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionStatus::Ok.to_string(), "ok");
        assert_eq!(
            ConnectionStatus::ConnectionFailure("No response from device".into()).to_string(),
            "connection_failure: No response from device"
        );
    }
}
