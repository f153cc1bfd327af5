//! Client configuration.
//!
//! [`ClientConfig`] mirrors the settings the host application stores for a
//! device. It deserializes from camelCase JSON with every field defaulted:
//!
//! ```ignore
//! use yolobox_control::ClientConfig;
//!
//! let config = ClientConfig::from_json(r#"{"host": "192.168.1.20", "pollIntervalMs": 2000}"#)?;
//! assert_eq!(config.port, 8887);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::transport::endpoint::{DEFAULT_ASSET_PORT, DEFAULT_CONTROL_PORT, Endpoint};
use crate::transport::websocket::DEFAULT_ORIGIN;

// ============================================================================
// Constants
// ============================================================================

/// Default per-call timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 4_000;

/// Default authentication lifetime in milliseconds.
pub const DEFAULT_AUTH_TTL_MS: u64 = 60_000;

/// Default number of retries per call.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Default polling interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Shortest accepted polling interval in milliseconds.
pub const MIN_POLL_INTERVAL_MS: u64 = 1_000;

// ============================================================================
// ClientConfig
// ============================================================================

/// Settings for one device connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Device hostname or IP. May stay empty until configured.
    pub host: String,

    /// WebSocket control port.
    pub port: u16,

    /// HTTP asset port. 443 and 8443 select HTTPS.
    pub http_port: u16,

    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,

    /// How long a successful authentication stays valid, in milliseconds.
    pub auth_ttl_ms: u64,

    /// Retries per call after an authentication or transient failure.
    pub max_retries: u32,

    /// Interval between refresh cycles, in milliseconds.
    pub poll_interval_ms: u64,

    /// `Origin` header sent with every handshake.
    pub origin: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_CONTROL_PORT,
            http_port: DEFAULT_ASSET_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            auth_ttl_ms: DEFAULT_AUTH_TTL_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl ClientConfig {
    /// Parses a JSON configuration object.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the JSON is malformed
    /// - [`Error::Config`] if a value is out of range
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges. An empty host is accepted here and rejected
    /// when a call is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("WebSocket port must be between 1 and 65535"));
        }
        if self.http_port == 0 {
            return Err(Error::config("HTTP port must be between 1 and 65535"));
        }
        if self.timeout_ms == 0 {
            return Err(Error::config("Timeout must be greater than zero"));
        }
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(Error::config(format!(
                "Polling interval must be at least {MIN_POLL_INTERVAL_MS}ms"
            )));
        }
        Ok(())
    }

    /// Returns the endpoint described by this configuration.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.as_str(), self.port, self.http_port)
    }

    /// Per-call timeout.
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Authentication lifetime.
    #[inline]
    #[must_use]
    pub const fn auth_ttl(&self) -> Duration {
        Duration::from_millis(self.auth_ttl_ms)
    }

    /// Interval between refresh cycles.
    #[inline]
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.port, 8887);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.timeout(), Duration::from_secs(4));
        assert_eq!(config.auth_ttl(), Duration::from_secs(60));
        assert_eq!(config.max_retries, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            ClientConfig::from_json(r#"{"host": "10.0.0.5", "httpPort": 8443, "pollIntervalMs": 2000}"#)
                .expect("config");
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 8887);
        assert_eq!(config.endpoint().asset_scheme(), "https");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let err = ClientConfig::from_json(r#"{"port": 0}"#).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_validate_rejects_short_poll_interval() {
        let config = ClientConfig {
            poll_interval_ms: 200,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = ClientConfig::from_json("{").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
