//! Device endpoint: host plus control and asset ports.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};
use crate::protocol::paths;

// ============================================================================
// Constants
// ============================================================================

/// Default WebSocket control port.
pub const DEFAULT_CONTROL_PORT: u16 = 8887;

/// Default HTTP asset port.
pub const DEFAULT_ASSET_PORT: u16 = 8080;

/// Asset ports served over TLS.
const TLS_ASSET_PORTS: [u16; 2] = [443, 8443];

// ============================================================================
// Endpoint
// ============================================================================

/// Where the device listens.
///
/// Calls take a snapshot of the endpoint when they start, so replacing it
/// never affects a call already in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname or IP address. Empty means "not configured yet".
    pub host: String,
    /// WebSocket control port.
    pub control_port: u16,
    /// HTTP asset port.
    pub asset_port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: String::new(),
            control_port: DEFAULT_CONTROL_PORT,
            asset_port: DEFAULT_ASSET_PORT,
        }
    }
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, control_port: u16, asset_port: u16) -> Self {
        Self {
            host: host.into().trim().to_string(),
            control_port,
            asset_port,
        }
    }

    /// Returns `true` if a host is set.
    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }

    /// Returns `https` for TLS asset ports, `http` otherwise.
    #[inline]
    #[must_use]
    pub fn asset_scheme(&self) -> &'static str {
        if TLS_ASSET_PORTS.contains(&self.asset_port) {
            "https"
        } else {
            "http"
        }
    }

    /// Builds `ws://{host}:{control_port}{path}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is unset or not a valid host.
    pub fn ws_url(&self, path: &str) -> Result<Url> {
        self.build_url("ws", self.control_port, path)
    }

    /// Builds `http(s)://{host}:{asset_port}{path_and_query}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is unset or not a valid host.
    pub fn asset_url(&self, path_and_query: &str) -> Result<Url> {
        self.build_url(self.asset_scheme(), self.asset_port, path_and_query)
    }

    fn build_url(&self, scheme: &str, port: u16, path: &str) -> Result<Url> {
        if !self.is_configured() {
            return Err(Error::config("Host is not configured"));
        }

        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        let raw = format!("{scheme}://{host}:{port}{}", paths::normalize(path));
        Url::parse(&raw).map_err(|e| Error::config(format!("Invalid device address {raw}: {e}")))
    }
}

// ============================================================================
// Tests
// ============================================================================
