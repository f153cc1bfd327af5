//! HTTP GET of binary resources served on the asset port.
//!
//! Scene preview images are plain HTTP(S) resources, so they go through a
//! pooled `reqwest` client rather than the per-call WebSocket transport.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode, header};
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::endpoint::Endpoint;

// ============================================================================
// Constants
// ============================================================================

/// `Accept` header for image requests.
const IMAGE_ACCEPT: &str = "image/jpeg,image/png,*/*";

// ============================================================================
// AssetFetcher
// ============================================================================

/// Fetches binary resources from the device's HTTP asset port.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    /// Pooled HTTP client.
    http: HttpClient,
    /// Per-request timeout.
    timeout: Duration,
}

impl AssetFetcher {
    /// Creates a fetcher with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http, timeout })
    }

    /// Fetches `path?query` and returns the whole body.
    ///
    /// Parameters whose value is `None` are left out of the query string.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the host is unset
    /// - [`Error::HttpStatus`] for any status other than 200
    /// - [`Error::RequestTimeout`] if the request exceeds the timeout
    /// - [`Error::Http`] for other HTTP failures
    pub async fn fetch(
        &self,
        endpoint: &Endpoint,
        path: &str,
        params: &[(&str, Option<String>)],
    ) -> Result<Vec<u8>> {
        let query = build_query(params);
        let url = if query.is_empty() {
            endpoint.asset_url(path)?
        } else {
            endpoint.asset_url(&format!("{path}?{query}"))?
        };

        trace!(%url, "Fetching asset");

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, IMAGE_ACCEPT)
            .send()
            .await
            .map_err(|e| self.map_error(path, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(path, status = status.as_u16(), "Asset request rejected");
            return Err(Error::http_status(status.as_u16(), path));
        }

        let body = response.bytes().await.map_err(|e| self.map_error(path, e))?;
        Ok(body.to_vec())
    }

    fn map_error(&self, path: &str, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::request_timeout(path, self.timeout.as_millis() as u64)
        } else {
            Error::Http(error)
        }
    }
}

/// Encodes `key=value` pairs joined by `&`, skipping unset values.
fn build_query(params: &[(&str, Option<String>)]) -> String {
    params
        .iter()
        .filter_map(|(key, value)| {
            value.as_ref().map(|value| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
        })
        .collect::<Vec<_>>()
        .join("&")
}

// ============================================================================
// Tests
// ============================================================================
