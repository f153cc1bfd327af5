//! Session-aware request orchestrator.
//!
//! [`Client`] wraps a [`Transport`] with authentication tracking, cookie
//! propagation, single-flight authentication and a bounded retry policy.
//!
//! # Retry Policy
//!
//! | Failure kind | Action when retries remain |
//! |--------------|----------------------------|
//! | Authentication | force re-authentication, retry |
//! | Transient | refresh the session (unless `skip_auth`), wait 150ms, retry |
//! | anything else | propagate unchanged |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::identifiers::CallId;
use crate::protocol::{Order, OrderEnvelope, paths};
use crate::transport::{AssetFetcher, CallRequest, CookieSink, Endpoint, Transport};

use super::builder::ClientBuilder;
use super::config::ClientConfig;
use super::options::CallOptions;
use super::session::{Admission, AuthFailure, AuthFlight, Session};

// ============================================================================
// Constants
// ============================================================================

/// Pause before retrying after a transient failure.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(150);

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the client.
pub(crate) struct ClientInner {
    /// Configuration the client was built with.
    config: ClientConfig,
    /// Current endpoint; calls snapshot it when they start.
    endpoint: RwLock<Endpoint>,
    /// Authentication session.
    session: Arc<Session>,
    /// Per-call transport.
    transport: Arc<dyn Transport>,
    /// HTTP asset path.
    assets: AssetFetcher,
}

// ============================================================================
// Client
// ============================================================================

/// Control client for one device.
///
/// Cheap to clone; clones share the session.
///
/// # Example
///
/// ```no_run
/// use yolobox_control::{Client, LiveAction, Order};
///
/// # async fn example() -> yolobox_control::Result<()> {
/// let client = Client::builder().host("192.168.1.20").build()?;
///
/// let status = client.get_device_status().await?;
/// println!("{status}");
///
/// client.send(&Order::live(LiveAction::Start)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    /// Shared inner state.
    pub(crate) inner: Arc<ClientInner>,
}

// ============================================================================
// Client - Display
// ============================================================================

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &*self.inner.endpoint.read())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Constructors
// ============================================================================

impl Client {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client over the WebSocket transport.
    ///
    /// # Errors
    ///
    /// See [`ClientBuilder::build`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        ClientBuilder::new().config(config).build()
    }

    /// Creates a client over a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the asset HTTP client cannot be built.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let assets = AssetFetcher::new(config.timeout())?;
        let session = Arc::new(Session::new(config.auth_ttl()));
        let endpoint = RwLock::new(config.endpoint());

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                endpoint,
                session,
                transport,
                assets,
            }),
        })
    }
}

// ============================================================================
// Client - Endpoint & Session
// ============================================================================

impl Client {
    /// Returns the configuration the client was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns a snapshot of the current endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.inner.endpoint.read().clone()
    }

    /// Points the client at another host and control port.
    ///
    /// Calls already in flight keep their original endpoint.
    pub fn set_endpoint(&self, host: impl Into<String>, port: u16) {
        let mut endpoint = self.inner.endpoint.write();
        let asset_port = endpoint.asset_port;
        *endpoint = Endpoint::new(host, port, asset_port);
        info!(host = %endpoint.host, port, "Endpoint updated");
    }

    /// Returns `true` if the session is authenticated within its TTL.
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.is_valid()
    }

    /// Drops the session: flag, timestamp and cookies.
    #[inline]
    pub fn invalidate_session(&self) {
        self.inner.session.invalidate();
    }

    /// Returns the `Cookie` header the next call will send.
    #[inline]
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        self.inner.session.cookie_header()
    }
}

// ============================================================================
// Client - Authentication
// ============================================================================

impl Client {
    /// Makes sure the session is authenticated.
    ///
    /// Returns immediately while a previous authentication is within its
    /// TTL, unless `force` is set. Concurrent callers share a single
    /// authentication call and all observe its outcome.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if the authentication call failed
    /// - [`Error::Config`] if the host is unset
    pub async fn ensure_authenticated(&self, force: bool) -> Result<()> {
        match self
            .inner
            .session
            .begin(force, || self.start_authentication())
        {
            Admission::Valid => Ok(()),
            Admission::Await(flight) => flight.await.map_err(Error::from),
        }
    }

    /// Builds the shared authentication attempt. Not polled here.
    fn start_authentication(&self) -> AuthFlight {
        let inner = Arc::clone(&self.inner);

        async move {
            debug!("Authenticating");
            let options = CallOptions::no_reply().quiet();
            let outcome = inner.raw_call(paths::AUTHENTICATE, &options).await;
            inner.session.finish(outcome.is_ok());

            outcome.map(|_| ()).map_err(|e| {
                warn!(error = %e, "Authentication failed");
                AuthFailure::from(&e)
            })
        }
        .boxed()
        .shared()
    }
}

// ============================================================================
// Client - Calls
// ============================================================================

impl Client {
    /// Performs one logical call with authentication and retries.
    ///
    /// # Errors
    ///
    /// Returns the last failure once retries are exhausted, or the first
    /// failure that is neither an authentication nor a transient failure.
    pub async fn call(&self, path: &str, options: CallOptions) -> Result<Value> {
        let path = paths::normalize(path);
        let max_retries = options.max_retries.unwrap_or(self.inner.config.max_retries);

        if !options.skip_auth {
            self.ensure_authenticated(false).await?;
        }

        let mut attempt = 0;
        loop {
            let error = match self.inner.raw_call(&path, &options).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if attempt >= max_retries {
                return Err(error);
            }

            match error.kind() {
                ErrorKind::Authentication => {
                    debug!(path, attempt, "Re-authenticating before retry");
                    self.ensure_authenticated(true).await?;
                }
                ErrorKind::Transient => {
                    debug!(path, attempt, error = %error, "Retrying after transient failure");
                    if !options.skip_auth {
                        self.ensure_authenticated(true).await?;
                    }
                    sleep(RETRY_BACKOFF).await;
                }
                _ => return Err(error),
            }

            attempt += 1;
        }
    }

    /// Posts an order envelope `{orderID, data}` without waiting for a reply.
    ///
    /// `data` defaults to `{}`.
    ///
    /// Delivery is at-least-once at best: if the connection drops after the
    /// frame left but before the send was observed complete, the retry
    /// policy sends the order again. Toggle-style orders may then apply
    /// twice.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `order_id` is empty
    /// - any error of [`Client::call`]
    pub async fn send_order(&self, order_id: &str, data: Option<Value>) -> Result<()> {
        let envelope = OrderEnvelope::new(order_id, data)?;
        self.post_envelope(&envelope).await
    }

    /// Sends a typed order. See [`Client::send_order`].
    ///
    /// # Errors
    ///
    /// Same as [`Client::send_order`].
    pub async fn send(&self, order: &Order) -> Result<()> {
        self.post_envelope(&order.to_envelope()?).await
    }

    async fn post_envelope(&self, envelope: &OrderEnvelope) -> Result<()> {
        let payload = serde_json::to_value(envelope)?;
        debug!(order = %envelope.order_id, "Sending order");
        self.call(paths::POST_ORDER, CallOptions::no_reply().with_payload(payload))
            .await
            .map(|_| ())
    }

    async fn query(&self, path: &str) -> Result<Value> {
        self.call(path, CallOptions::query().quiet()).await
    }

    /// Reads device hardware and network status.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::call`].
    pub async fn get_device_status(&self) -> Result<Value> {
        self.query(paths::GET_DEVICE_STATUS).await
    }

    /// Reads the streaming state.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::call`].
    pub async fn get_live_status(&self) -> Result<Value> {
        self.query(paths::GET_LIVE_STATUS).await
    }

    /// Reads the program sources.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::call`].
    pub async fn get_director_list(&self) -> Result<Value> {
        self.query(paths::GET_DIRECTOR_LIST).await
    }

    /// Reads the overlays.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::call`].
    pub async fn get_material_list(&self) -> Result<Value> {
        self.query(paths::GET_MATERIAL_LIST).await
    }

    /// Reads the audio channels.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::call`].
    pub async fn get_mixer_list(&self) -> Result<Value> {
        self.query(paths::GET_MIXER_LIST).await
    }

    /// Probes the device.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::call`].
    pub async fn heartbeat(&self) -> Result<Value> {
        self.query(paths::HEARTBEAT).await
    }

    /// Fetches a scene preview image from the asset port.
    ///
    /// # Errors
    ///
    /// See [`AssetFetcher::fetch`].
    pub async fn fetch_scene_image(&self, params: &[(&str, Option<String>)]) -> Result<Vec<u8>> {
        let endpoint = self.endpoint();
        self.inner
            .assets
            .fetch(&endpoint, paths::SCENE_IMAGES, params)
            .await
    }
}

// ============================================================================
// ClientInner - Transport
// ============================================================================

impl ClientInner {
    /// Performs one attempt: no authentication, no retry.
    ///
    /// An authentication failure invalidates the session before returning.
    async fn raw_call(&self, path: &str, options: &CallOptions) -> Result<Value> {
        let request = CallRequest {
            id: CallId::generate(),
            endpoint: self.endpoint.read().clone(),
            path: paths::normalize(path),
            payload: options.payload.clone(),
            expect_reply: options.expect_reply,
            timeout: options.timeout.unwrap_or_else(|| self.config.timeout()),
            cookie_header: self.session.cookie_header(),
        };
        let call_id = request.id;
        let cookies: Arc<dyn CookieSink> = self.session.clone();

        let result = self.transport.perform_call(request, cookies).await;

        if let Err(e) = &result {
            if e.is_auth_failure() {
                self.session.invalidate();
            }
            if options.quiet {
                debug!(%call_id, path, error = %e, "Request failed");
            } else {
                warn!(%call_id, path, error = %e, "Request failed");
            }
        }

        result
    }
}

// ============================================================================
// Tests
// ============================================================================
