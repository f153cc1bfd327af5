//! Periodic state synchronization.
//!
//! A [`Poller`] owns the cached [`DeviceState`] of one [`Client`] and keeps
//! it current with refresh cycles. Each cycle authenticates, then performs
//! the five reads one after another:
//!
//! | Read | Cached from |
//! |------|-------------|
//! | device status | `data` |
//! | live status | `data.result` |
//! | directors | `data.result` |
//! | overlays | `data.result` |
//! | mixers | `data.result` |
//!
//! A failed read leaves its cache untouched and does not stop the others.
//! Only a failure outside the reads (authentication, configuration) fails
//! the cycle.
//!
//! At most one cycle runs at a time. A refresh requested while another is
//! running returns [`RefreshOutcome::Skipped`] without touching the network.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, trace};

use crate::client::Client;
use crate::client::config::MIN_POLL_INTERVAL_MS;
use crate::error::{Error, ErrorKind, Result};
use crate::protocol::{Director, LiveAction, LiveStatus, Material, Mixer, MixerChange, Order, reply};

use super::observer::{NoopObserver, StateObserver};
use super::state::{DeviceState, PhaseGuard, RefreshPhase};
use super::status::ConnectionStatus;

// ============================================================================
// Constants
// ============================================================================

/// Status message when the first cycle got no data at all.
const NO_RESPONSE: &str = "No response from device";

/// Status message when no host is configured.
const HOST_REQUIRED: &str = "IP address required";

// ============================================================================
// Types
// ============================================================================

/// Result of one [`Poller::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another cycle was running; nothing was done.
    Skipped,
    /// The reads ran. `connected` is `true` if any of them returned data.
    Completed {
        /// Whether any read returned data.
        connected: bool,
    },
    /// The cycle failed before its reads.
    Failed(ErrorKind),
}

/// Replies of one cycle's reads; `None` where the read failed.
struct Replies {
    device: Option<Value>,
    live: Option<Value>,
    directors: Option<Value>,
    overlays: Option<Value>,
    mixers: Option<Value>,
}

impl Replies {
    fn any(&self) -> bool {
        [
            &self.device,
            &self.live,
            &self.directors,
            &self.overlays,
            &self.mixers,
        ]
        .iter()
        .any(|reply| reply.is_some())
    }
}

/// Internal shared state for the poller.
struct PollerInner {
    client: Client,
    observer: Arc<dyn StateObserver>,
    phase: Mutex<RefreshPhase>,
    state: RwLock<DeviceState>,
    status: RwLock<ConnectionStatus>,
    interval: Mutex<Duration>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for PollerInner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Keeps a [`DeviceState`] in sync with the device.
///
/// Cheap to clone; clones share state. The polling timer stops once the
/// last clone is dropped.
///
/// # Example
///
/// ```no_run
/// use yolobox_control::{Client, Poller};
///
/// # async fn example() -> yolobox_control::Result<()> {
/// let client = Client::builder().host("192.168.1.20").build()?;
/// let poller = Poller::new(client);
///
/// poller.connect().await;
/// println!("{}", poller.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Poller {
    inner: Arc<PollerInner>,
}

// ============================================================================
// Poller - Constructors
// ============================================================================

impl Poller {
    /// Creates a poller without an observer.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_observer(client, Arc::new(NoopObserver))
    }

    /// Creates a poller reporting changes to `observer`.
    #[must_use]
    pub fn with_observer(client: Client, observer: Arc<dyn StateObserver>) -> Self {
        let interval = client.config().poll_interval();
        Self {
            inner: Arc::new(PollerInner {
                client,
                observer,
                phase: Mutex::new(RefreshPhase::Idle),
                state: RwLock::new(DeviceState::default()),
                status: RwLock::new(ConnectionStatus::Connecting),
                interval: Mutex::new(interval),
                timer: Mutex::new(None),
            }),
        }
    }
}

// ============================================================================
// Poller - Accessors
// ============================================================================

impl Poller {
    /// Returns the underlying client.
    #[inline]
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// Returns a snapshot of the cached state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.inner.state.read().clone()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.read().clone()
    }

    /// Returns the refresh phase.
    #[must_use]
    pub fn phase(&self) -> RefreshPhase {
        *self.inner.phase.lock()
    }

    /// Returns `true` while the polling timer runs.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.inner
            .timer
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

// ============================================================================
// Poller - Lifecycle
// ============================================================================

impl Poller {
    /// Runs the initial refresh, then starts polling.
    ///
    /// Without a host the status becomes [`ConnectionStatus::BadConfig`]
    /// and polling is not started.
    pub async fn connect(&self) -> RefreshOutcome {
        if !self.inner.client.endpoint().is_configured() {
            self.set_status(ConnectionStatus::BadConfig(HOST_REQUIRED.into()));
            return RefreshOutcome::Failed(ErrorKind::Configuration);
        }

        self.set_status(ConnectionStatus::Connecting);
        let outcome = self.refresh(true).await;

        let interval = *self.inner.interval.lock();
        self.start(interval);
        outcome
    }

    /// Points the client at a new device and reconnects.
    ///
    /// The session is dropped so the new device is authenticated afresh.
    pub async fn reconfigure(&self, host: impl Into<String>, port: u16) -> RefreshOutcome {
        self.stop();
        self.inner.client.set_endpoint(host, port);
        self.inner.client.invalidate_session();
        self.connect().await
    }

    /// Starts (or restarts) the polling timer.
    ///
    /// The first tick fires one `interval` from now. Every tick spawns a
    /// refresh, so a tick during a slow cycle is skipped by the refresh
    /// guard rather than queued. Intervals below one second are raised to
    /// one second.
    pub fn start(&self, interval: Duration) {
        let interval = interval.max(Duration::from_millis(MIN_POLL_INTERVAL_MS));
        *self.inner.interval.lock() = interval;

        let weak = Arc::downgrade(&self.inner);
        let timer = tokio::spawn(tick_loop(weak, interval));

        if let Some(previous) = self.inner.timer.lock().replace(timer) {
            previous.abort();
        }
        debug!(interval_ms = interval.as_millis() as u64, "Polling started");
    }

    /// Stops the polling timer. A cycle already running completes.
    pub fn stop(&self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
            debug!("Polling stopped");
        }
    }
}

async fn tick_loop(weak: Weak<PollerInner>, interval: Duration) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        let poller = Poller { inner };
        tokio::spawn(async move {
            poller.refresh(false).await;
        });
    }
}

// ============================================================================
// Poller - Orders
// ============================================================================

impl Poller {
    /// Sends an order, then schedules a refresh so the cache follows.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::send`].
    pub async fn send_order(&self, order: &Order) -> Result<()> {
        self.inner.client.send(order).await?;

        let poller = self.clone();
        tokio::spawn(async move {
            poller.refresh(false).await;
        });
        Ok(())
    }

    /// Starts streaming if the cache says the device is not live, else
    /// stops it.
    ///
    /// # Errors
    ///
    /// Any error of [`Client::send`].
    pub async fn toggle_live(&self) -> Result<()> {
        let action = LiveAction::toggle_from(self.inner.state.read().is_live());
        self.send_order(&Order::live(action)).await
    }

    /// Flips an overlay according to the cache.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the overlay is not in the cache
    /// - any error of [`Client::send`]
    pub async fn toggle_overlay(&self, id: &str) -> Result<()> {
        let current = self
            .inner
            .state
            .read()
            .overlay_selected(id)
            .ok_or_else(|| Error::invalid_argument("Unable to determine current overlay state"))?;

        self.send_order(&Order::MaterialChange {
            id: id.to_string(),
            is_selected: !current,
        })
        .await
    }

    /// Turns an audio channel on or off according to the cache.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the channel is unknown or its on/off
    ///   state was not reported as a boolean
    /// - any error of [`Client::send`]
    pub async fn toggle_mixer_channel(&self, key: &str) -> Result<()> {
        let change = self
            .mixer_change(key, |mixer| mixer.is_selected)
            .map(|(change, current)| change.with_selected(!current))
            .ok_or_else(|| Error::invalid_argument("Unable to determine current channel state"))?;

        self.send_order(&change.into()).await
    }

    /// Flips audio-follows-video on a channel according to the cache.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the channel is unknown or its AFV
    ///   state was not reported as a boolean
    /// - any error of [`Client::send`]
    pub async fn toggle_afv(&self, key: &str) -> Result<()> {
        let change = self
            .mixer_change(key, |mixer| mixer.afv)
            .map(|(change, current)| change.with_afv(!current))
            .ok_or_else(|| Error::invalid_argument("Unable to determine current AFV state"))?;

        self.send_order(&change.into()).await
    }

    /// Looks up a cached channel and reads one of its flags.
    fn mixer_change(
        &self,
        key: &str,
        flag: impl Fn(&Mixer) -> Option<bool>,
    ) -> Option<(MixerChange, bool)> {
        let state = self.inner.state.read();
        let mixer = state.mixer(key)?;
        let current = flag(mixer)?;
        Some((MixerChange::new(mixer.key()), current))
    }
}

// ============================================================================
// Poller - Refresh
// ============================================================================

impl Poller {
    /// Runs one refresh cycle unless one is already running.
    ///
    /// `initial` marks the first cycle after (re)configuration: if none of
    /// its reads return data the status becomes
    /// [`ConnectionStatus::ConnectionFailure`]. Later cycles without data
    /// leave the status as it was.
    pub async fn refresh(&self, initial: bool) -> RefreshOutcome {
        let Some(_guard) = PhaseGuard::try_enter(&self.inner.phase) else {
            trace!("Refresh already running, skipped");
            return RefreshOutcome::Skipped;
        };

        match self.run_cycle(initial).await {
            Ok(connected) => RefreshOutcome::Completed { connected },
            Err(e) => {
                if e.is_auth_failure() {
                    error!(error = %e, "Failed to authenticate with device");
                } else {
                    error!(error = %e, "Failed to refresh data");
                }
                self.set_status(ConnectionStatus::from_error(&e));
                RefreshOutcome::Failed(e.kind())
            }
        }
    }

    async fn run_cycle(&self, initial: bool) -> Result<bool> {
        let client = &self.inner.client;
        client.ensure_authenticated(false).await?;

        let replies = Replies {
            device: read("device status", client.get_device_status()).await,
            live: read("live status", client.get_live_status()).await,
            directors: read("director list", client.get_director_list()).await,
            overlays: read("overlay list", client.get_material_list()).await,
            mixers: read("mixer list", client.get_mixer_list()).await,
        };

        let connected = replies.any();
        if connected {
            self.set_status(ConnectionStatus::Ok);
        } else if initial {
            self.set_status(ConnectionStatus::ConnectionFailure(NO_RESPONSE.into()));
        }

        self.apply(replies);
        Ok(connected)
    }

    /// Replaces every cache whose read returned its field, then notifies.
    fn apply(&self, replies: Replies) {
        let device = replies.device.as_ref().and_then(reply::data).cloned();
        let live = replies
            .live
            .as_ref()
            .and_then(reply::result)
            .and_then(|v| decode::<LiveStatus>("live status", v));
        let directors = replies
            .directors
            .as_ref()
            .and_then(reply::result)
            .and_then(|v| decode::<Vec<Director>>("director list", v));
        let overlays = replies
            .overlays
            .as_ref()
            .and_then(reply::result)
            .and_then(|v| decode::<Vec<Material>>("overlay list", v));
        let mixers = replies
            .mixers
            .as_ref()
            .and_then(reply::result)
            .and_then(|v| decode::<Vec<Mixer>>("mixer list", v));

        let lists_changed = directors.is_some() || overlays.is_some() || mixers.is_some();

        let snapshot = {
            let mut state = self.inner.state.write();
            if let Some(device) = &device {
                state.device_status = Some(device.clone());
            }
            if let Some(live) = &live {
                state.live_status = Some(live.clone());
            }
            if let Some(directors) = directors {
                state.directors = directors;
            }
            if let Some(overlays) = overlays {
                state.overlays = overlays;
            }
            if let Some(mixers) = mixers {
                state.mixers = mixers;
            }
            state.clone()
        };

        let observer = &self.inner.observer;
        if let Some(device) = &device {
            observer.device_status_changed(device);
        }
        if let Some(live) = &live {
            observer.live_status_changed(live);
        }
        if lists_changed {
            observer.lists_changed(&snapshot);
        }
        observer.refreshed(&snapshot);
    }

    fn set_status(&self, status: ConnectionStatus) {
        {
            let mut current = self.inner.status.write();
            if *current == status {
                return;
            }
            *current = status.clone();
        }
        info!(%status, "Connection status changed");
        self.inner.observer.status_changed(&status);
    }
}

/// Awaits one read, turning a failure into "no update".
async fn read(resource: &'static str, call: impl Future<Output = Result<Value>>) -> Option<Value> {
    match call.await {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            debug!(resource, error = %e, "Unable to read");
            None
        }
    }
}

fn decode<T: DeserializeOwned>(resource: &'static str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            debug!(resource, error = %e, "Ignoring malformed reply");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
