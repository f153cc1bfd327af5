//! Change notifications from the poller.

use serde_json::Value;

use crate::protocol::LiveStatus;

use super::state::DeviceState;
use super::status::ConnectionStatus;

/// Receives state changes from a [`Poller`](super::Poller).
///
/// Every method defaults to a no-op. Calls happen on the refreshing task
/// with no poller lock held, so implementations may read the poller back.
pub trait StateObserver: Send + Sync {
    /// The coarse status changed.
    fn status_changed(&self, _status: &ConnectionStatus) {}

    /// A device status reply replaced the cached one.
    fn device_status_changed(&self, _status: &Value) {}

    /// A live status reply replaced the cached one.
    fn live_status_changed(&self, _status: &LiveStatus) {}

    /// At least one of the director, overlay or mixer lists was replaced.
    fn lists_changed(&self, _state: &DeviceState) {}

    /// A refresh cycle finished its reads.
    fn refreshed(&self, _state: &DeviceState) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StateObserver for NoopObserver {}
