//! Cached device state and the refresh phase machine.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use serde_json::Value;

use crate::protocol::{Director, LiveStatus, Material, Mixer};

// ============================================================================
// DeviceState
// ============================================================================

/// Last known state of the device.
///
/// Each resource is replaced wholesale by a successful read and left
/// untouched by a failed one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    /// `data` of the last device status reply.
    pub device_status: Option<Value>,
    /// `data.result` of the last live status reply.
    pub live_status: Option<LiveStatus>,
    /// Program sources.
    pub directors: Vec<Director>,
    /// Overlays.
    pub overlays: Vec<Material>,
    /// Audio channels.
    pub mixers: Vec<Mixer>,
}

impl DeviceState {
    /// Id of the source currently on program.
    #[must_use]
    pub fn active_director_id(&self) -> Option<&str> {
        self.directors
            .iter()
            .find(|d| d.is_selected)
            .map(|d| d.id.as_str())
    }

    /// Whether the overlay is shown, or `None` if it is unknown.
    #[must_use]
    pub fn overlay_selected(&self, id: &str) -> Option<bool> {
        self.overlays
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.is_selected)
    }

    /// Looks up a mixer channel by id, falling back to its name.
    #[must_use]
    pub fn mixer(&self, key: &str) -> Option<&Mixer> {
        self.mixers.iter().find(|m| m.key() == key)
    }

    /// Whether the device is streaming. Unknown counts as not live.
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live_status.as_ref().is_some_and(|s| s.living)
    }
}

// ============================================================================
// RefreshPhase
// ============================================================================

/// Phase of the refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    /// No cycle running.
    #[default]
    Idle,
    /// A cycle is running; further refreshes are no-ops.
    Refreshing,
}

/// Holds the phase at [`RefreshPhase::Refreshing`] and resets it to
/// [`RefreshPhase::Idle`] when dropped.
pub(crate) struct PhaseGuard<'a> {
    phase: &'a Mutex<RefreshPhase>,
}

impl<'a> PhaseGuard<'a> {
    /// Moves `Idle` to `Refreshing`. Returns `None` if already refreshing.
    pub fn try_enter(phase: &'a Mutex<RefreshPhase>) -> Option<Self> {
        let mut current = phase.lock();
        match *current {
            RefreshPhase::Refreshing => None,
            RefreshPhase::Idle => {
                *current = RefreshPhase::Refreshing;
                Some(Self { phase })
            }
        }
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.phase.lock() = RefreshPhase::Idle;
    }
}

// ============================================================================
// Tests
// ============================================================================
