//! Polling and state synchronization.
//!
//! | Type | Role |
//! |------|------|
//! | [`Poller`] | Refresh cycles, polling timer, orders with follow-up refresh |
//! | [`DeviceState`] | Cached device resources |
//! | [`RefreshPhase`] | `Idle` / `Refreshing` guard against overlapping cycles |
//! | [`ConnectionStatus`] | Coarse status for the host application |
//! | [`StateObserver`] | Change notifications |

// ============================================================================
// Submodules
// ============================================================================

/// Poller and refresh cycle.
pub mod core;

/// Observer trait.
pub mod observer;

/// Cached state and refresh phase.
pub mod state;

/// Coarse connection status.
pub mod status;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::{Poller, RefreshOutcome};
pub use observer::{NoopObserver, StateObserver};
pub use state::{DeviceState, RefreshPhase};
pub use status::ConnectionStatus;
