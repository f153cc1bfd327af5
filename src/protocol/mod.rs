//! Control protocol message types.
//!
//! This module defines what travels over the per-call WebSocket
//! connections to the device.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`OrderEnvelope`] | Client → Device | Command that changes device state |
//! | Reply (`{"data": ...}`) | Device → Client | Answer to a query path |
//!
//! Every call targets one path under `/remote/controller/`. Queries expect a
//! single JSON text frame back; orders and authentication expect nothing.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `order` | Typed orders and the `{orderID, data}` envelope |
//! | `paths` | Known control and asset paths |
//! | `reply` | Reply accessors and list entry types |

// ============================================================================
// Submodules
// ============================================================================

/// Typed orders and the order envelope.
pub mod order;

/// Known control and asset paths.
pub mod paths;

/// Reply accessors and list entry types.
pub mod reply;

// ============================================================================
// Re-exports
// ============================================================================

pub use order::{LiveAction, MixerChange, Order, OrderEnvelope};
pub use reply::{Director, LiveStatus, Material, Mixer};
