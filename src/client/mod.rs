//! Session and request orchestration.
//!
//! | Type | Role |
//! |------|------|
//! | [`Client`] | Authenticated calls with retry, typed getters, orders |
//! | [`ClientBuilder`] | Fluent configuration |
//! | [`ClientConfig`] | Serializable device settings |
//! | [`CallOptions`] | Per-call overrides |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for [`Client`].
pub mod builder;

/// Serializable client configuration.
pub mod config;

/// The client itself.
pub mod core;

/// Per-call options.
pub mod options;

/// Authentication session state.
pub(crate) mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use config::ClientConfig;
pub use core::{Client, RETRY_BACKOFF};
pub use options::CallOptions;
