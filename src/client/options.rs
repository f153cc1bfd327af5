//! Per-call options.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;

// ============================================================================
// CallOptions
// ============================================================================

/// How one logical call is performed.
///
/// The default is an authenticated, reply-expecting query with the
/// client's timeout and retry budget.
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// JSON body sent right after connecting.
    pub payload: Option<Value>,

    /// Whether to wait for a reply frame.
    pub expect_reply: bool,

    /// Skip the authentication check (and the session refresh on retry).
    pub skip_auth: bool,

    /// Overrides the client's retry budget.
    pub max_retries: Option<u32>,

    /// Overrides the client's timeout.
    pub timeout: Option<Duration>,

    /// Log failures at debug level instead of warn.
    pub quiet: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            payload: None,
            expect_reply: true,
            skip_auth: false,
            max_retries: None,
            timeout: None,
            quiet: false,
        }
    }
}

impl CallOptions {
    /// A reply-expecting query.
    #[inline]
    #[must_use]
    pub fn query() -> Self {
        Self::default()
    }

    /// A call that settles as soon as it is sent.
    #[inline]
    #[must_use]
    pub fn no_reply() -> Self {
        Self {
            expect_reply: false,
            ..Self::default()
        }
    }

    /// Sets the payload.
    #[inline]
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Skips authentication.
    #[inline]
    #[must_use]
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// Overrides the retry budget.
    #[inline]
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Overrides the timeout.
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Logs failures at debug level.
    #[inline]
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}
