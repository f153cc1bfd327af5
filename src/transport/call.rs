//! Settle-once pending call.
//!
//! A [`PendingCall`] stands for one open connection. It moves from
//! [`Settlement::Pending`] to either [`Settlement::Resolved`] or
//! [`Settlement::Failed`] exactly once; every later settlement attempt
//! (a late frame, the close event) is a no-op.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::CallId;

// ============================================================================
// Settlement
// ============================================================================

/// Settlement state of a [`PendingCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Still waiting.
    Pending,
    /// Settled with a value.
    Resolved,
    /// Settled with an error.
    Failed,
}

// ============================================================================
// PendingCall
// ============================================================================

/// One open connection waiting to settle.
#[derive(Debug)]
pub struct PendingCall {
    /// Call identifier.
    id: CallId,
    /// Control path, for error context.
    path: String,
    /// Whether a reply frame is expected.
    expect_reply: bool,
    /// Instant past which the connection is dropped.
    deadline: Instant,
    /// Settlement channel, taken on first settlement.
    settle_tx: Option<oneshot::Sender<Result<Value>>>,
    /// Current state.
    state: Settlement,
}

impl PendingCall {
    /// Creates a pending call and the receiver its waiter listens on.
    #[must_use]
    pub fn new(
        id: CallId,
        path: impl Into<String>,
        expect_reply: bool,
        deadline: Instant,
    ) -> (Self, oneshot::Receiver<Result<Value>>) {
        let (settle_tx, settle_rx) = oneshot::channel();
        let call = Self {
            id,
            path: path.into(),
            expect_reply,
            deadline,
            settle_tx: Some(settle_tx),
            state: Settlement::Pending,
        };
        (call, settle_rx)
    }

    /// Returns the call identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> CallId {
        self.id
    }

    /// Returns the control path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` if a reply frame is expected.
    #[inline]
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        self.expect_reply
    }

    /// Returns the deadline.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns the settlement state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> Settlement {
        self.state
    }

    /// Returns `true` once resolved or failed.
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state != Settlement::Pending
    }

    /// Resolves the call. Returns `false` if it was already settled.
    pub fn resolve(&mut self, value: Value) -> bool {
        self.settle(Settlement::Resolved, Ok(value))
    }

    /// Fails the call. Returns `false` if it was already settled.
    pub fn fail(&mut self, error: Error) -> bool {
        self.settle(Settlement::Failed, Err(error))
    }

    /// Handles an inbound frame.
    ///
    /// Ignored for no-reply calls. Otherwise the first frame settles the
    /// call: empty text resolves to null, JSON resolves to the parsed
    /// value, anything else fails.
    pub fn on_message(&mut self, text: &str) -> bool {
        if !self.expect_reply {
            return false;
        }

        if text.is_empty() {
            return self.resolve(Value::Null);
        }

        match serde_json::from_str(text) {
            Ok(value) => self.resolve(value),
            Err(e) => self.fail(Error::Json(e)),
        }
    }

    /// Handles the connection closing.
    ///
    /// Fails a call still waiting for its reply; resolves a no-reply call.
    pub fn on_close(&mut self) -> bool {
        if self.expect_reply {
            let error = Error::connection_closed(&self.path);
            self.fail(error)
        } else {
            self.resolve(Value::Null)
        }
    }

    fn settle(&mut self, state: Settlement, outcome: Result<Value>) -> bool {
        let Some(tx) = self.settle_tx.take() else {
            trace!(call_id = %self.id, path = %self.path, "Late settlement ignored");
            return false;
        };

        self.state = state;
        // Waiter may already have given up on the deadline
        let _ = tx.send(outcome);
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn pending(expect_reply: bool) -> (PendingCall, oneshot::Receiver<Result<Value>>) {
        PendingCall::new(CallId::generate(), "/remote/controller/heartbeat", expect_reply, Instant::now())
    }

    #[tokio::test]
    async fn test_first_message_settles() {
        let (mut call, rx) = pending(true);

        assert!(call.on_message(r#"{"data":{"ok":true}}"#));
        assert_eq!(call.state(), Settlement::Resolved);

        // Later events are no-ops
        assert!(!call.on_message(r#"{"data":{"ok":false}}"#));
        assert!(!call.on_close());
        assert_eq!(call.state(), Settlement::Resolved);

        let value = rx.await.expect("settled").expect("resolved");
        assert_eq!(value, json!({"data": {"ok": true}}));
    }

    #[tokio::test]
    async fn test_empty_message_resolves_null() {
        let (mut call, rx) = pending(true);
        assert!(call.on_message(""));
        assert_eq!(rx.await.expect("settled").expect("resolved"), Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_message_fails() {
        let (mut call, rx) = pending(true);
        assert!(call.on_message("not json"));
        assert_eq!(call.state(), Settlement::Failed);

        let err = rx.await.expect("settled").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_close_before_reply_fails_transient() {
        let (mut call, rx) = pending(true);
        assert!(call.on_close());

        let err = rx.await.expect("settled").unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(err, Error::ConnectionClosed { .. }));
    }

    #[tokio::test]
    async fn test_no_reply_ignores_messages_and_resolves_on_close() {
        let (mut call, rx) = pending(false);
        assert!(!call.on_message(r#"{"late":1}"#));
        assert!(!call.is_settled());

        assert!(call.on_close());
        assert_eq!(rx.await.expect("settled").expect("resolved"), Value::Null);
    }

    #[test]
    fn test_settle_after_waiter_dropped() {
        let (mut call, rx) = pending(true);
        drop(rx);
        assert!(call.fail(Error::request_timeout("/x", 10)));
        assert!(!call.resolve(Value::Null));
        assert_eq!(call.state(), Settlement::Failed);
    }
}
