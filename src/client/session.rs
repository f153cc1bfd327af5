//! Authentication session state.
//!
//! The session (authenticated flag, timestamp, cookies) and the slot for
//! the in-flight authentication attempt live behind one lock, so checking
//! validity and joining or starting an attempt is a single step.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{Error, ErrorKind};
use crate::transport::{Cookie, CookieJar, CookieSink};

// ============================================================================
// Types
// ============================================================================

/// Shared handle on the one authentication attempt in progress.
pub(crate) type AuthFlight = Shared<BoxFuture<'static, Result<(), AuthFailure>>>;

// ============================================================================
// AuthFailure
// ============================================================================

/// Cloneable outcome of a failed attempt, handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthFailure {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
}

impl From<&Error> for AuthFailure {
    fn from(error: &Error) -> Self {
        match error {
            Error::Config { message } => Self {
                kind: ErrorKind::Configuration,
                message: message.clone(),
                status: None,
            },
            Error::Authentication { message, status } => Self {
                kind: ErrorKind::Authentication,
                message: message.clone(),
                status: *status,
            },
            other => Self {
                kind: ErrorKind::Authentication,
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<AuthFailure> for Error {
    fn from(failure: AuthFailure) -> Self {
        match failure.kind {
            ErrorKind::Configuration => Error::Config {
                message: failure.message,
            },
            _ => Error::Authentication {
                message: failure.message,
                status: failure.status,
            },
        }
    }
}

// ============================================================================
// SessionState
// ============================================================================

#[derive(Default)]
struct SessionState {
    authenticated: bool,
    last_auth: Option<Instant>,
    cookies: CookieJar,
    in_flight: Option<AuthFlight>,
}

impl SessionState {
    fn is_valid(&self, ttl: Duration) -> bool {
        self.authenticated
            && self
                .last_auth
                .is_some_and(|at| at.elapsed() < ttl)
    }

    fn invalidate(&mut self) {
        self.authenticated = false;
        self.last_auth = None;
        self.cookies.clear();
    }
}

// ============================================================================
// Session
// ============================================================================

/// What [`Session::begin`] decided.
pub(crate) enum Admission {
    /// Session is valid; nothing to do.
    Valid,
    /// Await this attempt (joined or freshly started).
    Await(AuthFlight),
}

/// Authentication session of one client.
pub(crate) struct Session {
    state: Mutex<SessionState>,
    ttl: Duration,
}

impl Session {
    /// Creates an unauthenticated session.
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            ttl,
        }
    }

    /// Returns `true` if authenticated within the TTL.
    pub fn is_valid(&self) -> bool {
        self.state.lock().is_valid(self.ttl)
    }

    /// Clears the flag, timestamp and cookies in one step.
    pub fn invalidate(&self) {
        self.state.lock().invalidate();
        trace!("Session invalidated");
    }

    /// Returns the `Cookie` header for the next call.
    pub fn cookie_header(&self) -> Option<String> {
        self.state.lock().cookies.header()
    }

    /// Decides whether the caller may proceed, must join the attempt in
    /// progress, or must await a new one built by `start`.
    ///
    /// `force` invalidates the session first. `start` runs under the lock
    /// and must only build the future, not poll it.
    pub fn begin(&self, force: bool, start: impl FnOnce() -> AuthFlight) -> Admission {
        let mut state = self.state.lock();

        if force {
            state.invalidate();
        } else if state.is_valid(self.ttl) {
            return Admission::Valid;
        }

        if let Some(flight) = &state.in_flight {
            trace!("Joining authentication in progress");
            return Admission::Await(flight.clone());
        }

        let flight = start();
        state.in_flight = Some(flight.clone());
        Admission::Await(flight)
    }

    /// Records the outcome of the attempt and frees the slot.
    pub fn finish(&self, succeeded: bool) {
        let mut state = self.state.lock();
        if succeeded {
            state.authenticated = true;
            state.last_auth = Some(Instant::now());
            debug!("Authenticated");
        } else {
            state.invalidate();
        }
        state.in_flight = None;
    }

    /// Returns `true` while an attempt is in progress.
    #[cfg(test)]
    pub fn has_flight(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }
}

impl CookieSink for Session {
    fn store_cookies(&self, cookies: Vec<Cookie>) {
        self.state.lock().cookies.merge(cookies);
    }
}

// ============================================================================
// Tests
// ============================================================================
