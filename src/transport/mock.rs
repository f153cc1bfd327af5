//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::error::{Error, Result};

use super::cookies::Cookie;
use super::{CallRequest, CookieSink, Transport};

/// Scripted outcome of one call.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    /// Resolve with this value.
    Reply(Value),
    /// Closed before a reply.
    Closed,
    /// Deadline elapsed.
    Timeout,
    /// Handshake answered 401.
    Unauthorized,
    /// Connection refused.
    Refused,
    /// Reply was not JSON.
    Malformed,
}

impl Outcome {
    fn into_result(self, path: &str) -> Result<Value> {
        match self {
            Self::Reply(value) => Ok(value),
            Self::Closed => Err(Error::connection_closed(path)),
            Self::Timeout => Err(Error::request_timeout(path, 4000)),
            Self::Unauthorized => Err(Error::handshake(401)),
            Self::Refused => Err(Error::connection("connection refused")),
            Self::Malformed => {
                let json_err = serde_json::from_str::<Value>("{oops").unwrap_err();
                Err(Error::Json(json_err))
            }
        }
    }
}

/// What a call looked like when it reached the transport.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub host: String,
    pub path: String,
    pub payload: Option<Value>,
    pub expect_reply: bool,
    pub cookie_header: Option<String>,
}

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<Outcome>>,
    fallback: HashMap<String, Outcome>,
    delays: HashMap<String, Duration>,
    cookies: HashMap<String, Vec<Cookie>>,
}

/// Transport answering from a per-path script.
///
/// Queued outcomes are consumed first, then the path's fallback, then a
/// default: `null` for no-reply calls, `{"data": {}}` otherwise.
#[derive(Default)]
pub(crate) struct MockTransport {
    script: Mutex<Script>,
    calls: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues outcomes for the next calls to `path`.
    pub fn enqueue(&self, path: &str, outcomes: impl IntoIterator<Item = Outcome>) {
        self.script
            .lock()
            .queued
            .entry(path.to_string())
            .or_default()
            .extend(outcomes);
    }

    /// Sets the outcome used once the queue for `path` is empty.
    pub fn always(&self, path: &str, outcome: Outcome) {
        self.script.lock().fallback.insert(path.to_string(), outcome);
    }

    /// Delays every call to `path`.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.script.lock().delays.insert(path.to_string(), delay);
    }

    /// Makes every handshake of `path` set these cookies.
    pub fn set_cookies(&self, path: &str, cookies: Vec<Cookie>) {
        self.script.lock().cookies.insert(path.to_string(), cookies);
    }

    /// Returns how many calls reached `path`.
    pub fn count(&self, path: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.path == path).count()
    }

    /// Returns every recorded call, oldest first.
    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().clone()
    }

    /// Returns the recorded calls to `path`.
    pub fn calls_to(&self, path: &str) -> Vec<Recorded> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn perform_call(
        &self,
        request: CallRequest,
        cookies: Arc<dyn CookieSink>,
    ) -> Result<Value> {
        request.endpoint.ws_url(&request.path)?;

        self.calls.lock().push(Recorded {
            host: request.endpoint.host.clone(),
            path: request.path.clone(),
            payload: request.payload.clone(),
            expect_reply: request.expect_reply,
            cookie_header: request.cookie_header.clone(),
        });

        let (outcome, delay, set_cookies) = {
            let mut script = self.script.lock();
            let queued = script
                .queued
                .get_mut(&request.path)
                .and_then(VecDeque::pop_front);
            let outcome = queued
                .or_else(|| script.fallback.get(&request.path).cloned())
                .unwrap_or_else(|| {
                    if request.expect_reply {
                        Outcome::Reply(json!({"data": {}}))
                    } else {
                        Outcome::Reply(Value::Null)
                    }
                });
            let delay = script.delays.get(&request.path).copied();
            let set_cookies = script.cookies.get(&request.path).cloned();
            (outcome, delay, set_cookies)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(set_cookies) = set_cookies
            && !matches!(outcome, Outcome::Unauthorized | Outcome::Refused)
        {
            cookies.store_cookies(set_cookies);
        }

        outcome.into_result(&request.path)
    }
}
