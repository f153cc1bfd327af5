//! Local stand-ins for the device used by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::{COOKIE, HeaderName, ORIGIN, SET_COOKIE};
use tokio_tungstenite::tungstenite::http::{HeaderValue, Response as HttpResponse};

use yolobox_control::transport::{CookieJar, CookieSink};
use yolobox_control::{CallId, CallRequest, Cookie, Endpoint};

// ============================================================================
// WebSocket Device
// ============================================================================

/// What the device does with one connection after the handshake.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Send these text frames, then wait for the client to close.
    Frames(Vec<String>),
    /// Close right away without replying.
    Close,
    /// Never reply; wait for the client to go away.
    Hang,
    /// Refuse the handshake with this status.
    Reject(u16),
}

impl Behavior {
    pub fn reply(value: Value) -> Self {
        Self::Frames(vec![value.to_string()])
    }
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub queued: VecDeque<Behavior>,
    pub behavior: Behavior,
    pub set_cookie: Option<String>,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            queued: VecDeque::new(),
            behavior: Behavior::reply(json!({"data": {}})),
            set_cookie: None,
        }
    }
}

/// One handshake as the device saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub cookie: Option<String>,
    pub origin: Option<String>,
    pub payload: Option<String>,
}

/// A WebSocket server answering per path.
pub struct DeviceServer {
    pub port: u16,
    plans: Arc<Mutex<HashMap<String, Plan>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
    dropped: Arc<AtomicUsize>,
}

impl DeviceServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let server = Self {
            port,
            plans: Arc::default(),
            seen: Arc::default(),
            dropped: Arc::default(),
        };

        let plans = Arc::clone(&server.plans);
        let seen = Arc::clone(&server.seen);
        let dropped = Arc::clone(&server.dropped);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(
                    stream,
                    Arc::clone(&plans),
                    Arc::clone(&seen),
                    Arc::clone(&dropped),
                ));
            }
        });

        server
    }

    pub fn plan(&self, path: &str, behavior: Behavior) {
        self.plans.lock().entry(path.to_string()).or_default().behavior = behavior;
    }

    /// Queues behaviors used, in order, before the path's standing one.
    pub fn queue(&self, path: &str, behaviors: impl IntoIterator<Item = Behavior>) {
        self.plans
            .lock()
            .entry(path.to_string())
            .or_default()
            .queued
            .extend(behaviors);
    }

    pub fn set_cookie(&self, path: &str, header: &str) {
        self.plans.lock().entry(path.to_string()).or_default().set_cookie =
            Some(header.to_string());
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    pub fn seen_on(&self, path: &str) -> Vec<Seen> {
        self.seen().into_iter().filter(|s| s.path == path).collect()
    }

    /// Connections that went away while the device was hanging.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", self.port, 8080)
    }

    /// Waits until `check` holds, for at most two seconds.
    pub async fn wait_until(&self, check: impl Fn(&Self) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if check(self) {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }
        check(self)
    }
}

async fn serve(
    stream: TcpStream,
    plans: Arc<Mutex<HashMap<String, Plan>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
    dropped: Arc<AtomicUsize>,
) {
    let mut chosen: Option<(usize, Behavior)> = None;

    let callback = |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        let path = request.uri().path().to_string();
        let header = |name: HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let (behavior, set_cookie) = {
            let mut plans = plans.lock();
            let plan = plans.entry(path.clone()).or_default();
            let behavior = plan
                .queued
                .pop_front()
                .unwrap_or_else(|| plan.behavior.clone());
            (behavior, plan.set_cookie.clone())
        };

        let index = {
            let mut seen = seen.lock();
            seen.push(Seen {
                path,
                cookie: header(COOKIE),
                origin: header(ORIGIN),
                payload: None,
            });
            seen.len() - 1
        };

        if let Behavior::Reject(status) = behavior {
            let rejection = HttpResponse::builder()
                .status(status)
                .body(None)
                .expect("rejection");
            return Err(rejection);
        }

        if let Some(cookie) = &set_cookie {
            response
                .headers_mut()
                .append(SET_COOKIE, HeaderValue::from_str(cookie).expect("cookie"));
        }

        chosen = Some((index, behavior));
        Ok(response)
    };

    let Ok(mut socket) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
        return;
    };
    let Some((index, behavior)) = chosen else {
        return;
    };

    if let Ok(Some(Ok(Message::Text(text)))) =
        timeout(Duration::from_millis(100), socket.next()).await
    {
        seen.lock()[index].payload = Some(text.as_str().to_string());
    }

    match behavior {
        Behavior::Frames(frames) => {
            for frame in frames {
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    return;
                }
            }
            while let Some(Ok(_)) = socket.next().await {}
        }
        Behavior::Close => {
            let _ = socket.close(None).await;
        }
        Behavior::Hang => {
            while let Some(Ok(_)) = socket.next().await {}
            dropped.fetch_add(1, Ordering::SeqCst);
        }
        Behavior::Reject(_) => {}
    }
}

// ============================================================================
// Silent Listener
// ============================================================================

/// Accepts one TCP connection and never answers the handshake.
///
/// The receiver fires once the client side of the connection is gone.
pub async fn silent_listener() -> (u16, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let (closed_tx, closed_rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0_u8; 1024];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = closed_tx.send(());
    });

    (port, closed_rx)
}

/// Returns a port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("addr").port()
}

// ============================================================================
// HTTP Asset Server
// ============================================================================

/// Serves every request with the same status and body.
///
/// Returns the port and the request heads received, lowercased.
pub async fn http_server(status: u16, body: &'static [u8]) -> (u16, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let heads = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&heads);
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut head = Vec::new();
            let mut buf = [0_u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            recorded
                .lock()
                .push(String::from_utf8_lossy(&head).to_lowercase());

            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.write_all(body).await;
            let _ = stream.shutdown().await;
        }
    });

    (port, heads)
}

// ============================================================================
// Helpers
// ============================================================================

/// Cookie sink backed by a plain jar.
#[derive(Default)]
pub struct TestJar(Mutex<CookieJar>);

impl TestJar {
    pub fn header(&self) -> Option<String> {
        self.0.lock().header()
    }
}

impl CookieSink for TestJar {
    fn store_cookies(&self, cookies: Vec<Cookie>) {
        self.0.lock().merge(cookies);
    }
}

/// Builds a call request against `endpoint`.
pub fn request(
    endpoint: Endpoint,
    path: &str,
    payload: Option<Value>,
    expect_reply: bool,
    timeout: Duration,
) -> CallRequest {
    CallRequest {
        id: CallId::generate(),
        endpoint,
        path: path.to_string(),
        payload,
        expect_reply,
        timeout,
        cookie_header: None,
    }
}
