//! Poll a YoloBox and print what changes.
//!
//! Demonstrates:
//! - Building a client from command-line arguments
//! - Running a poller with an observer
//! - Reading the cached state and sending an order
//!
//! Usage:
//!   cargo run --example poll_device -- 192.168.1.20
//!   cargo run --example poll_device -- 192.168.1.20 8887 --debug
//!   cargo run --example poll_device -- 192.168.1.20 --no-wait

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use tracing_subscriber::EnvFilter;
use yolobox_control::{
    Client, ConnectionStatus, DeviceState, LiveStatus, Order, Poller, Result, StateObserver,
};

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    host: String,
    port: Option<u16>,
    debug: bool,
    no_wait: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut positional = args.iter().filter(|a| !a.starts_with("--"));

        Self {
            host: positional.next().cloned().unwrap_or_default(),
            port: positional.next().and_then(|p| p.parse().ok()),
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
        }
    }
}

/// Prints every notification.
struct PrintObserver;

impl StateObserver for PrintObserver {
    fn status_changed(&self, status: &ConnectionStatus) {
        println!("[status] {status}");
    }

    fn device_status_changed(&self, status: &Value) {
        let name = status.get("deviceName").and_then(Value::as_str).unwrap_or("?");
        let battery = status.get("battery").map(Value::to_string).unwrap_or_default();
        println!("[device] {name} battery={battery}");
    }

    fn live_status_changed(&self, status: &LiveStatus) {
        println!("[live]   living={}", status.living);
    }

    fn lists_changed(&self, state: &DeviceState) {
        let directors: Vec<&str> = state.directors.iter().map(|d| d.label()).collect();
        let mixers: Vec<&str> = state.mixers.iter().map(|m| m.key()).collect();
        println!("[lists]  directors={directors:?} overlays={} mixers={mixers:?}", state.overlays.len());
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut builder = Client::builder().host(args.host.as_str());
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    let client = builder.build()?;

    let poller = Poller::with_observer(client, Arc::new(PrintObserver));
    println!("[connect] {:?}", poller.connect().await);

    let state = poller.state();
    if let Some(active) = state.active_director_id() {
        println!("[program] {active}");
        // Re-select the current source; harmless and confirms orders work
        poller
            .send_order(&Order::DirectorChange {
                id: active.to_string(),
                is_selected: true,
            })
            .await?;
    }

    if args.no_wait {
        println!("[--no-wait] Skipping wait");
    } else {
        println!("Press Ctrl+C to exit...");
        tokio::signal::ctrl_c().await.ok();
    }

    poller.stop();
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "yolobox_control=debug"
    } else {
        "yolobox_control=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
