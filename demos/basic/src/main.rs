/**
 * Minimal harness for the Beacon delivery core.
 *
 * Point it at a collector with a JSON settings document in `BEACON_SETTINGS`
 * (defaults to `http://localhost:8200`), then run:
 *
 *   cargo run -p beacon_demo                  # threaded client via the registry
 *   cargo run -p beacon_demo -- --cooperative # cooperative transport on one thread
 *
 * Set `RUST_LOG=debug` to see delivery outcomes.
 */
use std::time::Duration;

use beacon_core::{handle, Captured, ClientRegistry, Config, CooperativeClient};
use tracing_subscriber::EnvFilter;

const DEFAULT_SETTINGS: &str = r#"{"SERVERS": ["http://localhost:8200"], "TIMEOUT": 5}"#;

fn load_settings() -> Config {
    let document = std::env::var("BEACON_SETTINGS").unwrap_or_else(|_| DEFAULT_SETTINGS.into());

    Config::from_json(&document).unwrap_or_else(|err| {
        tracing::error!("invalid BEACON_SETTINGS, using defaults: {err}");
        Config::from_json(DEFAULT_SETTINGS).unwrap_or_default()
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if std::env::args().any(|a| a == "--cooperative") {
        run_cooperative();
    } else {
        run_threaded();
    }
}

/*
 * Captures go through the boundary handler; the worker thread delivers them
 * and logs any failure.
 */
fn run_threaded() {
    let registry = ClientRegistry::new(load_settings);

    handle(&registry, Captured::new(b"{\"message\":\"hello from beacon\"}".to_vec()));
    handle(&registry, Captured::new(b"{\"message\":\"second event\"}".to_vec()));

    match registry.get_client(None) {
        Ok(client) => {
            if !client.flush(Duration::from_secs(5)) {
                tracing::warn!("flush timed out, some events may not have been sent");
            }
        }
        Err(err) => tracing::error!("no client available: {err}"),
    }
}

/*
 * A single-threaded scheduler awaiting one send directly, so the outcome
 * can be printed.
 */
fn run_cooperative() {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!("failed to start runtime: {err}");
            return;
        }
    };

    runtime.block_on(async {
        let client = match CooperativeClient::new(load_settings()) {
            Ok(client) => client,
            Err(err) => {
                tracing::error!("failed to build client: {err}");
                return;
            }
        };

        match client.send(b"{\"message\":\"hello from beacon\"}".to_vec()).await {
            Ok(location) => println!("[demo] Delivered, location: {location:?}"),
            Err(err) => println!("[demo] Not delivered ({:?}): {err}", err.kind()),
        }
    });
}
