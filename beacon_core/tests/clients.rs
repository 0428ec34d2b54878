//! Clients delivering through their transports end to end.

mod common;

use std::time::Duration;

use beacon_core::{Client, Config, CooperativeClient, ThreadedClient, TransportErrorKind};
use common::{init_test_logging, StubResponse, StubServer};

fn config_for(server: &StubServer) -> Config {
    Config {
        servers: vec![server.url().to_string()],
        secret_token: Some("s3cret".into()),
        timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

#[test]
fn test_threaded_capture_is_delivered_by_worker() {
    init_test_logging();
    let server = StubServer::start(StubResponse::status(202));
    let client = ThreadedClient::new(config_for(&server)).unwrap();

    client.capture(b"event-1".to_vec());
    client.capture(b"event-2".to_vec());
    assert!(client.flush(Duration::from_secs(5)));

    let requests = server.requests();
    let bodies: Vec<_> = requests.iter().map(|r| r.body.clone()).collect();
    assert_eq!(bodies, vec![b"event-1".to_vec(), b"event-2".to_vec()]);
    assert_eq!(
        requests[0].headers.get("authorization").map(String::as_str),
        Some("Bearer s3cret")
    );
    assert_eq!(
        requests[0].headers.get("user-agent").map(String::as_str),
        Some(beacon_core::AGENT_VERSION)
    );
}

/// A rejected capture is logged by the worker and does not reach the caller.
#[test]
fn test_threaded_capture_swallows_rejection() {
    init_test_logging();
    let server = StubServer::start(StubResponse::status(500).body(b"boom"));
    let client = ThreadedClient::new(config_for(&server)).unwrap();

    client.capture(b"event".to_vec());

    assert!(client.flush(Duration::from_secs(5)));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn test_threaded_send_reports_rejection() {
    let server = StubServer::start(StubResponse::status(403).body(b"bad token"));
    let client = ThreadedClient::new(Config {
        async_mode: false,
        ..config_for(&server)
    })
    .unwrap();

    let err = client.send(b"event".to_vec()).expect_err("403 must be rejected");

    assert_eq!(err.kind(), TransportErrorKind::Rejected);
    assert!(err.message().contains("bad token"));
}

#[tokio::test]
async fn test_cooperative_capture_is_spawned_and_drained() {
    init_test_logging();
    let server = StubServer::start(StubResponse::status(202).header("Location", "/e/1"));
    let client = CooperativeClient::new(config_for(&server)).unwrap();

    client.capture(b"event".to_vec());
    assert!(client.drain(Duration::from_secs(5)).await);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, b"event");
}

#[tokio::test]
async fn test_cooperative_send_returns_token() {
    let server = StubServer::start(StubResponse::status(202).header("Location", "/e/2"));
    let client = CooperativeClient::new(config_for(&server)).unwrap();

    assert_eq!(client.send(b"event".to_vec()).await.unwrap(), "/e/2");
}

/// `flush` from a thread outside the runtime waits for spawned sends.
#[test]
fn test_cooperative_flush_from_outside_runtime() {
    let server = StubServer::start(StubResponse::status(202).delay(Duration::from_millis(50)));
    let client = CooperativeClient::new(config_for(&server)).unwrap();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async { client.capture(b"event".to_vec()) });

    assert!(client.flush(Duration::from_secs(5)));
    assert_eq!(server.requests().len(), 1);
}
