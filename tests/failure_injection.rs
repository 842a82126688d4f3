//! Failure injection tests for the relay.

mod common;

use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use common::{envelope, relay_config, send_payload, start_relay, MemoryStore};
use message_relay::config::StoreConfig;
use message_relay::lifecycle::{LifecycleState, RelayController, StartupError};

#[tokio::test]
async fn liveness_failure_aborts_startup() {
    let store = MemoryStore::unreachable();
    let controller = RelayController::new(relay_config(2, 1_000));
    let state = controller.state();

    let err = controller.start_with_store(store.clone()).await.err().unwrap();
    assert!(matches!(err, StartupError::Backend(_)));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(*state.borrow(), LifecycleState::Stopped);
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn unreachable_sqlite_backend_aborts_startup() {
    let mut config = relay_config(2, 1_000);
    config.store = StoreConfig {
        uri: "sqlite:///nonexistent/relay/messages.db?mode=rw".to_string(),
        ..StoreConfig::default()
    };
    config.store.wait_timeout_ms = 500;

    let err = RelayController::new(config).start().await.err().unwrap();
    assert!(matches!(err, StartupError::Backend(_)));
}

#[tokio::test]
async fn port_in_use_fails_bind_and_releases_store() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = relay_config(2, 1_000);
    config.listener.port = occupied.local_addr().unwrap().port();

    let store = MemoryStore::new();
    let controller = RelayController::new(config);
    let state = controller.state();

    let err = controller.start_with_store(store.clone()).await.err().unwrap();
    assert!(matches!(err, StartupError::Bind(_)));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(*state.borrow(), LifecycleState::Stopped);
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn write_failure_does_not_stop_the_relay() {
    let store = MemoryStore::new();
    let relay = start_relay(relay_config(2, 1_000), store.clone()).await;

    store.fail_writes(true);
    send_payload(relay.addr, &envelope("alice", "lost")).await;
    assert_eq!(store.count(), 0);

    store.fail_writes(false);
    send_payload(relay.addr, &envelope("alice", "kept")).await;
    assert_eq!(store.count(), 1);
    assert_eq!(store.documents()[0].message(), "kept");

    relay.stop().await;
}

#[tokio::test]
async fn in_flight_write_is_drained_on_shutdown() {
    let store = MemoryStore::slow(Duration::from_millis(300));
    let relay = start_relay(relay_config(2, 1_000), store.clone()).await;

    let addr = relay.addr;
    let sender = tokio::spawn(async move {
        send_payload(addr, &envelope("alice", "slow")).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let report = relay.stop().await;
    assert!(report.drained);
    assert_eq!(store.count(), 1);
    assert_eq!(store.closes(), 1);
    sender.await.unwrap();
}

#[tokio::test]
async fn repeated_trigger_is_a_no_op() {
    let store = MemoryStore::new();
    let relay = start_relay(relay_config(2, 1_000), store.clone()).await;

    assert!(relay.shutdown.trigger());
    assert!(!relay.shutdown.trigger());

    let report = relay.stop().await;
    assert!(report.store_closed);
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn excess_connections_queue_behind_busy_workers() {
    let store = MemoryStore::slow(Duration::from_millis(200));
    let relay = start_relay(relay_config(2, 5_000), store.clone()).await;

    let started = Instant::now();
    let mut senders = Vec::new();
    for i in 0..6 {
        let addr = relay.addr;
        senders.push(tokio::spawn(async move {
            send_payload(addr, &envelope(&format!("user{i}"), "queued")).await;
        }));
    }
    for sender in senders {
        sender.await.unwrap();
    }

    // Two workers, three rounds of 200 ms writes.
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(store.count(), 6);

    relay.stop().await;
}

#[tokio::test]
async fn silent_client_times_out_and_frees_the_worker() {
    let store = MemoryStore::new();
    let relay = start_relay(relay_config(1, 200), store.clone()).await;

    let mut silent = TcpStream::connect(relay.addr).await.unwrap();
    send_payload(relay.addr, &envelope("bob", "after the silent one")).await;
    assert_eq!(store.count(), 1);

    // The relay closed the silent connection after its read timeout.
    let mut buf = Vec::new();
    let closed = tokio::time::timeout(Duration::from_secs(2), silent.read_to_end(&mut buf)).await;
    assert!(closed.is_ok());

    relay.stop().await;
}

#[tokio::test]
async fn oversized_payload_is_dropped() {
    let store = MemoryStore::new();
    let mut config = relay_config(2, 1_000);
    config.workers.max_payload_bytes = 1_024;
    let relay = start_relay(config, store.clone()).await;

    let big = "x".repeat(4_096);
    let mut stream = TcpStream::connect(relay.addr).await.unwrap();
    let _ = stream.write_all(&envelope("alice", &big)).await;
    let _ = stream.shutdown().await;
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest).await;

    send_payload(relay.addr, &envelope("alice", "small")).await;
    assert_eq!(store.count(), 1);
    assert_eq!(store.documents()[0].message(), "small");

    relay.stop().await;
}
