//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use message_relay::config::{ListenerConfig, RelayConfig, StoreConfig, WorkerConfig};
use message_relay::lifecycle::{LifecycleState, RelayController, Shutdown, ShutdownReport};
use message_relay::message::MessageDocument;
use message_relay::store::{Ack, DocumentStore, StoreError};

/// In-memory document store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<MessageDocument>>,
    closes: AtomicUsize,
    fail_ping: bool,
    fail_writes: AtomicBool,
    write_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A store whose liveness check always fails.
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            fail_ping: true,
            ..Self::default()
        })
    }

    /// A store that takes `delay` to acknowledge each write.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            write_delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn documents(&self) -> Vec<MessageDocument> {
        self.documents.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Wait until at least `expected` documents are stored.
    pub async fn wait_for_documents(&self, expected: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.count() >= expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.count() >= expected
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail_ping {
            return Err(StoreError::Liveness("connection refused".to_string()));
        }
        Ok(())
    }

    async fn insert_one(&self, document: &MessageDocument) -> Result<Ack, StoreError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        let mut documents = self.documents.lock().unwrap();
        documents.push(document.clone());
        Ok(Ack {
            id: documents.len() as i64,
        })
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Relay config on an ephemeral loopback port.
pub fn relay_config(max_workers: usize, read_timeout_ms: u64) -> RelayConfig {
    RelayConfig {
        listener: ListenerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ListenerConfig::default()
        },
        workers: WorkerConfig {
            max_workers,
            read_timeout_ms,
            ..WorkerConfig::default()
        },
        store: temp_sqlite_store(),
        ..RelayConfig::default()
    }
}

/// Store config pointing at a fresh SQLite file.
pub fn temp_sqlite_store() -> StoreConfig {
    let path = std::env::temp_dir().join(format!("relay-it-{}.db", uuid::Uuid::new_v4()));
    StoreConfig {
        uri: format!("sqlite://{}?mode=rwc", path.display()),
        max_pool_size: 4,
        min_pool_size: 1,
        ..StoreConfig::default()
    }
}

/// A relay serving in the background.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub state: watch::Receiver<LifecycleState>,
    pub handle: JoinHandle<ShutdownReport>,
}

impl TestRelay {
    /// Trigger shutdown and wait for teardown to finish.
    pub async fn stop(self) -> ShutdownReport {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("relay did not stop in time")
            .expect("relay task panicked")
    }
}

/// Start a relay on `store` and serve it in the background.
pub async fn start_relay(config: RelayConfig, store: Arc<dyn DocumentStore>) -> TestRelay {
    let controller = RelayController::new(config);
    let relay = controller
        .start_with_store(store)
        .await
        .expect("relay failed to start");

    TestRelay {
        addr: relay.local_addr(),
        shutdown: relay.shutdown_handle(),
        state: relay.state(),
        handle: tokio::spawn(relay.serve()),
    }
}

/// Send one payload, half-close, and wait for the relay to close its side.
pub async fn send_payload(addr: SocketAddr, payload: &[u8]) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(payload).await.unwrap();
    stream.shutdown().await.unwrap();

    // The relay never answers; EOF means the worker is done with us.
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest).await;
}

pub fn envelope(username: &str, message: &str) -> Vec<u8> {
    serde_json::json!({ "username": username, "message": message })
        .to_string()
        .into_bytes()
}
