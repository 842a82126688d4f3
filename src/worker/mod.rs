//! Bounded worker pool.
//!
//! # Data Flow
//! ```text
//! accept loop
//!     → WorkerPool::submit (never blocks)
//!     → task waits for a worker slot (semaphore, unbounded queue)
//!     → handler.rs (read → validate → persist → close)
//! ```
//!
//! # Design Decisions
//! - At most `max_workers` connections are processed at once; the rest queue
//! - The read timeout starts when a worker picks the connection up
//! - Failures are contained per connection; a panicking worker only loses
//!   its own connection
//! - Shutdown closes the tracker and waits for queued and running work

mod handler;

pub use handler::ConnectionError;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::config::WorkerConfig;
use crate::net::ConnectionId;
use crate::observability::metrics;
use crate::store::PersistenceWriter;

use handler::{handle_connection, WorkerContext};

/// Fixed-size pool processing one connection per worker.
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    context: Arc<WorkerContext>,
    name_prefix: Arc<str>,
    max_workers: usize,
}

impl WorkerPool {
    pub fn new(config: &WorkerConfig, writer: PersistenceWriter) -> Self {
        let max_workers = config.max_workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_workers)),
            tracker: TaskTracker::new(),
            context: Arc::new(WorkerContext {
                writer,
                read_timeout: config.read_timeout(),
                max_payload_bytes: config.max_payload_bytes,
            }),
            name_prefix: Arc::from(config.name_prefix.as_str()),
            max_workers,
        }
    }

    /// Hand a connection to the pool. Returns immediately.
    ///
    /// Connections submitted after [`WorkerPool::shutdown`] are closed unread.
    pub fn submit<S>(&self, stream: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        if self.tracker.is_closed() {
            tracing::warn!(peer_addr = %peer, "Worker pool is shut down, dropping connection");
            return;
        }

        let id = ConnectionId::next();
        let span = tracing::info_span!(
            "worker",
            pool = %self.name_prefix,
            connection_id = %id,
            peer_addr = %peer,
        );
        let permits = Arc::clone(&self.permits);
        let context = Arc::clone(&self.context);
        let max_workers = self.max_workers;

        self.tracker.spawn(
            async move {
                let Ok(permit) = permits.clone().acquire_owned().await else {
                    return;
                };
                metrics::record_busy_workers(max_workers - permits.available_permits());

                let started = Instant::now();
                match handle_connection(stream, &context).await {
                    Ok(()) => {
                        metrics::record_connection_outcome("saved");
                        tracing::debug!(
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Connection handled"
                        );
                    }
                    Err(e) => {
                        metrics::record_connection_outcome(e.reason());
                        tracing::warn!(reason = e.reason(), error = %e, "Connection dropped");
                    }
                }

                drop(permit);
                metrics::record_busy_workers(max_workers - permits.available_permits());
            }
            .instrument(span),
        );
    }

    /// Stop taking work and wait for every submitted connection to finish.
    ///
    /// With a deadline, returns `false` if work was still running when it
    /// expired.
    pub async fn shutdown(&self, deadline: Option<Duration>) -> bool {
        self.tracker.close();
        tracing::info!(in_flight = self.tracker.len(), "Draining worker pool");

        match deadline {
            None => {
                self.tracker.wait().await;
                true
            }
            Some(deadline) => match tokio::time::timeout(deadline, self.tracker.wait()).await {
                Ok(()) => true,
                Err(_) => {
                    tracing::warn!(
                        remaining = self.tracker.len(),
                        deadline = ?deadline,
                        "Worker drain deadline exceeded"
                    );
                    false
                }
            },
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Workers currently processing a connection.
    pub fn busy_workers(&self) -> usize {
        self.max_workers - self.permits.available_permits()
    }

    /// Submitted connections not yet finished (queued or running).
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageDocument;
    use crate::store::{Ack, DocumentStore, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncWriteExt;

    #[derive(Default)]
    struct CountingStore {
        saved: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn insert_one(&self, _document: &MessageDocument) -> Result<Ack, StoreError> {
            let id = self.saved.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Ack { id: id as i64 })
        }

        async fn close(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn pool(store: Arc<CountingStore>, max_workers: usize, read_timeout_ms: u64) -> WorkerPool {
        let config = WorkerConfig {
            max_workers,
            read_timeout_ms,
            ..WorkerConfig::default()
        };
        WorkerPool::new(&config, PersistenceWriter::new(store))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn valid_payload_is_saved() {
        let store = Arc::new(CountingStore::default());
        let pool = pool(store.clone(), 2, 1_000);

        let (mut client, server) = tokio::io::duplex(1024);
        pool.submit(server, peer());
        client
            .write_all(br#"{"username":"alice","message":"hi"}"#)
            .await
            .unwrap();
        client.shutdown().await.unwrap();

        assert!(pool.shutdown(None).await);
        assert_eq!(store.saved.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn excess_connections_queue() {
        let store = Arc::new(CountingStore::default());
        let pool = pool(store.clone(), 2, 1_000);

        let mut clients = Vec::new();
        for i in 0..6 {
            let (client, server) = tokio::io::duplex(1024);
            pool.submit(server, peer());
            clients.push((i, client));
        }
        assert_eq!(pool.in_flight(), 6);

        for (i, mut client) in clients {
            let payload = format!(r#"{{"username":"u{i}","message":"m{i}"}}"#);
            client.write_all(payload.as_bytes()).await.unwrap();
            client.shutdown().await.unwrap();
        }

        assert!(pool.shutdown(None).await);
        assert_eq!(store.saved.load(Ordering::SeqCst), 6);
        assert_eq!(pool.busy_workers(), 0);
    }

    #[tokio::test]
    async fn silent_client_times_out_without_blocking_others() {
        let store = Arc::new(CountingStore::default());
        let pool = pool(store.clone(), 2, 100);

        let (_silent, server) = tokio::io::duplex(1024);
        pool.submit(server, peer());

        let (mut client, server) = tokio::io::duplex(1024);
        pool.submit(server, peer());
        client
            .write_all(br#"{"username":"bob","message":"yo"}"#)
            .await
            .unwrap();
        client.shutdown().await.unwrap();

        let drained = pool.shutdown(Some(Duration::from_secs(2))).await;
        assert!(drained);
        assert_eq!(store.saved.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_dropped() {
        let store = Arc::new(CountingStore::default());
        let pool = pool(store.clone(), 1, 1_000);
        assert!(pool.shutdown(None).await);

        let (mut client, server) = tokio::io::duplex(1024);
        pool.submit(server, peer());
        assert_eq!(pool.in_flight(), 0);

        // Server half was dropped, so writes fail.
        let _ = client.write_all(b"late").await;
        assert_eq!(store.saved.load(Ordering::SeqCst), 0);
    }
}
