//! Document store subsystem.
//!
//! # Data Flow
//! ```text
//! worker
//!     → writer.rs (stamp record, save → bool, never retries)
//!     → DocumentStore::insert_one
//!     → pool.rs (bounded sqlx pool, wait-queue timeout)
//!     → backend
//! ```
//!
//! # Design Decisions
//! - The pool client is the only resource shared between workers
//! - Liveness check runs right after the pool is built; failure is fatal
//! - `close()` is idempotent so every teardown path may call it

pub mod pool;
pub mod writer;

use async_trait::async_trait;

use crate::message::MessageDocument;

pub use pool::PoolClient;
pub use writer::PersistenceWriter;

/// Acknowledgment of one stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Backend-assigned document id.
    pub id: i64,
}

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid store uri: {0}")]
    InvalidUri(String),
    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),
    #[error("failed to connect: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("liveness check failed: {0}")]
    Liveness(String),
    #[error("no pooled connection available after {waited_ms} ms")]
    PoolTimeout { waited_ms: u64 },
    #[error("store is closed")]
    Closed,
    #[error("write failed: {0}")]
    Write(#[source] sqlx::Error),
    #[error("close failed: {0}")]
    Close(String),
}

/// Insert-only view of the document store shared by all workers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cheap round trip proving the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Append one document.
    async fn insert_one(&self, document: &MessageDocument) -> Result<Ack, StoreError>;

    /// Release backend resources. Calling it again is a no-op.
    async fn close(&self) -> Result<(), StoreError>;
}
