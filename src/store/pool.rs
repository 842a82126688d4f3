//! Pooled document store client.
//!
//! # Responsibilities
//! - Build a bounded connection pool from [`StoreConfig`]
//! - Check liveness before the relay starts listening
//! - Append message documents to the configured collection
//! - Close the pool exactly once
//!
//! # Design Decisions
//! - Backed by SQLite through sqlx; the collection is a table created on
//!   first connect, documents are rows `(id, date, username, message)`
//! - Pool limits map one to one: max/min size, idle timeout, wait timeout,
//!   max lifetime
//! - Acquire timeouts surface as [`StoreError::PoolTimeout`]

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::validation::is_identifier;
use crate::config::StoreConfig;
use crate::message::MessageDocument;
use crate::store::{Ack, DocumentStore, StoreError};

/// Connection pool client for the document store.
#[derive(Debug)]
pub struct PoolClient {
    pool: SqlitePool,
    collection: String,
    insert_sql: String,
    wait_timeout_ms: u64,
    closed: AtomicBool,
}

impl PoolClient {
    /// Build the pool, check it, and make sure the collection exists.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        if !is_identifier(&config.collection) {
            return Err(StoreError::InvalidCollection(config.collection.clone()));
        }

        let options = SqliteConnectOptions::from_str(&config.uri)
            .map_err(|e| StoreError::InvalidUri(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_pool_size)
            .min_connections(config.min_pool_size)
            .idle_timeout(Duration::from_millis(config.max_idle_ms))
            .max_lifetime(Duration::from_millis(config.max_lifetime_ms))
            .acquire_timeout(Duration::from_millis(config.wait_timeout_ms))
            .connect_with(options)
            .await
            .map_err(StoreError::Connect)?;

        let client = Self {
            pool,
            insert_sql: format!(
                "INSERT INTO \"{}\" (date, username, message) VALUES (?, ?, ?)",
                config.collection
            ),
            collection: config.collection.clone(),
            wait_timeout_ms: config.wait_timeout_ms,
            closed: AtomicBool::new(false),
        };

        if let Err(e) = client.ping().await {
            client.pool.close().await;
            return Err(e);
        }
        if let Err(e) = client.ensure_collection().await {
            client.pool.close().await;
            return Err(e);
        }

        tracing::info!(
            collection = client.collection(),
            open_connections = client.size(),
            max_pool_size = config.max_pool_size,
            min_pool_size = config.min_pool_size,
            max_idle_ms = config.max_idle_ms,
            wait_timeout_ms = config.wait_timeout_ms,
            "Connected to document store"
        );

        Ok(client)
    }

    async fn ensure_collection(&self) -> Result<(), StoreError> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\
                id INTEGER PRIMARY KEY AUTOINCREMENT, \
                date TEXT NOT NULL, \
                username TEXT NOT NULL, \
                message TEXT NOT NULL)",
            self.collection
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(StoreError::Connect)?;
        Ok(())
    }

    fn map_write_error(&self, err: sqlx::Error) -> StoreError {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::PoolTimeout {
                waited_ms: self.wait_timeout_ms,
            },
            sqlx::Error::PoolClosed => StoreError::Closed,
            other => StoreError::Write(other),
        }
    }

    /// Collection documents are appended to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Open connections (busy and idle).
    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl DocumentStore for PoolClient {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Liveness(e.to_string()))?;
        Ok(())
    }

    async fn insert_one(&self, document: &MessageDocument) -> Result<Ack, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let result = sqlx::query(&self.insert_sql)
            .bind(document.date())
            .bind(document.username())
            .bind(document.message())
            .execute(&self.pool)
            .await
            .map_err(|e| self.map_write_error(e))?;

        Ok(Ack {
            id: result.last_insert_rowid(),
        })
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Document store already closed");
            return Ok(());
        }

        tracing::info!(open_connections = self.size(), "Closing document store pool");
        // Waits for checked-out connections to come back.
        self.pool.close().await;
        Ok(())
    }
}
