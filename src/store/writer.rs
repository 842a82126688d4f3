//! Persistence writer.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;

use crate::message::MessageRecord;
use crate::observability::metrics;
use crate::store::DocumentStore;

/// Stamps records and appends them through the shared store.
///
/// Failures are logged and reported as `false`; nothing is retried, so a
/// failed save is lost (at-most-once delivery).
#[derive(Clone)]
pub struct PersistenceWriter {
    store: Arc<dyn DocumentStore>,
}

impl PersistenceWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist one record. Returns whether the backend acknowledged it.
    pub async fn save(&self, record: MessageRecord) -> bool {
        let started = Instant::now();
        let document = record.stamp(Local::now());

        match self.store.insert_one(&document).await {
            Ok(ack) => {
                metrics::record_save(true, started);
                tracing::info!(
                    id = ack.id,
                    date = %document.date(),
                    username = %document.username(),
                    "Message saved"
                );
                true
            }
            Err(e) => {
                metrics::record_save(false, started);
                tracing::error!(
                    error = %e,
                    username = %document.username(),
                    "Failed to save message"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{parse, MessageDocument};
    use crate::store::{Ack, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubStore {
        fail: bool,
        saved: Mutex<Vec<MessageDocument>>,
    }

    #[async_trait]
    impl DocumentStore for StubStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn insert_one(&self, document: &MessageDocument) -> Result<Ack, StoreError> {
            if self.fail {
                return Err(StoreError::PoolTimeout { waited_ms: 1 });
            }
            let mut saved = self.saved.lock().unwrap();
            saved.push(document.clone());
            Ok(Ack { id: saved.len() as i64 })
        }

        async fn close(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn stamps_at_save_time() {
        let store = Arc::new(StubStore::default());
        let writer = PersistenceWriter::new(store.clone());
        let record = parse(br#"{"username":"alice","message":"hi"}"#).unwrap();

        let before = Local::now();
        assert!(writer.save(record).await);

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].username(), "alice");
        assert_eq!(saved[0].message(), "hi");
        assert!(saved[0].received_at() >= before);
    }

    #[tokio::test]
    async fn failure_becomes_false() {
        let store = Arc::new(StubStore {
            fail: true,
            ..StubStore::default()
        });
        let writer = PersistenceWriter::new(store.clone());
        let record = parse(br#"{"username":"alice","message":"hi"}"#).unwrap();

        assert!(!writer.save(record).await);
        assert!(store.saved.lock().unwrap().is_empty());
    }
}
