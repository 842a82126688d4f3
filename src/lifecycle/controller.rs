//! Relay lifecycle controller.
//!
//! # Responsibilities
//! - Connect and check the document store before anything listens
//! - Bind the listener, build the worker pool, run the accept loop
//! - On shutdown: stop accepting, drain workers, close the store
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and leaves the relay `Stopped`
//! - Resources acquired before a startup failure are released before returning
//! - Teardown is best-effort; a close failure is logged and teardown continues

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;

use crate::config::{ConfigError, RelayConfig};
use crate::lifecycle::state::{Lifecycle, LifecycleState};
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::store::{DocumentStore, PersistenceWriter, PoolClient, StoreError};
use crate::worker::WorkerPool;

/// Errors that abort the relay before it starts serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("document store unavailable: {0}")]
    Backend(#[source] StoreError),
    #[error(transparent)]
    Bind(#[from] ListenerError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

impl StartupError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(_) => 1,
            StartupError::Backend(_) => 2,
            StartupError::Bind(_) => 3,
            StartupError::Signals(_) => 4,
        }
    }
}

/// What happened during teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Every in-flight worker finished before the store was closed.
    pub drained: bool,
    /// The store closed without error.
    pub store_closed: bool,
}

/// Drives the relay from `Init` to `Running`.
pub struct RelayController {
    config: RelayConfig,
    shutdown: Shutdown,
    lifecycle: Lifecycle,
}

impl RelayController {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            shutdown: Shutdown::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Handle for triggering shutdown (signal handlers, tests).
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// Connect the configured pooled store, then bind.
    pub async fn start(self) -> Result<RunningRelay, StartupError> {
        self.transition(LifecycleState::ConnectingBackend);

        let store = match PoolClient::connect(&self.config.store).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to document store");
                self.transition(LifecycleState::Stopped);
                return Err(StartupError::Backend(e));
            }
        };

        self.listen(store).await
    }

    /// Start on an already constructed store. The store is checked first.
    pub async fn start_with_store(
        self,
        store: Arc<dyn DocumentStore>,
    ) -> Result<RunningRelay, StartupError> {
        self.transition(LifecycleState::ConnectingBackend);

        if let Err(e) = store.ping().await {
            tracing::error!(error = %e, "Document store liveness check failed");
            close_store(store.as_ref()).await;
            self.transition(LifecycleState::Stopped);
            return Err(StartupError::Backend(e));
        }

        self.listen(store).await
    }

    async fn listen(self, store: Arc<dyn DocumentStore>) -> Result<RunningRelay, StartupError> {
        self.transition(LifecycleState::Listening);

        let listener = match Listener::bind(&self.config.listener).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "Failed to bind relay listener");
                close_store(store.as_ref()).await;
                self.transition(LifecycleState::Stopped);
                return Err(StartupError::Bind(e));
            }
        };

        let pool = WorkerPool::new(&self.config.workers, PersistenceWriter::new(store.clone()));

        Ok(RunningRelay {
            config: self.config,
            shutdown: self.shutdown,
            lifecycle: self.lifecycle,
            listener,
            pool,
            store,
        })
    }

    fn transition(&self, next: LifecycleState) {
        transition(&self.lifecycle, next);
    }
}

/// A bound relay ready to accept connections.
pub struct RunningRelay {
    config: RelayConfig,
    shutdown: Shutdown,
    lifecycle: Lifecycle,
    listener: Listener,
    pool: WorkerPool,
    store: Arc<dyn DocumentStore>,
}

impl RunningRelay {
    /// Address the relay listens on.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// Accept until shutdown is triggered, then drain and release resources.
    pub async fn serve(self) -> ShutdownReport {
        let RunningRelay {
            config,
            shutdown,
            lifecycle,
            listener,
            pool,
            store,
        } = self;

        transition(&lifecycle, LifecycleState::Running);
        tracing::info!(
            address = %listener.local_addr(),
            max_workers = pool.max_workers(),
            read_timeout_ms = config.workers.read_timeout_ms,
            "Relay running"
        );

        listener.serve(&pool, &shutdown).await;

        transition(&lifecycle, LifecycleState::ShuttingDown);
        let drained = pool.shutdown(config.workers.drain_timeout()).await;
        let store_closed = close_store(store.as_ref()).await;
        transition(&lifecycle, LifecycleState::Stopped);

        tracing::info!(drained, store_closed, "Relay stopped");
        ShutdownReport {
            drained,
            store_closed,
        }
    }
}

fn transition(lifecycle: &Lifecycle, next: LifecycleState) {
    if let Err(e) = lifecycle.advance(next) {
        tracing::error!(error = %e, "Lifecycle transition rejected");
    }
}

async fn close_store(store: &dyn DocumentStore) -> bool {
    match store.close().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Failed to close document store");
            false
        }
    }
}
