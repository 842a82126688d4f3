//! TCP listener and accept loop.
//!
//! # Responsibilities
//! - Bind to the configured address with `SO_REUSEADDR` and a fixed backlog
//! - Accept incoming TCP connections and hand them to the worker pool
//! - Tell expected accept failures (shutdown) from anomalous ones
//! - Close the listening socket when the loop exits

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::config::ListenerConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;
use crate::worker::WorkerPool;

const ACCEPT_BACKOFF_BASE_MS: u64 = 10;
const ACCEPT_BACKOFF_MAX_MS: u64 = 1_000;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Address did not resolve to anything bindable.
    #[error("Failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// The relay's listening endpoint.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Resolve, bind and listen.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let address = config.bind_address();
        let addr = tokio::net::lookup_host(&address)
            .await
            .map_err(|source| ListenerError::Resolve {
                address: address.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| ListenerError::Resolve {
                address: address.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
            })?;

        let bind_err = |source: std::io::Error| ListenerError::Bind { address: addr, source };

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_err)?;
        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(addr).map_err(bind_err)?;
        let inner = socket.listen(config.backlog).map_err(bind_err)?;
        let local_addr = inner.local_addr().map_err(bind_err)?;

        tracing::info!(
            address = %local_addr,
            backlog = config.backlog,
            "Listener bound"
        );

        Ok(Self { inner, local_addr })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until shutdown, submitting each to `pool`.
    ///
    /// Consumes the listener; the socket is closed when this returns.
    pub async fn serve(self, pool: &WorkerPool, shutdown: &Shutdown) {
        let mut backoff = Backoff::new(ACCEPT_BACKOFF_BASE_MS, ACCEPT_BACKOFF_MAX_MS);

        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = self.inner.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    backoff.reset();
                    if !shutdown.is_running() {
                        tracing::debug!(peer_addr = %peer, "Dropping connection accepted during shutdown");
                        break;
                    }
                    metrics::record_connection_accepted();
                    dispatch(pool, stream, peer);
                }
                Err(e) => {
                    if !shutdown.is_running() {
                        tracing::debug!(error = %e, "Accept interrupted by shutdown");
                        break;
                    }

                    metrics::record_accept_error();
                    let delay = backoff.next_delay();
                    tracing::error!(
                        error = %e,
                        consecutive_errors = backoff.failures(),
                        delay = ?delay,
                        "Accept failed"
                    );

                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        tracing::info!(address = %self.local_addr, "Listener closed");
    }
}

fn dispatch(pool: &WorkerPool, stream: TcpStream, peer: SocketAddr) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(peer_addr = %peer, error = %e, "Failed to set TCP_NODELAY");
    }
    pool.submit(stream, peer);
}
