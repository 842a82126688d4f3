//! Relay client used by the front end.
//!
//! One submission is one short-lived connection: connect, write the JSON
//! envelope, half-close, drop.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::message::encode;

/// Error type for relay submissions.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to connect to relay at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("timed out connecting to relay at {address} after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },
    #[error("failed to send payload: {0}")]
    Write(#[source] std::io::Error),
}

/// Client for the relay's TCP endpoint.
#[derive(Debug, Clone)]
pub struct RelayClient {
    address: String,
    connect_timeout: Duration,
}

impl RelayClient {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one record. Returns once the payload is written and the write
    /// side is closed; the relay does not acknowledge.
    pub async fn send(&self, username: &str, message: &str) -> Result<(), RelayError> {
        let payload = encode(username, message)?;

        let connect = TcpStream::connect(self.address.as_str());
        let mut stream = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(RelayError::Connect {
                    address: self.address.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(RelayError::ConnectTimeout {
                    address: self.address.clone(),
                    timeout: self.connect_timeout,
                })
            }
        };

        stream.write_all(&payload).await.map_err(RelayError::Write)?;
        stream.shutdown().await.map_err(RelayError::Write)?;

        tracing::debug!(relay = %self.address, bytes = payload.len(), "Submission relayed");
        Ok(())
    }
}
