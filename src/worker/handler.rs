//! Per-connection processing: read → validate → persist → close.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::message::{parse, ValidationError};
use crate::net::{read_payload, FrameError};
use crate::store::PersistenceWriter;

/// Everything a worker needs besides the connection itself.
pub(crate) struct WorkerContext {
    pub writer: PersistenceWriter,
    pub read_timeout: Duration,
    pub max_payload_bytes: usize,
}

/// Why one connection produced no stored document.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Read(#[from] FrameError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("message was not persisted")]
    Persist,
}

impl ConnectionError {
    /// Stable reason code for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ConnectionError::Read(e) => e.reason(),
            ConnectionError::Invalid(e) => e.reason(),
            ConnectionError::Persist => "persist-failed",
        }
    }
}

/// Drive one connection to completion. The stream is always shut down and
/// dropped before this returns.
pub(crate) async fn handle_connection<S>(mut stream: S, ctx: &WorkerContext) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let result = process(&mut stream, ctx).await;

    if let Err(e) = stream.shutdown().await {
        tracing::debug!(error = %e, "Error closing client connection");
    }
    drop(stream);

    result
}

async fn process<S>(stream: &mut S, ctx: &WorkerContext) -> Result<(), ConnectionError>
where
    S: AsyncRead + Unpin,
{
    let payload = read_payload(stream, ctx.max_payload_bytes, ctx.read_timeout).await?;
    tracing::debug!(bytes = payload.len(), "Payload received");

    let record = parse(&payload)?;

    if ctx.writer.save(record).await {
        Ok(())
    } else {
        Err(ConnectionError::Persist)
    }
}
