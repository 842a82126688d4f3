//! Inbound payload framing.
//!
//! One connection carries one payload; the sender half-closes when done.
//! The whole read is bounded by a deadline and a size limit. Oversized
//! payloads are rejected rather than truncated.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Error type for reading one payload.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("read timed out after {0:?}")]
    Timeout(Duration),
    #[error("payload exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("connection closed before any payload")]
    Empty,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Stable reason code for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            FrameError::Timeout(_) => "read-timeout",
            FrameError::TooLarge { .. } => "payload-too-large",
            FrameError::Empty => "empty-payload",
            FrameError::Io(_) => "read-error",
        }
    }
}

/// Read until end-of-stream, at most `limit` bytes, within `timeout`.
pub async fn read_payload<R>(reader: &mut R, limit: usize, timeout: Duration) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(limit.min(8 * 1024));
    // One extra byte tells "exactly limit" apart from "more than limit".
    let mut limited = reader.take(limit as u64 + 1);
    let result = tokio::time::timeout(timeout, limited.read_to_end(&mut buf)).await;

    match result {
        Err(_) => Err(FrameError::Timeout(timeout)),
        Ok(Err(e)) => Err(FrameError::Io(e)),
        Ok(Ok(_)) if buf.len() > limit => Err(FrameError::TooLarge { limit }),
        Ok(Ok(0)) => Err(FrameError::Empty),
        Ok(Ok(_)) => Ok(buf),
    }
}
