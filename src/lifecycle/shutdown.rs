//! Shutdown coordination for the relay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture, WaitForCancellationFutureOwned};

/// Coordinator for graceful shutdown.
///
/// Holds the relay's `running` flag. The signal path clears it once through
/// [`Shutdown::trigger`]; the accept loop reads it and waits on
/// [`Shutdown::cancelled`]. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Shutdown {
    running: Arc<AtomicBool>,
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new coordinator in the running state.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            token: CancellationToken::new(),
        }
    }

    /// Trigger the shutdown signal.
    ///
    /// Returns `true` for the call that actually stopped the relay and
    /// `false` for every later call.
    pub fn trigger(&self) -> bool {
        if self.running.swap(false, Ordering::AcqRel) {
            self.token.cancel();
            true
        } else {
            false
        }
    }

    /// Whether shutdown has not been triggered yet.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Resolves once shutdown has been triggered.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Owned variant of [`Shutdown::cancelled`] for `'static` contexts.
    pub fn cancelled_owned(&self) -> WaitForCancellationFutureOwned {
        self.token.clone().cancelled_owned()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn trigger_is_idempotent() {
        let shutdown = Shutdown::new();
        assert!(shutdown.is_running());
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(!shutdown.is_running());
    }

    #[tokio::test]
    async fn clones_observe_trigger() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();

        let waiter = tokio::spawn(async move {
            observer.cancelled().await;
            observer.is_running()
        });

        shutdown.trigger();
        let still_running = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(!still_running);
    }
}
