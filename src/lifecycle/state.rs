//! Relay lifecycle state machine.
//!
//! # State Transitions
//! ```text
//! Init → ConnectingBackend → Listening → Running → ShuttingDown → Stopped
//!                  │              │
//!                  └──────────────┴──→ Stopped   (startup failure)
//! ```
//!
//! # Design Decisions
//! - Transitions only move forward; `Stopped` is terminal
//! - Published through a watch channel so tests and callers can await states

use tokio::sync::watch;

/// Lifecycle phase of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Init,
    ConnectingBackend,
    Listening,
    Running,
    ShuttingDown,
    Stopped,
}

impl LifecycleState {
    /// Whether `self → next` is an allowed transition.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Init, ConnectingBackend)
                | (ConnectingBackend, Listening)
                | (ConnectingBackend, Stopped)
                | (Listening, Running)
                | (Listening, Stopped)
                | (Running, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Stopped
    }
}

/// Error for a transition the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid lifecycle transition {from:?} -> {to:?}")]
pub struct LifecycleError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

/// Owner of the current lifecycle state.
#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::Init);
        Self { tx }
    }

    pub fn current(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    /// Move to `next`, rejecting transitions that go backwards or skip ahead.
    pub fn advance(&self, next: LifecycleState) -> Result<(), LifecycleError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|state| {
            if state.can_transition_to(next) {
                tracing::debug!(from = ?*state, to = ?next, "Lifecycle transition");
                *state = next;
                true
            } else {
                result = Err(LifecycleError { from: *state, to: next });
                false
            }
        });
        result
    }

    /// Observer handle for the lifecycle state.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
