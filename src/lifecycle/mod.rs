//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (controller.rs):
//!     Connect store → Liveness check → Bind listener → Build worker pool
//!
//! Shutdown (shutdown.rs, controller.rs):
//!     Trigger → Stop accepting → Drain workers → Close store
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger (once)
//!
//! State (state.rs):
//!     Init → ConnectingBackend → Listening → Running → ShuttingDown → Stopped
//! ```
//!
//! # Design Decisions
//! - Ordered startup: backend first, then the listener
//! - Ordered shutdown: stop accept, drain, close
//! - Drain waits for in-flight work unless a deadline is configured

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use controller::{RelayController, RunningRelay, ShutdownReport, StartupError};
pub use shutdown::Shutdown;
pub use signals::{SignalListener, TerminationSignal};
pub use state::{Lifecycle, LifecycleState};
