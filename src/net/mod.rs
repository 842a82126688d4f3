//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, SO_REUSEADDR, backlog)
//!     → connection.rs (connection id for tracing)
//!     → Hand off to worker pool
//!     → frame.rs (read-until-close, bounded by size and deadline)
//! ```
//!
//! # Design Decisions
//! - The accept loop never waits on a worker
//! - Accept errors after shutdown are expected and not logged as errors
//! - One payload per connection, terminated by the sender's half-close

pub mod connection;
pub mod frame;
pub mod listener;

pub use connection::ConnectionId;
pub use frame::{read_payload, FrameError};
pub use listener::{Listener, ListenerError};
