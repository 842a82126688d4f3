//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! Browser
//!     → server.rs (static pages, POST /message form)
//!     → relay.rs (one TCP connection per submission)
//!     → relay listener
//! ```
//!
//! # Design Decisions
//! - Runs as its own process; the only link to the relay is the TCP payload
//! - Fire-and-forget: the relay sends no acknowledgment

pub mod relay;
pub mod server;

pub use relay::{RelayClient, RelayError};
pub use server::{FrontError, FrontServer};
