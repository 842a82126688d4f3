//! Message relay library.
//!
//! A TCP relay that accepts one JSON-encoded message per connection,
//! validates it, stamps it with the receipt time and persists it through a
//! pooled document store. Also hosts the HTTP front end that forwards form
//! submissions to the relay.

pub mod config;
pub mod front;
pub mod lifecycle;
pub mod message;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod store;
pub mod worker;

pub use config::schema::RelayConfig;
pub use lifecycle::{RelayController, RunningRelay, Shutdown};
