//! Message model and validation.
//!
//! # Data Flow
//! ```text
//! raw bytes (one framed payload)
//!     → validate.rs (JSON envelope → MessageRecord | ValidationError)
//!     → record.rs (MessageRecord → MessageDocument, stamped at write time)
//!     → store::PersistenceWriter
//! ```

pub mod record;
pub mod validate;

pub use record::{MessageDocument, MessageRecord, DATE_FORMAT};
pub use validate::{encode, parse, ValidationError};
