//! Application state exchanged with the companion computer
//!
//! Records are postcard-serialized into message bodies. The [`States`]
//! aggregate holds the latest value of each record.

pub mod aggregate;
pub mod records;
pub mod segment;

pub use aggregate::States;
pub use records::*;
pub use segment::{MessageType, StateSegment};
