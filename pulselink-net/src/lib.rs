//! Transport boundary for pulselink.
//!
//! This crate defines what the engine needs from a message transport — the
//! outbound message types it constructs, the [`Transport`] trait it consumes,
//! and bind-event plumbing — plus an in-process [`MemoryTransport`] used by
//! integration tests and demos. Connection lifecycle, per-endpoint
//! addressing, framing and port selection are transport concerns and live
//! behind the trait.

pub mod memory;
pub mod protocol;
pub mod transport;

pub use memory::{MemoryTransport, SendOutcome, SendRecord};
pub use protocol::{BindEvent, OutboundMessage};
pub use transport::{listing_contains, Transport};
