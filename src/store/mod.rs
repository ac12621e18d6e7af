//! In-memory telemetry state shared between the receiver loop and readers.
//!
//! ## Key Responsibilities
//! - Holds the latest [`Packet`] and one bounded [`RingBuffer`] per field
//! - Keeps the reserved `time` history aligned 1:1 with ingested packets
//! - Owns the bounded [`EventLog`] of status and error messages
//!
//! A single mutex guards all of it: one ingest or one snapshot copy is the
//! unit of mutual exclusion, so readers never see a half-applied packet.

mod event_log;
mod packet;
mod ring_buffer;
mod telemetry_store;

pub use event_log::*;
pub use packet::*;
pub use ring_buffer::*;
pub use telemetry_store::*;
