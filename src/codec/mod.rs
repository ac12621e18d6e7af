//! Wire decoding for inbound telemetry datagrams.
//!
//! A datagram carries one line of text made of comma separated `key:value`
//! tokens:
//!
//! ```text
//! Yaw:182.3,Pitch:-3,Roll:0.5,Alt:410.0,Label:stage1
//! ```
//!
//! Decoding never fails. Tokens without a `:` are skipped, values that do not
//! parse as a number are kept as text and invalid UTF-8 sequences are dropped.

mod decoder;
mod value;

pub use decoder::*;
pub use value::*;
