//! Datagram ingestion: the background receive loop and its lifecycle.
//!
//! ## Key Responsibilities
//! - Binds the configured UDP endpoint (the only hard failure of the hub)
//! - Runs exactly one receive loop per store, decoding every datagram into it
//! - Records receive errors in the store's event log and keeps going
//! - Stops cooperatively with a bounded wait, releasing the socket regardless
//!
//! ## Example Usage
//! ```ignore
//! let config = TelemetryConfig::new()?.validate()?;
//! let hub = TelemetryHub::connect(&config).await?;
//!
//! if let Some(packet) = hub.get_latest() {
//!     println!("yaw = {:?}", packet.get_f64("Yaw"));
//! }
//! hub.close().await;
//! ```

mod hub;
mod receive_loop;
mod transport;

pub use hub::*;
pub use receive_loop::*;
pub use transport::*;

#[cfg(test)]
mod receive_loop_test;
