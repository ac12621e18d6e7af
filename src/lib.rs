//! UDP key:value telemetry ingestion.
//!
//! A background receive loop decodes `Key:Value,Key:Value` datagrams into a
//! [`TelemetryStore`] holding the latest packet, bounded per-field histories
//! aligned by receipt time, and a bounded event log. Dashboards and exporters
//! read consistent snapshots at their own pace.

pub mod analytics;
pub mod codec;
mod config;
pub mod constants;
mod errors;
pub mod metrics;
mod receiver;
pub mod store;
pub mod utils;

pub use analytics::*;
pub use codec::*;
pub use config::*;
pub use errors::*;
pub use receiver::*;
pub use store::*;
