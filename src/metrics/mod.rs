//! Process-wide counters for the receive path.
//!
//! Counters are registered on [`REGISTRY`] and rendered in the Prometheus
//! text format by [`gather`]. Serving them over HTTP is left to the embedding
//! application.

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::error;

pub const METRICS_NAMESPACE: &str = "telemetry";

lazy_static! {
    pub static ref DATAGRAMS_RECEIVED: IntCounter = IntCounter::with_opts(Opts::new(
        "datagrams_received_total",
        "Datagrams read from the socket and ingested"
    ))
    .expect("metric can not be created");

    pub static ref BYTES_RECEIVED: IntCounter = IntCounter::with_opts(Opts::new(
        "bytes_received_total",
        "Payload bytes read from the socket"
    ))
    .expect("metric can not be created");

    pub static ref EMPTY_DATAGRAMS: IntCounter = IntCounter::with_opts(Opts::new(
        "empty_datagrams_total",
        "Datagrams that decoded to zero fields"
    ))
    .expect("metric can not be created");

    pub static ref RECEIVE_ERRORS: IntCounter = IntCounter::with_opts(Opts::new(
        "receive_errors_total",
        "Receive failures recorded in the event log"
    ))
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new_custom(Some(METRICS_NAMESPACE.to_string()), None)
            .expect("registry can be created");
        register_custom_metrics(&registry);
        registry
    };
}

pub(crate) fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(DATAGRAMS_RECEIVED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(BYTES_RECEIVED.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(EMPTY_DATAGRAMS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(RECEIVE_ERRORS.clone()))
        .expect("collector can be registered");
}

/// Renders every registered counter in the Prometheus text exposition format.
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode telemetry metrics: {}", e);
        return String::new();
    }

    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("telemetry metrics could not be from_utf8'd: {}", e);
            String::new()
        }
    }
}
