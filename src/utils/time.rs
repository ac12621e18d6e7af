use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Wall-clock seconds since the Unix epoch, with sub-second precision.
///
/// Used as the `recv_time` stamp of every ingested packet. A clock set before
/// the epoch yields `0.0` instead of failing the receive path.
pub fn now_as_secs_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// return millisecond
pub(crate) fn get_now_as_u128() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
