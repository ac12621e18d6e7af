// -
// Store layout

/// Reserved history holding the receipt time of every ingested packet
pub const TIME_FIELD: &str = "time";

/// Key under which the receipt time appears in a flattened packet
pub const RECV_TIME_KEY: &str = "recv_time";

/// Fields consumed by the dashboard panels; their histories exist before any data arrives
pub const DEFAULT_KNOWN_FIELDS: [&str; 10] =
    ["Yaw", "Pitch", "Roll", "Alt", "Lat", "Lon", "P", "T", "Accel", "Gyro"];

// -
// Wire format

pub(crate) const FIELD_SEPARATOR: char = ',';
pub(crate) const KEY_VALUE_SEPARATOR: char = ':';

/// Largest payload a single UDP datagram can carry
pub(crate) const MAX_DATAGRAM_SIZE: usize = 65_535;

// -
// Analytics

/// Minimum numeric samples before a field summary is reported
pub(crate) const MIN_SUMMARY_SAMPLES: usize = 4;

/// Samples covered by the "recent" average (about 10s at 2Hz)
pub const RECENT_WINDOW: usize = 20;

/// Event log lines shown by status consumers
pub const RECENT_EVENT_LINES: usize = 6;
