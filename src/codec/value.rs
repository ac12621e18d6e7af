use std::fmt;

use indexmap::IndexMap;

/// Decoded fields of one datagram, in the order their keys first appeared.
pub type Fields = IndexMap<String, TelemetryValue>;

/// A single decoded telemetry value.
///
/// Numeric is preferred whenever the raw token parses as a number.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryValue {
    Numeric(f64),
    Text(String),
}

impl TelemetryValue {
    /// Parses an already trimmed raw token.
    pub fn parse(raw: &str) -> Self {
        match parse_number(raw) {
            Some(n) => TelemetryValue::Numeric(n),
            None => TelemetryValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TelemetryValue::Numeric(n) => Some(*n),
            TelemetryValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TelemetryValue::Numeric(_) => None,
            TelemetryValue::Text(s) => Some(s),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TelemetryValue::Numeric(_))
    }
}

/// Numbers keep their decimal point (`410.0`) so exported cells read back
/// as floats.
impl fmt::Display for TelemetryValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            TelemetryValue::Numeric(n) => write!(f, "{n:?}"),
            TelemetryValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for TelemetryValue {
    fn from(n: f64) -> Self {
        TelemetryValue::Numeric(n)
    }
}

impl From<&str> for TelemetryValue {
    fn from(s: &str) -> Self {
        TelemetryValue::Text(s.to_string())
    }
}

impl From<String> for TelemetryValue {
    fn from(s: String) -> Self {
        TelemetryValue::Text(s)
    }
}

/// Float parsing that also accepts digit group underscores (`1_000.5`),
/// which some flight firmware emits.
fn parse_number(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(n) = raw.parse::<f64>() {
        return Some(n);
    }
    if !raw.contains('_') {
        return None;
    }

    let bytes = raw.as_bytes();
    let well_placed = bytes.iter().enumerate().all(|(i, b)| {
        *b != b'_'
            || (i > 0
                && i + 1 < bytes.len()
                && bytes[i - 1].is_ascii_digit()
                && bytes[i + 1].is_ascii_digit())
    });
    if !well_placed {
        return None;
    }
    raw.replace('_', "").parse::<f64>().ok()
}
