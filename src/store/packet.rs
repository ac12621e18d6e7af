use crate::codec::Fields;
use crate::codec::TelemetryValue;
use crate::constants::RECV_TIME_KEY;

/// One fully decoded telemetry sample plus its receipt time.
///
/// Immutable once built; the store hands it out behind an `Arc`, so a reader
/// keeps a stable view no matter what the receiver ingests afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    recv_time: f64,
    fields: Fields,
}

impl Packet {
    pub fn new(
        fields: Fields,
        recv_time: f64,
    ) -> Self {
        Self { recv_time, fields }
    }

    /// Seconds since the Unix epoch at which the datagram was received
    pub fn recv_time(&self) -> f64 {
        self.recv_time
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&TelemetryValue> {
        self.fields.get(key)
    }

    pub fn get_f64(
        &self,
        key: &str,
    ) -> Option<f64> {
        self.get(key).and_then(TelemetryValue::as_f64)
    }

    /// Number of decoded fields, not counting `recv_time`
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flattened view: `recv_time` first, then the decoded fields.
    ///
    /// A datagram field named `recv_time` overrides the receipt stamp here,
    /// as it does for dashboard consumers reading the flat mapping.
    pub fn to_map(&self) -> Fields {
        let mut map = Fields::with_capacity(self.fields.len() + 1);
        map.insert(RECV_TIME_KEY.to_string(), TelemetryValue::Numeric(self.recv_time));
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}
