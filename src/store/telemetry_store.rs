use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;
use tracing::trace;

use super::EventLog;
use super::Packet;
use super::RingBuffer;
use crate::codec::Fields;
use crate::codec::TelemetryValue;
use crate::constants::TIME_FIELD;
use crate::StoreConfig;

/// Point-in-time copy of every field history, in store order.
pub type HistorySnapshot = IndexMap<String, Vec<TelemetryValue>>;

/// Latest packet, per-field histories and event log of one ingestion session.
///
/// The store is created once and shared by reference (`Arc<TelemetryStore>`)
/// with the receiver loop and every reader. [`reset`](Self::reset) empties it
/// in place, so readers can keep the same handle across sessions.
///
/// # Thread Safety
///
/// Every method takes the same mutex for the duration of one ingest or one
/// snapshot copy. No I/O happens while it is held.
#[derive(Debug)]
pub struct TelemetryStore {
    state: Mutex<StoreState>,
    history_capacity: usize,
}

#[derive(Debug)]
struct StoreState {
    latest: Option<Arc<Packet>>,
    histories: IndexMap<String, RingBuffer<TelemetryValue>>,
    events: EventLog,
    ingested: u64,
}

impl TelemetryStore {
    /// Builds a store with the `time` history and every configured known
    /// field pre-created empty.
    pub fn new(config: &StoreConfig) -> Self {
        let mut histories = IndexMap::with_capacity(config.known_fields.len() + 1);
        histories.insert(TIME_FIELD.to_string(), RingBuffer::new(config.history_capacity));
        for field in &config.known_fields {
            histories
                .entry(field.clone())
                .or_insert_with(|| RingBuffer::new(config.history_capacity));
        }

        Self {
            state: Mutex::new(StoreState {
                latest: None,
                histories,
                events: EventLog::new(config.event_log_capacity),
                ingested: 0,
            }),
            history_capacity: config.history_capacity.max(1),
        }
    }

    /// Store without pre-created field histories (only `time`).
    ///
    /// Capacities are not validated here: a zero history or event log
    /// capacity is raised to one, keeping only the newest entry. Go through
    /// [`StoreConfig::validate`] to reject zero instead.
    pub fn with_capacity(
        history_capacity: usize,
        event_log_capacity: usize,
    ) -> Self {
        Self::new(&StoreConfig {
            history_capacity,
            event_log_capacity,
            known_fields: Vec::new(),
        })
    }

    /// Records one decoded packet.
    ///
    /// Replaces `latest`, appends every field value to its history (creating
    /// it on first sight) and appends `recv_time` to the `time` history, all
    /// under one lock acquisition.
    ///
    /// A decoded field named `time` is kept in the packet but not appended to
    /// the reserved `time` history, which grows by exactly one entry per call.
    pub fn ingest(
        &self,
        fields: Fields,
        recv_time: f64,
    ) {
        let packet = Arc::new(Packet::new(fields, recv_time));
        let capacity = self.history_capacity;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        for (key, value) in packet.fields() {
            if key == TIME_FIELD {
                trace!("decoded field shadows reserved time history; not appended");
                continue;
            }
            match state.histories.get_mut(key.as_str()) {
                Some(history) => {
                    history.push(value.clone());
                }
                None => {
                    debug!(field = %key, "new telemetry field");
                    let mut history = RingBuffer::new(capacity);
                    history.push(value.clone());
                    state.histories.insert(key.clone(), history);
                }
            }
        }
        state
            .histories
            .entry(TIME_FIELD.to_string())
            .or_insert_with(|| RingBuffer::new(capacity))
            .push(TelemetryValue::Numeric(recv_time));
        state.latest = Some(packet);
        state.ingested += 1;
    }

    /// Most recent packet, or `None` before the first ingest.
    pub fn snapshot_latest(&self) -> Option<Arc<Packet>> {
        self.state.lock().latest.clone()
    }

    /// Oldest-first copy of the named history; empty for unknown fields.
    pub fn snapshot_history(
        &self,
        field: &str,
    ) -> Vec<TelemetryValue> {
        self.state
            .lock()
            .histories
            .get(field)
            .map(RingBuffer::to_vec)
            .unwrap_or_default()
    }

    /// Copies every history under a single lock acquisition, so the rows of
    /// different fields line up with the same `time` entries.
    pub fn snapshot_all(&self) -> HistorySnapshot {
        self.state
            .lock()
            .histories
            .iter()
            .map(|(field, history)| (field.clone(), history.to_vec()))
            .collect()
    }

    /// Copies the named histories under a single lock acquisition.
    pub fn snapshot_fields(
        &self,
        fields: &[&str],
    ) -> HistorySnapshot {
        let state = self.state.lock();
        fields
            .iter()
            .map(|field| {
                let values = state
                    .histories
                    .get(*field)
                    .map(RingBuffer::to_vec)
                    .unwrap_or_default();
                (field.to_string(), values)
            })
            .collect()
    }

    /// Oldest-first copy of the event log
    pub fn snapshot_events(&self) -> Vec<String> {
        self.state.lock().events.snapshot()
    }

    /// Newest `n` events, oldest-first
    pub fn recent_events(
        &self,
        n: usize,
    ) -> Vec<String> {
        self.state.lock().events.recent(n)
    }

    /// Appends a message to the event log, evicting the oldest when full.
    pub fn add_event(
        &self,
        message: impl Into<String>,
    ) {
        let message = message.into();
        trace!(%message, "event recorded");
        self.state.lock().events.push(message);
    }

    /// Clears `latest`, every history and the event log in place.
    ///
    /// Field names stay registered with empty histories. Does not touch the
    /// receiver loop.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.latest = None;
        for history in state.histories.values_mut() {
            history.clear();
        }
        state.events.clear();
        state.ingested = 0;
        debug!("telemetry store reset");
    }

    /// Registered field names in creation order (`time` first).
    pub fn field_names(&self) -> Vec<String> {
        self.state.lock().histories.keys().cloned().collect()
    }

    pub fn history_len(
        &self,
        field: &str,
    ) -> usize {
        self.state
            .lock()
            .histories
            .get(field)
            .map(RingBuffer::len)
            .unwrap_or(0)
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Packets ingested since construction or the last reset
    pub fn packets_ingested(&self) -> u64 {
        self.state.lock().ingested
    }

    /// Holds the store lock until the returned guard drops, stalling ingest.
    #[cfg(test)]
    pub(crate) fn block_writers(&self) -> impl Sized + '_ {
        self.state.lock()
    }

    // Dashboard-facing names for the same operations

    pub fn get_latest(&self) -> Option<Arc<Packet>> {
        self.snapshot_latest()
    }

    pub fn get_history(
        &self,
        field: &str,
    ) -> Vec<TelemetryValue> {
        self.snapshot_history(field)
    }

    pub fn get_events(&self) -> Vec<String> {
        self.snapshot_events()
    }
}
