use super::RingBuffer;

/// Bounded log of human-readable status and error messages.
///
/// Newest entries are appended; once full, the oldest is evicted.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: RingBuffer<String>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RingBuffer::new(capacity),
        }
    }

    pub fn push(
        &mut self,
        message: String,
    ) {
        self.entries.push(message);
    }

    /// Oldest-first copy of every retained entry
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.to_vec()
    }

    /// Oldest-first copy of the newest `n` entries
    pub fn recent(
        &self,
        n: usize,
    ) -> Vec<String> {
        self.entries.tail(n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
