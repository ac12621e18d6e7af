use std::collections::HashSet;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_KNOWN_FIELDS;
use crate::constants::TIME_FIELD;
use crate::Error;
use crate::Result;

/// History and event log capacities
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Values retained per field before the oldest is evicted
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Status/error messages retained before the oldest is evicted
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,

    /// Field histories created up front, before any packet arrives
    #[serde(default = "default_known_fields")]
    pub known_fields: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            event_log_capacity: default_event_log_capacity(),
            known_fields: default_known_fields(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "store.history_capacity must be > 0".into(),
            )));
        }

        if self.event_log_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "store.event_log_capacity must be > 0".into(),
            )));
        }

        let mut seen = HashSet::with_capacity(self.known_fields.len());
        for field in &self.known_fields {
            if field.trim().is_empty() {
                return Err(Error::Config(ConfigError::Message(
                    "store.known_fields cannot contain an empty name".into(),
                )));
            }
            if field == TIME_FIELD {
                return Err(Error::Config(ConfigError::Message(format!(
                    "store.known_fields cannot contain the reserved field {TIME_FIELD}"
                ))));
            }
            if !seen.insert(field.as_str()) {
                return Err(Error::Config(ConfigError::Message(format!(
                    "store.known_fields contains duplicate field {field}"
                ))));
            }
        }

        Ok(())
    }
}

fn default_history_capacity() -> usize {
    1000
}
fn default_event_log_capacity() -> usize {
    100
}
fn default_known_fields() -> Vec<String> {
    DEFAULT_KNOWN_FIELDS.iter().map(|f| f.to_string()).collect()
}
