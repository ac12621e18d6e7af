use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Log output of the `telemetry-hub` binary
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Directory for `telemetry-hub.log`; logs go to stdout when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Interval of the periodic status line (unit: milliseconds)
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

impl LoggingConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.status_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "logging.status_interval_ms must be > 0".into(),
            )));
        }

        if let Some(dir) = &self.log_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config(ConfigError::Message(
                    "logging.log_dir path cannot be empty".into(),
                )));
            }
        }

        Ok(())
    }
}

fn default_status_interval_ms() -> u64 {
    1000
}
