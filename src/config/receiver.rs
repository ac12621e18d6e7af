use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::MAX_DATAGRAM_SIZE;
use crate::Error;
use crate::Result;

/// Datagram endpoint and receive loop timing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReceiverConfig {
    /// Local interface to bind
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Local UDP port (0 picks an ephemeral port)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Receive buffer in bytes; longer datagrams are truncated by the OS
    #[serde(default = "default_recv_buffer_size")]
    pub recv_buffer_size: usize,

    /// Wait applied when no datagram is available (unit: milliseconds)
    #[serde(default = "default_idle_backoff_ms")]
    pub idle_backoff_ms: u64,

    /// Pause after a receive error before the next attempt (unit: milliseconds)
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,

    /// Upper bound `stop()` waits for the loop before releasing the socket
    /// anyway (unit: milliseconds)
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Framing prefix removed before decoding, e.g. `Received:`
    #[serde(default)]
    pub frame_prefix: Option<String>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            recv_buffer_size: default_recv_buffer_size(),
            idle_backoff_ms: default_idle_backoff_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            frame_prefix: None,
        }
    }
}

impl ReceiverConfig {
    /// `host:port` string handed to the socket bind call
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Non-empty framing prefix, if configured
    pub fn frame_prefix(&self) -> Option<&str> {
        self.frame_prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// Validates receiver settings
    /// # Errors
    /// Returns `Error::Config` when:
    /// - Bind address is empty
    /// - Receive buffer is 0 or exceeds a UDP datagram
    /// - Any backoff or timeout is 0
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "receiver.bind_address cannot be empty".into(),
            )));
        }

        if self.recv_buffer_size == 0 || self.recv_buffer_size > MAX_DATAGRAM_SIZE {
            return Err(Error::Config(ConfigError::Message(format!(
                "receiver.recv_buffer_size {} must be within 1..={}",
                self.recv_buffer_size, MAX_DATAGRAM_SIZE
            ))));
        }

        for (name, value) in [
            ("idle_backoff_ms", self.idle_backoff_ms),
            ("error_backoff_ms", self.error_backoff_ms),
            ("shutdown_timeout_ms", self.shutdown_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(ConfigError::Message(format!(
                    "receiver.{name} must be > 0"
                ))));
            }
        }

        Ok(())
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5005
}
fn default_recv_buffer_size() -> usize {
    4096
}
fn default_idle_backoff_ms() -> u64 {
    10
}
fn default_error_backoff_ms() -> u64 {
    100
}
fn default_shutdown_timeout_ms() -> u64 {
    1000
}
