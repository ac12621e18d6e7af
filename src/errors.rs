//! Telemetry Hub Error Hierarchy
//!
//! Only setup failures (configuration, transport bind) cross the hub boundary
//! as hard errors. Everything the receive path runs into afterwards is
//! absorbed, logged and recorded in the event log.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (transport, export files, background tasks)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// Datagram endpoint failures
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Snapshot export failures (CSV, analytics report)
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The configured endpoint could not be acquired
    #[error("Failed to bind UDP socket to {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Transient receive failure other than "no data available"
    #[error("Error in receive loop: {0}")]
    Receive(#[source] std::io::Error),

    /// Receiver loop did not acknowledge the stop signal in time
    #[error("Receiver loop did not stop within {0:?}")]
    ShutdownTimeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("No history recorded for field {0}")]
    UnknownField(String),
}

// ============== Conversion Implementations ============== //

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::System(SystemError::Transport(e))
    }
}

impl From<ExportError> for Error {
    fn from(e: ExportError) -> Self {
        Error::System(SystemError::Export(e))
    }
}

impl From<JoinError> for Error {
    fn from(e: JoinError) -> Self {
        Error::System(SystemError::TaskFailed(e))
    }
}
