use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::bind_udp;
use super::run_receive_loop;
use super::SocketLease;
use crate::codec::TelemetryValue;
use crate::utils::time::get_now_as_u128;
use crate::Packet;
use crate::ReceiverConfig;
use crate::Result;
use crate::TelemetryConfig;
use crate::TelemetryStore;
use crate::TransportError;

/// Lifecycle of the receive loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Stopped,
    Running,
    Stopping,
}

/// How a `stop()` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running
    NotRunning,
    /// The loop acknowledged the stop signal within the timeout
    Clean,
    /// The loop did not exit in time; it was aborted and the socket released anyway
    TimedOut,
}

struct ReceiverWorker {
    /// Sole strong owner of the socket; the loop only holds a [`SocketLease`]
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

enum WorkerSlot {
    Stopped,
    Running(ReceiverWorker),
    Stopping,
}

impl WorkerSlot {
    fn state(&self) -> ReceiverState {
        match self {
            WorkerSlot::Stopped => ReceiverState::Stopped,
            WorkerSlot::Running(_) => ReceiverState::Running,
            WorkerSlot::Stopping => ReceiverState::Stopping,
        }
    }
}

/// Owns the receive loop of one [`TelemetryStore`] and the collaborator
/// surface dashboards poll.
///
/// Readers (UI timers, exporters) call the `get_*` methods or go through
/// [`store()`](Self::store) on their own schedule; the loop is the only
/// writer. At most one loop runs per hub.
pub struct TelemetryHub {
    store: Arc<TelemetryStore>,
    settings: ReceiverConfig,
    /// Serializes `start`/`stop`, which await while binding or draining
    lifecycle: Mutex<()>,
    /// Worker and state change together under this lock
    slot: parking_lot::Mutex<WorkerSlot>,
}

impl std::fmt::Debug for TelemetryHub {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TelemetryHub")
            .field("endpoint", &self.settings.endpoint())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl TelemetryHub {
    /// Creates a stopped hub around an existing store.
    pub fn new(
        settings: ReceiverConfig,
        store: Arc<TelemetryStore>,
    ) -> Self {
        Self {
            store,
            settings,
            lifecycle: Mutex::new(()),
            slot: parking_lot::Mutex::new(WorkerSlot::Stopped),
        }
    }

    /// Creates a stopped hub with a fresh store built from `config.store`.
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(
            config.receiver.clone(),
            Arc::new(TelemetryStore::new(&config.store)),
        )
    }

    /// Builds the hub and starts receiving; a bind failure is returned here.
    pub async fn connect(config: &TelemetryConfig) -> Result<Self> {
        let hub = Self::from_config(config);
        hub.start().await?;
        Ok(hub)
    }

    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    pub fn settings(&self) -> &ReceiverConfig {
        &self.settings
    }

    pub fn state(&self) -> ReceiverState {
        self.slot.lock().state()
    }

    /// Address the socket is bound to while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.slot.lock() {
            WorkerSlot::Running(worker) => Some(worker.local_addr),
            _ => None,
        }
    }

    /// Binds the endpoint and spawns the receive loop.
    ///
    /// Calling `start()` while running is a no-op returning the bound address.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// [`TransportError::BindFailed`] when the endpoint cannot be acquired; the
    /// hub stays stopped.
    pub async fn start(&self) -> Result<SocketAddr> {
        let _lifecycle = self.lifecycle.lock().await;

        // Already running
        if let Some(local_addr) = self.local_addr() {
            debug!(%local_addr, "receiver already running");
            return Ok(local_addr);
        }

        let endpoint = self.settings.endpoint();
        let socket = bind_udp(&endpoint).await?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| TransportError::BindFailed {
                address: endpoint.clone(),
                source,
            })?;

        let socket = Arc::new(socket);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_receive_loop(
            Arc::new(SocketLease::new(&socket)),
            self.store.clone(),
            self.settings.clone(),
            shutdown.clone(),
        ));

        *self.slot.lock() = WorkerSlot::Running(ReceiverWorker {
            socket,
            local_addr,
            shutdown,
            handle,
        });

        info!(%local_addr, "telemetry receiver started");
        Ok(local_addr)
    }

    /// Signals the loop and waits up to `shutdown_timeout` for it to exit.
    ///
    /// The socket is closed before returning in both outcomes: the hub holds
    /// the only strong reference, and a loop that ignores the signal is
    /// aborted. The store keeps its last contents; snapshots keep working.
    pub async fn stop(&self) -> StopOutcome {
        let _lifecycle = self.lifecycle.lock().await;

        let worker = {
            let mut slot = self.slot.lock();
            match std::mem::replace(&mut *slot, WorkerSlot::Stopping) {
                WorkerSlot::Running(worker) => worker,
                other => {
                    *slot = other;
                    return StopOutcome::NotRunning;
                }
            }
        };
        let ReceiverWorker {
            socket,
            local_addr,
            shutdown,
            handle,
        } = worker;

        let started = get_now_as_u128();
        let outcome = await_worker_exit(handle, &shutdown, self.settings.shutdown_timeout()).await;

        drop(socket);
        *self.slot.lock() = WorkerSlot::Stopped;

        let elapsed_ms = get_now_as_u128().saturating_sub(started) as u64;
        info!(%local_addr, ?outcome, elapsed_ms, "telemetry receiver stopped; socket released");
        outcome
    }

    /// Same as [`stop`](Self::stop); the name dashboards call on exit.
    pub async fn close(&self) -> StopOutcome {
        self.stop().await
    }

    /// Clears the store in place; the receive loop keeps running.
    pub fn reset(&self) {
        self.store.reset();
    }

    pub fn get_latest(&self) -> Option<Arc<Packet>> {
        self.store.snapshot_latest()
    }

    pub fn get_history(
        &self,
        field: &str,
    ) -> Vec<TelemetryValue> {
        self.store.snapshot_history(field)
    }

    pub fn get_events(&self) -> Vec<String> {
        self.store.snapshot_events()
    }

    /// Appends to the event log with the same eviction rule as receive errors
    pub fn add_event(
        &self,
        message: impl Into<String>,
    ) {
        self.store.add_event(message);
    }
}

impl Drop for TelemetryHub {
    fn drop(&mut self) {
        if let WorkerSlot::Running(worker) =
            std::mem::replace(self.slot.get_mut(), WorkerSlot::Stopped)
        {
            worker.shutdown.cancel();
            worker.handle.abort();
            debug!(local_addr = %worker.local_addr, "receiver aborted on drop");
        }
    }
}

/// Cancels `shutdown` and waits up to `limit` for `handle` to finish.
///
/// A task that does not finish in time is aborted; the timeout is logged,
/// never escalated.
pub(crate) async fn await_worker_exit(
    mut handle: JoinHandle<()>,
    shutdown: &CancellationToken,
    limit: Duration,
) -> StopOutcome {
    shutdown.cancel();

    match timeout(limit, &mut handle).await {
        Ok(Ok(())) => StopOutcome::Clean,
        Ok(Err(e)) => {
            warn!(error = %e, "receive loop ended abnormally");
            StopOutcome::Clean
        }
        Err(_) => {
            let err = TransportError::ShutdownTimeout(limit);
            warn!(error = %err, "aborting receive loop and releasing socket anyway");
            handle.abort();
            StopOutcome::TimedOut
        }
    }
}
