use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::DatagramTransport;
use crate::codec::decode_framed;
use crate::metrics;
use crate::utils::time::now_as_secs_f64;
use crate::ReceiverConfig;
use crate::TelemetryStore;
use crate::TransportError;

/// Receives, decodes and ingests datagrams until `shutdown` is cancelled.
///
/// - No data within `idle_backoff`: the wait ends and the loop retries.
/// - Datagram: decoded (never fails) and ingested with the current time.
/// - Any other receive error: recorded in the event log, then the loop
///   pauses for `error_backoff` and continues. Errors never end the loop.
///
/// Cancellation is observed at every wait, so the loop exits within one
/// backoff interval of the signal. The store lock is only taken for the
/// ingest itself, never while waiting on the socket.
pub async fn run_receive_loop<T: DatagramTransport>(
    transport: Arc<T>,
    store: Arc<TelemetryStore>,
    settings: ReceiverConfig,
    shutdown: CancellationToken,
) {
    let mut buf = vec![0u8; settings.recv_buffer_size];
    let idle_backoff = settings.idle_backoff();
    let error_backoff = settings.error_backoff();
    let frame_prefix = settings.frame_prefix().map(str::to_owned);

    debug!(
        local_addr = ?transport.local_addr().ok(),
        buffer = buf.len(),
        "receive loop started"
    );

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let received = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            res = timeout(idle_backoff, transport.recv_datagram(&mut buf)) => res,
        };

        match received {
            // Nothing arrived within the idle window
            Err(_elapsed) => continue,

            Ok(Ok(len)) => {
                let recv_time = now_as_secs_f64();
                let fields = decode_framed(&buf[..len], frame_prefix.as_deref());

                metrics::DATAGRAMS_RECEIVED.inc();
                metrics::BYTES_RECEIVED.inc_by(len as u64);
                if fields.is_empty() {
                    metrics::EMPTY_DATAGRAMS.inc();
                    trace!(len, "datagram decoded to no fields");
                }

                store.ingest(fields, recv_time);
            }

            Ok(Err(e)) if e.kind() == io::ErrorKind::WouldBlock => {
                if !pause(&shutdown, idle_backoff).await {
                    break;
                }
            }

            Ok(Err(e)) => {
                let err = TransportError::Receive(e);
                warn!(error = %err, "receive failed; retrying after backoff");
                metrics::RECEIVE_ERRORS.inc();
                store.add_event(err.to_string());

                if !pause(&shutdown, error_backoff).await {
                    break;
                }
            }
        }
    }

    debug!("receive loop stopped");
}

/// Sleeps for `duration`; returns `false` when interrupted by shutdown.
async fn pause(
    shutdown: &CancellationToken,
    duration: Duration,
) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = sleep(duration) => true,
    }
}
