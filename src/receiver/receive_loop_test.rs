use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mockall::Sequence;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::codec::TelemetryValue;
use crate::ReceiverConfig;
use crate::TelemetryStore;

/// Mock that plays `script` once in order, then reports "no data" forever.
fn scripted_transport(script: Vec<io::Result<Vec<u8>>>) -> Arc<MockDatagramTransport> {
    let mut transport = MockDatagramTransport::new();
    let mut seq = Sequence::new();

    transport
        .expect_local_addr()
        .returning(|| Ok(SocketAddr::from(([127, 0, 0, 1], 0))));

    for step in script {
        let mut step = Some(step);
        transport
            .expect_recv_datagram()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |buf| match step.take() {
                Some(Ok(bytes)) => {
                    let len = bytes.len().min(buf.len());
                    buf[..len].copy_from_slice(&bytes[..len]);
                    Ok(len)
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::from(io::ErrorKind::WouldBlock)),
            });
    }

    transport
        .expect_recv_datagram()
        .returning(|_| Err(io::Error::from(io::ErrorKind::WouldBlock)));

    Arc::new(transport)
}

fn fast_settings() -> ReceiverConfig {
    ReceiverConfig {
        idle_backoff_ms: 5,
        error_backoff_ms: 5,
        shutdown_timeout_ms: 200,
        ..Default::default()
    }
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn spawn_loop(
    transport: Arc<MockDatagramTransport>,
    store: Arc<TelemetryStore>,
    settings: ReceiverConfig,
) -> (CancellationToken, tokio::task::JoinHandle<()>) {
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(run_receive_loop(transport, store, settings, shutdown.clone()));
    (shutdown, handle)
}

#[tokio::test]
async fn test_loop_ingests_datagrams_in_arrival_order() {
    let store = Arc::new(TelemetryStore::with_capacity(100, 10));
    let transport = scripted_transport(vec![
        Ok(b"Yaw:182.3,Alt:410.0".to_vec()),
        Ok(b"Yaw:183.0".to_vec()),
        Ok(b"garbage".to_vec()),
    ]);

    let (shutdown, handle) = spawn_loop(transport, store.clone(), fast_settings());
    wait_until(|| store.packets_ingested() == 3).await;

    assert_eq!(
        store.snapshot_history("Yaw"),
        vec![TelemetryValue::Numeric(182.3), TelemetryValue::Numeric(183.0)]
    );
    assert_eq!(store.snapshot_history("Alt"), vec![TelemetryValue::Numeric(410.0)]);
    assert_eq!(store.history_len("time"), 3);
    assert!(store.snapshot_latest().is_some_and(|p| p.is_empty()));

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_receive_error_is_logged_and_loop_continues() {
    let store = Arc::new(TelemetryStore::with_capacity(100, 10));
    let transport = scripted_transport(vec![
        Ok(b"Alt:1".to_vec()),
        Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")),
        Ok(b"Alt:2".to_vec()),
    ]);

    let (shutdown, handle) = spawn_loop(transport, store.clone(), fast_settings());
    wait_until(|| store.packets_ingested() == 2).await;

    assert_eq!(
        store.snapshot_events(),
        vec!["Error in receive loop: connection refused"]
    );
    assert_eq!(
        store.snapshot_history("Alt"),
        vec![TelemetryValue::Numeric(1.0), TelemetryValue::Numeric(2.0)]
    );

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_would_block_is_not_an_event() {
    let store = Arc::new(TelemetryStore::with_capacity(100, 10));
    let transport = scripted_transport(vec![
        Err(io::Error::from(io::ErrorKind::WouldBlock)),
        Err(io::Error::from(io::ErrorKind::WouldBlock)),
        Ok(b"Yaw:1".to_vec()),
    ]);

    let (shutdown, handle) = spawn_loop(transport, store.clone(), fast_settings());
    wait_until(|| store.packets_ingested() == 1).await;

    assert!(store.snapshot_events().is_empty());

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_loop_exits_promptly_when_cancelled_while_waiting() {
    let store = Arc::new(TelemetryStore::with_capacity(100, 10));
    let transport = scripted_transport(Vec::new());

    let (shutdown, handle) = spawn_loop(transport, store.clone(), fast_settings());
    tokio::time::sleep(Duration::from_millis(20)).await;

    shutdown.cancel();
    tokio::time::timeout(Duration::from_millis(200), handle)
        .await
        .expect("loop did not observe shutdown")
        .unwrap();

    assert!(store.snapshot_latest().is_none());
}

#[tokio::test]
async fn test_loop_exits_during_error_backoff() {
    let store = Arc::new(TelemetryStore::with_capacity(100, 10));
    let transport = scripted_transport(vec![Err(io::Error::new(
        io::ErrorKind::Other,
        "socket gone",
    ))]);
    let settings = ReceiverConfig {
        error_backoff_ms: 60_000,
        ..fast_settings()
    };

    let (shutdown, handle) = spawn_loop(transport, store.clone(), settings);
    wait_until(|| !store.snapshot_events().is_empty()).await;

    shutdown.cancel();
    tokio::time::timeout(Duration::from_millis(200), handle)
        .await
        .expect("loop stuck in backoff")
        .unwrap();
}

#[tokio::test]
async fn test_loop_strips_configured_frame_prefix() {
    let store = Arc::new(TelemetryStore::with_capacity(100, 10));
    let transport = scripted_transport(vec![Ok(b"Received: Yaw:5,Pitch:6\n".to_vec())]);
    let settings = ReceiverConfig {
        frame_prefix: Some("Received:".to_string()),
        ..fast_settings()
    };

    let (shutdown, handle) = spawn_loop(transport, store.clone(), settings);
    wait_until(|| store.packets_ingested() == 1).await;

    let latest = store.snapshot_latest().unwrap();
    assert_eq!(latest.get_f64("Yaw"), Some(5.0));
    assert_eq!(latest.get_f64("Pitch"), Some(6.0));

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_oversized_datagram_is_truncated_to_buffer() {
    let store = Arc::new(TelemetryStore::with_capacity(100, 10));
    let transport = scripted_transport(vec![Ok(b"Alt:12345,Yaw:1".to_vec())]);
    let settings = ReceiverConfig {
        recv_buffer_size: 7,
        ..fast_settings()
    };

    let (shutdown, handle) = spawn_loop(transport, store.clone(), settings);
    wait_until(|| store.packets_ingested() == 1).await;

    let latest = store.snapshot_latest().unwrap();
    assert_eq!(latest.get_f64("Alt"), Some(123.0));
    assert_eq!(latest.get("Yaw"), None);

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_metrics_count_datagrams_and_errors() {
    let received_before = crate::metrics::DATAGRAMS_RECEIVED.get();
    let errors_before = crate::metrics::RECEIVE_ERRORS.get();

    let store = Arc::new(TelemetryStore::with_capacity(100, 10));
    let transport = scripted_transport(vec![
        Ok(b"Yaw:1".to_vec()),
        Err(io::Error::new(io::ErrorKind::Other, "boom")),
        Ok(b"".to_vec()),
    ]);

    let (shutdown, handle) = spawn_loop(transport, store.clone(), fast_settings());
    wait_until(|| store.packets_ingested() == 2).await;
    shutdown.cancel();
    handle.await.unwrap();

    assert!(crate::metrics::DATAGRAMS_RECEIVED.get() >= received_before + 2);
    assert!(crate::metrics::RECEIVE_ERRORS.get() >= errors_before + 1);
}
