use std::net::SocketAddr;
use std::time::Duration;

use telemetry_hub::ReceiverConfig;
use telemetry_hub::TelemetryConfig;
use telemetry_hub::TelemetryStore;
use tokio::net::UdpSocket;

/// Hub configuration bound to an ephemeral localhost port with short timings
pub fn test_config() -> TelemetryConfig {
    TelemetryConfig {
        receiver: ReceiverConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 0,
            idle_backoff_ms: 5,
            error_backoff_ms: 5,
            shutdown_timeout_ms: 500,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub async fn send_datagram(
    target: SocketAddr,
    payload: &[u8],
) {
    let sender = UdpSocket::bind("127.0.0.1:0").await.expect("bind sender");
    sender.send_to(payload, target).await.expect("send datagram");
}

pub async fn wait_for_packets(
    store: &TelemetryStore,
    count: u64,
) {
    tokio::time::timeout(Duration::from_secs(3), async {
        while store.packets_ingested() < count {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("datagrams not ingested in time");
}
