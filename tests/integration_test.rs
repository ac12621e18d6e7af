mod common;

use std::time::Duration;
use std::time::Instant;

use common::send_datagram;
use common::test_config;
use common::wait_for_packets;
use telemetry_hub::export_csv;
use telemetry_hub::Error;
use telemetry_hub::MissionReport;
use telemetry_hub::ReceiverState;
use telemetry_hub::StopOutcome;
use telemetry_hub::SystemError;
use telemetry_hub::TelemetryHub;
use telemetry_hub::TelemetryValue;
use telemetry_hub::TransportError;
use tokio::net::UdpSocket;

#[tokio::test]
async fn test_two_datagram_scenario_over_udp() {
    let hub = TelemetryHub::from_config(&test_config());
    let addr = hub.start().await.unwrap();

    send_datagram(addr, b"Yaw:182.3,Alt:410.0").await;
    wait_for_packets(hub.store(), 1).await;
    send_datagram(addr, b"Yaw:183.0").await;
    wait_for_packets(hub.store(), 2).await;

    let latest = hub.get_latest().unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest.get("Yaw"), Some(&TelemetryValue::Numeric(183.0)));
    assert!(latest.get("Alt").is_none());
    assert!(latest.recv_time() > 0.0);

    assert_eq!(
        hub.get_history("Yaw"),
        vec![TelemetryValue::Numeric(182.3), TelemetryValue::Numeric(183.0)]
    );
    assert_eq!(hub.get_history("Alt"), vec![TelemetryValue::Numeric(410.0)]);

    let times = hub.get_history("time");
    assert_eq!(times.len(), 2);
    assert!(times[0].as_f64() <= times[1].as_f64());

    assert_eq!(hub.close().await, StopOutcome::Clean);
}

#[tokio::test]
async fn test_malformed_and_mixed_datagrams_are_ingested() {
    let hub = TelemetryHub::from_config(&test_config());
    let addr = hub.start().await.unwrap();

    send_datagram(addr, b"garbage").await;
    wait_for_packets(hub.store(), 1).await;
    send_datagram(addr, b"Label:armed , Alt: 12 ,,bad").await;
    wait_for_packets(hub.store(), 2).await;
    send_datagram(addr, b"Alt:\xff13").await;
    wait_for_packets(hub.store(), 3).await;

    assert_eq!(hub.get_history("time").len(), 3);
    assert_eq!(hub.get_history("Label"), vec![TelemetryValue::from("armed")]);
    assert_eq!(
        hub.get_history("Alt"),
        vec![TelemetryValue::Numeric(12.0), TelemetryValue::Numeric(13.0)]
    );
    assert!(hub.get_events().is_empty());

    hub.close().await;
}

#[tokio::test]
async fn test_stop_while_idle_returns_within_timeout() {
    let hub = TelemetryHub::from_config(&test_config());
    hub.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let started = Instant::now();
    let outcome = hub.stop().await;

    assert_eq!(outcome, StopOutcome::Clean);
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(hub.state(), ReceiverState::Stopped);
}

#[tokio::test]
async fn test_bind_failure_surfaces_from_connect() {
    let occupied = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut config = test_config();
    config.receiver.port = occupied.local_addr().unwrap().port();

    let err = TelemetryHub::connect(&config).await.unwrap_err();
    assert!(matches!(
        err,
        Error::System(SystemError::Transport(TransportError::BindFailed { .. }))
    ));
}

#[tokio::test]
async fn test_session_export_and_report_after_stop() {
    let hub = TelemetryHub::from_config(&test_config());
    let addr = hub.start().await.unwrap();

    for alt in 1..=4 {
        send_datagram(addr, format!("Alt:{alt}").as_bytes()).await;
        wait_for_packets(hub.store(), alt).await;
    }
    hub.stop().await;

    let report = MissionReport::from_store(hub.store());
    assert_eq!(
        report.render(),
        "Altitude: min=1.00, max=4.00, avg=2.50, avg(10s)=2.50\nTotal Samples: 4\n"
    );

    let mut out = Vec::new();
    let rows = export_csv(hub.store(), &mut out).unwrap();
    assert_eq!(rows, 4);
    let csv = String::from_utf8(out).unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("time,Yaw,Pitch,Roll,Alt"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_see_aligned_histories() {
    let hub = std::sync::Arc::new(TelemetryHub::from_config(&test_config()));
    let addr = hub.start().await.unwrap();
    let total = 50u64;

    let readers = (0..4).map(|_| {
        let hub = hub.clone();
        tokio::spawn(async move {
            let mut checks = 0;
            while hub.store().packets_ingested() < total {
                let all = hub.store().snapshot_all();
                assert_eq!(all["time"].len(), all["Yaw"].len());
                assert_eq!(all["Pitch"].len(), all["Yaw"].len());
                checks += 1;
                tokio::task::yield_now().await;
            }
            checks
        })
    });
    let readers = futures::future::join_all(readers);

    let writer = async {
        for i in 0..total {
            send_datagram(addr, format!("Yaw:{i},Pitch:{i}").as_bytes()).await;
            wait_for_packets(hub.store(), i + 1).await;
        }
    };

    let (results, ()) = tokio::join!(readers, writer);
    for result in results {
        assert!(result.unwrap() > 0);
    }
    assert_eq!(hub.get_history("Yaw").len(), total as usize);

    hub.close().await;
}
