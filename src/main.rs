use std::fs;
use std::path::Path;

use telemetry_hub::constants::RECENT_EVENT_LINES;
use telemetry_hub::metrics;
use telemetry_hub::Error;
use telemetry_hub::LoggingConfig;
use telemetry_hub::MissionReport;
use telemetry_hub::Result;
use telemetry_hub::TelemetryConfig;
use telemetry_hub::TelemetryHub;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::time::interval;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

const LOG_FILE_NAME: &str = "telemetry-hub.log";

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = TelemetryConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.logging)?;

    let hub = TelemetryHub::connect(&settings).await?;
    info!("Telemetry hub started. Waiting for CTRL+C signal...");

    let mut status = interval(settings.logging.status_interval());
    status.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = graceful_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = &mut shutdown => {
                if let Err(e) = res {
                    error!("Failed to listen for shutdown signal: {:?}", e);
                }
                break;
            }
            _ = status.tick() => log_status(&hub),
        }
    }

    let outcome = hub.close().await;
    info!(?outcome, "receiver closed");

    let report = MissionReport::from_store(hub.store());
    info!("mission summary\n{}", report);
    debug!("final counters\n{}", metrics::gather());

    println!("Exiting program.");
    Ok(())
}

fn log_status(hub: &TelemetryHub) {
    let store = hub.store();
    let latest = hub
        .get_latest()
        .map(|packet| {
            packet
                .to_map()
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_else(|| "-".to_string());

    info!(
        packets = store.packets_ingested(),
        fields = store.field_names().len(),
        latest = %latest,
        "status"
    );
    for event in store.recent_events(RECENT_EVENT_LINES) {
        info!(%event, "recent event");
    }
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::Fatal(format!("Failed to install SIGINT handler: {e}")))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Fatal(format!("Failed to install SIGTERM handler: {e}")))?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutdown requested");
    Ok(())
}

pub fn init_observability(logging: &LoggingConfig) -> Result<WorkerGuard> {
    let (non_blocking, guard) = match &logging.log_dir {
        Some(log_dir) => {
            fs::create_dir_all(log_dir).map_err(|e| {
                Error::Fatal(format!(
                    "Failed to create log directory {}: {e}",
                    log_dir.display()
                ))
            })?;
            let appender = tracing_appender::rolling::never(Path::new(log_dir), LOG_FILE_NAME);
            tracing_appender::non_blocking(appender)
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(filter);
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
