mod config;
mod runner;

use anyhow::{Context, Result};
use relay_nats::NatsClient;
use relay_worker::{RelayWorker, RelayWorkerConfig};
use runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let config = match config::ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting relay-all-in-one service");
    info!("Configuration: {:?}", config);

    let startup_timeout = Duration::from_secs(config.startup_timeout_secs);
    let worker = match tokio::time::timeout(startup_timeout, setup(&config)).await {
        Ok(Ok(worker)) => worker,
        Ok(Err(e)) => {
            error!("Startup failed: {:#}", e);
            std::process::exit(1);
        }
        Err(_) => {
            error!(timeout = ?startup_timeout, "Startup timed out");
            std::process::exit(1);
        }
    };

    let mut runner = Runner::new().with_closer(|| async move {
        info!("Relay shut down, NATS connection closing");
        Ok(())
    });
    for process in worker.into_runner_processes() {
        runner = runner.with_process(process);
    }

    runner.run().await;
}

/// Connect to NATS, provision both substrate streams, wire the relay stages.
async fn setup(config: &config::ServiceConfig) -> Result<RelayWorker> {
    let nats_client = NatsClient::connect(
        &config.nats_url,
        Duration::from_secs(config.connect_timeout_secs),
    )
    .await
    .context("NATS connection failed")?;

    nats_client
        .ensure_log_stream(&config.log_stream)
        .await
        .context("Failed to provision event log stream")?;
    nats_client
        .ensure_queue_stream(
            &config.queue_stream,
            Duration::from_secs(config.queue_duplicate_window_secs),
        )
        .await
        .context("Failed to provision work queue stream")?;

    RelayWorker::new(
        Arc::new(nats_client),
        RelayWorkerConfig {
            log_stream: config.log_stream.clone(),
            queue_stream: config.queue_stream.clone(),
            queue_group: config.queue_group.clone(),
            ingest_subject: config.ingest_subject.clone(),
            partition_key: config.partition_key.clone(),
            partition_by_event_type: config.partition_by_event_type,
            dedup_by_timestamp: config.dedup_by_timestamp,
            batch_size: config.batch_size,
            batch_wait_secs: config.batch_wait_secs,
        },
    )
    .await
    .context("Failed to initialize relay worker")
}
