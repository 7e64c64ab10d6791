#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, SimConfig};
use core::time::Duration;
use std::sync::Arc;
use telemetry::init_tracing;
use tokio::signal;
use wicket::{Office, Report, TracingObserver};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = SimConfig::try_from(args)?;

    init_tracing(config.log_format);
    log_startup_info(&config);

    let office = Office::new(config.office.clone(), Arc::new(TracingObserver));
    let running = office.open()?;

    closing_time(config.office.service_window).await;
    running.close()?;

    // Joining blocks on OS threads; keep it off the async workers.
    let report = tokio::task::spawn_blocking(move || running.join()).await??;
    log_report(&report);

    tracing::info!("Simulation finished");
    Ok(())
}

/// Resolves when the service window has elapsed or a termination signal
/// arrives, whichever is first.
async fn closing_time(window: Duration) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Ctrl+C handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = tokio::time::sleep(window) => {
            tracing::info!("Service window of {window:?} elapsed");
        },
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, closing early");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal, closing early");
        },
    }
}

fn log_startup_info(config: &SimConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Opening the office with full config: {:#?}", config.office);
    } else {
        tracing::info!(
            "Opening the office for {:?} with {} senders",
            config.office.service_window,
            config.office.producer_count
        );
    }
}

fn log_report(report: &Report) {
    for (id, exit) in &report.exits {
        match exit.error() {
            None => tracing::debug!("Sender {id}: {exit:?}"),
            Some(e) => tracing::debug!("Sender {id}: {exit:?} ({e})"),
        }
    }

    tracing::info!(
        recorded = report.recorded(),
        processed = report.processed.len(),
        senders = report.exits.len(),
        "Day summary"
    );

    if !report.is_drained() {
        tracing::error!("Postal worker left admitted parcels unprocessed");
    }
}
