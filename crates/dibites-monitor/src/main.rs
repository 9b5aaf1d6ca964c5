//! Autosave monitor for Dibites simulations.
//!
//! Watches the simulation's autosave folder and folds every new snapshot
//! archive into per-simulation Parquet tables (species catalog, population
//! counts, zone pellets) under the data root.
//!
//! # Loop
//!
//! ```text
//! list archives --> skip ledgered --> extract --> merge + write tables
//!       ^                                              |
//!       +---- sleep poll interval <-- persist ledger <-+
//! ```
//!
//! Passes run on the blocking thread pool. Ctrl-C stops the loop between
//! passes; a pass in progress always runs to completion.

mod config;
mod discovery;
mod error;
mod poller;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::MonitorError;
use crate::poller::Poller;

/// Application entry point.
///
/// Loads configuration, initializes logging, then runs passes until
/// Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the ledger cannot be
/// loaded, or a pass task panics.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, source) = config::load().map_err(MonitorError::from)?;

    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    info!("dibites-monitor starting");
    match &source {
        Some(path) => info!(config = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    let settings = config.settings();
    info!(
        autosave_dir = %settings.autosave_dir.display(),
        data_dir = %settings.data_dir.display(),
        poll_interval_secs = settings.poll_interval.as_secs(),
        archive_extension = settings.archive_extension,
        "Ingest settings resolved"
    );

    run(Poller::new(settings)?).await?;

    info!("dibites-monitor shutdown complete");
    Ok(())
}

/// Run passes until Ctrl-C.
async fn run(mut poller: Poller) -> Result<(), MonitorError> {
    let (stop_tx, mut stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested, finishing current pass");
        let _ = stop_tx.send(true);
    });

    let interval = poller.settings().poll_interval;
    loop {
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = poller.run_pass();
            (poller, result)
        })
        .await?;
        poller = returned;

        match result {
            Ok(report) => info!(
                discovered = report.discovered,
                skipped = report.skipped,
                ingested = report.ingested,
                discarded = report.discarded,
                failed = report.failed,
                marked = report.marked(),
                species_added = report.species_added,
                count_rows = report.count_rows,
                pellet_rows = report.pellet_rows,
                "Pass complete"
            ),
            Err(e) => error!(error = %e, "Pass failed, retrying after poll interval"),
        }

        if *stop_rx.borrow() {
            break;
        }
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            _ = stop_rx.changed() => break,
        }
    }

    info!(processed = poller.ledger().len(), "Poll loop stopped");
    Ok(())
}
