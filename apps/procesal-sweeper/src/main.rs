//! Procesal sweeper worker
//!
//! Long-running background process that mirrors judicial processes from
//! country court APIs into the local store. Runs one sweep per schedule
//! tick, sequentially over all eligible cases.

mod config;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use config::Config;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing::{error, info};

use procesal_core::store::SyncStore;
use procesal_db::store::PgSyncStore;
use procesal_provider::registry::ProviderRegistry;
use procesal_provider_colombia::{ColombiaConfig, ColombiaProvider};
use procesal_sync::{SweepConfig, Sweeper};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        schedule = %config.schedule,
        pause_ms = config.pause_between_cases.as_millis() as u64,
        "Starting procesal sweeper"
    );

    let pool = match PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            info!("Database connection established");
            pool
        }
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = procesal_db::run_migrations(&pool).await {
        eprintln!("Failed to run database migrations: {e}");
        std::process::exit(1);
    }

    let registry = Arc::new(ProviderRegistry::new());
    let mut colombia_config = ColombiaConfig::default();
    if let Some(base_url) = config.rama_base_url.clone() {
        colombia_config.base_url = base_url;
    }
    match ColombiaProvider::new(colombia_config) {
        Ok(provider) => {
            registry
                .register(["CO", "Colombia"], Arc::new(provider))
                .await;
        }
        Err(e) => {
            eprintln!("Failed to build Colombia provider: {e}");
            std::process::exit(1);
        }
    }
    info!(
        jurisdictions = ?registry.jurisdictions().await,
        "Court providers registered"
    );

    let store: Arc<dyn SyncStore> = Arc::new(PgSyncStore::new(pool));
    let sweeper = Sweeper::new(
        registry,
        store,
        SweepConfig {
            pause_between_cases: config.pause_between_cases,
        },
    );

    if config.sweep_on_startup {
        run_one_sweep(&sweeper).await;
    }

    loop {
        let now = Utc::now();
        let next = config.schedule.next_run_after(now);
        let wait = (next - now)
            .to_std()
            .unwrap_or_else(|_| Duration::from_secs(0));
        info!(next_run = %next, "Waiting for next sweep");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                run_one_sweep(&sweeper).await;
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received, exiting");
                break;
            }
        }
    }
}

async fn run_one_sweep(sweeper: &Sweeper) {
    match sweeper.run_sweep().await {
        Ok(summary) => {
            info!(
                total = summary.total,
                synced = summary.synced,
                skipped = summary.skipped,
                not_indexed = summary.not_indexed,
                failed = summary.failed,
                imported = summary.imported,
                updated = summary.updated,
                "Sweep completed"
            );
        }
        // Only a failure to list eligible cases surfaces here; per-case
        // failures are absorbed into the summary.
        Err(e) => {
            error!(error = %e, "Sweep aborted");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
