//! Postgres persistence for procesal.
//!
//! [`PgSyncStore`] implements the [`procesal_core::store::SyncStore`]
//! contract over a `sqlx` pool; the schema lives in embedded migrations.

pub mod store;

pub use store::PgSyncStore;

use sqlx::PgPool;
use tracing::info;

/// Run the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
