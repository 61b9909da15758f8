//! Storage implementations.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{StorageConfig, StorageType};
use crate::interfaces::LedgerStore;

pub mod memory;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub(crate) mod helpers;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod schema;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;

pub use memory::MemoryLedgerStore;

#[cfg(feature = "sqlite")]
pub use sql::sqlite::SqliteLedgerStore;

#[cfg(feature = "postgres")]
pub use sql::postgres::PostgresLedgerStore;

/// Initialize storage based on configuration.
///
/// Connects to the configured backend and applies pending migrations before
/// returning the ledger.
pub async fn init_storage(
    config: &StorageConfig,
) -> Result<Arc<dyn LedgerStore>, Box<dyn std::error::Error>> {
    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
            use std::time::Duration;

            let path = &config.sqlite.path;
            info!(path = %path, "storage: sqlite");

            if let Some(parent) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let opts = SqliteConnectOptions::new()
                .filename(path)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(config.sqlite.busy_timeout_secs))
                .create_if_missing(true);

            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(opts)
                .await?;

            sqlx::migrate!("./migrations/sqlite").run(&pool).await?;

            Ok(Arc::new(SqliteLedgerStore::new(pool)))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err("SQLite feature not enabled".into())
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            use sqlx::postgres::PgPoolOptions;

            info!(max_connections = config.postgres.max_connections, "storage: postgres");

            let pool = PgPoolOptions::new()
                .max_connections(config.postgres.max_connections)
                .connect(&config.postgres.uri)
                .await?;

            sqlx::migrate!("./migrations/postgres").run(&pool).await?;

            Ok(Arc::new(PostgresLedgerStore::new(pool)))
        }
        #[cfg(not(feature = "postgres"))]
        StorageType::Postgres => {
            error!("PostgreSQL storage requested but 'postgres' feature is not enabled");
            Err("PostgreSQL feature not enabled".into())
        }
        StorageType::Memory => {
            info!("storage: memory (state is not persisted)");
            Ok(Arc::new(MemoryLedgerStore::new()))
        }
    }
}
