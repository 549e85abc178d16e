//! SQLite database service
//!
//! Owns the reading store: connection pool, schema, and WAL maintenance.
//! Tuned for one writer with concurrent readers:
//! - WAL mode so queries never block on an in-flight insert
//! - Bounded busy and acquire timeouts so operations fail fast
//! - Periodic WAL checkpointing

pub mod error;
mod migrations;
pub mod repositories;
mod repository_impl;
pub mod schema;

pub use error::SqliteError;
pub use sqlx::SqlitePool;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sqlx::ConnectOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::log::LevelFilter;

use crate::core::constants::{
    SQLITE_ACQUIRE_TIMEOUT_SECS, SQLITE_BUSY_TIMEOUT_SECS, SQLITE_CACHE_SIZE,
    SQLITE_CHECKPOINT_INTERVAL_SECS, SQLITE_MAX_CONNECTIONS, SQLITE_WAL_AUTOCHECKPOINT,
};
use crate::utils::file::ensure_parent_dir;

/// SQLite database service
///
/// Created once at startup and shared as `Arc<SqliteService>`.
pub struct SqliteService {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteService {
    /// Open (or create) the database file and bring the schema up
    pub async fn init(db_path: &Path) -> Result<Self, SqliteError> {
        ensure_parent_dir(db_path).await?;

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))
            .pragma("cache_size", SQLITE_CACHE_SIZE)
            .pragma("temp_store", "MEMORY")
            .pragma("wal_autocheckpoint", SQLITE_WAL_AUTOCHECKPOINT)
            .log_statements(LevelFilter::Trace);

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(SQLITE_ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;

        tracing::debug!(path = %db_path.display(), "SqliteService initialized");
        Ok(Self {
            pool,
            path: db_path.to_path_buf(),
        })
    }

    /// Single-connection in-memory store with the schema applied
    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self, SqliteError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        migrations::run_migrations(&pool).await?;
        Ok(Self {
            pool,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn checkpoint(&self) -> Result<(), SqliteError> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        tracing::debug!("WAL checkpoint completed");
        Ok(())
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }

    pub fn start_checkpoint_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let db = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(SQLITE_CHECKPOINT_INTERVAL_SECS));
            // First tick fires immediately; nothing to checkpoint yet
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("WAL checkpoint task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        if let Err(e) = db.checkpoint().await {
                            tracing::warn!(error = %e, "WAL checkpoint failed");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::traits::ReadingRepository;
    use crate::data::types::NewReading;

    #[tokio::test]
    async fn test_init_creates_file_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sensorhub.db");

        let service = SqliteService::init(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(service.path(), path.as_path());
        let id = service
            .insert(&NewReading::new(19.5, 60.0, 0.3))
            .await
            .unwrap();
        service.checkpoint().await.unwrap();
        service.close().await;

        let reopened = SqliteService::init(&path).await.unwrap();
        let latest = reopened.latest().await.unwrap().unwrap();
        assert_eq!(latest.id, id);
        assert_eq!(latest.temperature, Some(19.5));
        reopened.close().await;
    }

    #[tokio::test]
    async fn test_checkpoint_task_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(
            SqliteService::init(&dir.path().join("sensorhub.db"))
                .await
                .unwrap(),
        );
        let (tx, rx) = watch::channel(false);
        let handle = service.start_checkpoint_task(rx);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        service.close().await;
    }
}
