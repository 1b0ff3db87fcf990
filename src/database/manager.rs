use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::config;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Single-database pool manager. The parish runs one tenant; the pool is
/// created lazily on first use and cached for the process lifetime.
pub struct DatabaseManager;

impl DatabaseManager {
    fn cell() -> &'static Mutex<Option<PgPool>> {
        static POOL: OnceLock<Mutex<Option<PgPool>>> = OnceLock::new();
        POOL.get_or_init(|| Mutex::new(None))
    }

    /// Get the shared pool, creating it on first call
    pub async fn pool() -> Result<PgPool, DatabaseError> {
        let cell = Self::cell();
        let mut guard = cell.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let db_config = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.connection_timeout_secs))
            .connect(&url)
            .await?;

        info!("Created database pool");
        *guard = Some(pool.clone());
        Ok(pool)
    }

    /// Apply embedded migrations at startup
    pub async fn run_migrations() -> Result<(), DatabaseError> {
        let pool = Self::pool().await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close() {
        let cell = Self::cell();
        let mut guard = cell.lock().await;
        if let Some(pool) = guard.take() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
