pub mod config;
pub mod migrate;
pub mod operations;

use std::time::{Duration, Instant};

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;

use crate::db::config::{DbConfig, DbConfigError};
use crate::db::migrate::MigrationError;

#[derive(Clone)]
pub struct DatabaseProxy {
    config: DbConfig,
    pool: SqlitePool,
}

impl DatabaseProxy {
    pub async fn connect(config: DbConfig) -> Result<Self, DbInitError> {
        let options = config.connect_options()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        tracing::info!(
            url = %config.url,
            max_connections = config.max_connections,
            "database pool ready"
        );

        Ok(Self { config, pool })
    }

    /// Connects and brings the schema up to date.
    pub async fn connect_and_migrate(config: DbConfig) -> Result<Self, DbInitError> {
        let proxy = Self::connect(config).await?;
        migrate::run_migrations(&proxy.pool).await?;
        Ok(proxy)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn ping(&self, timeout: Duration) -> DbHealth {
        let started = Instant::now();
        let result =
            tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(&self.pool)).await;

        match result {
            Ok(Ok(_)) => DbHealth::Connected {
                latency_ms: started.elapsed().as_millis() as u64,
            },
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "database health check failed");
                DbHealth::Disconnected
            }
            Err(_) => DbHealth::Timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbHealth {
    Connected { latency_ms: u64 },
    Timeout,
    Disconnected,
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
}
