use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
}

impl DbConfig {
    pub fn from_config(config: &Config) -> Self {
        let max_connections = if is_in_memory(&config.database_url) {
            // every in-memory connection would otherwise open its own empty database
            1
        } else {
            config.db_max_connections.max(1)
        };

        Self {
            url: config.database_url.clone(),
            max_connections,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: config.db_busy_timeout,
        }
    }

    pub fn connect_options(&self) -> Result<SqliteConnectOptions, DbConfigError> {
        if !self.url.starts_with("sqlite:") {
            return Err(DbConfigError::UnsupportedUrl(self.url.clone()));
        }

        let options = SqliteConnectOptions::from_str(&self.url)
            .map_err(|err| DbConfigError::Invalid(err.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout);

        if is_in_memory(&self.url) {
            return Ok(options);
        }

        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal))
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("unsupported DATABASE_URL {0}, expected a sqlite: url")]
    UnsupportedUrl(String),
    #[error("invalid DATABASE_URL: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_config(url: &str) -> DbConfig {
        DbConfig {
            url: url.to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(1),
            busy_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn rejects_non_sqlite_urls() {
        let err = db_config("postgres://localhost/lms").connect_options().unwrap_err();
        assert!(matches!(err, DbConfigError::UnsupportedUrl(_)));
    }

    #[test]
    fn accepts_file_and_memory_urls() {
        assert!(db_config("sqlite://lms.db").connect_options().is_ok());
        assert!(db_config("sqlite::memory:").connect_options().is_ok());
    }
}
