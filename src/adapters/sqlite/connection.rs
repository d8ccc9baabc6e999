//! Connection pool for the ledger database.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::DatabaseConfig;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Unsupported database location {0}: expected sqlite:<path> or sqlite::memory:")]
    InvalidDatabaseUrl(String),
    #[error("Cannot create database directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open database pool: {0}")]
    PoolCreationFailed(#[source] sqlx::Error),
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Accepts `sqlite:<path>`, `sqlite://<path>` and `sqlite::memory:`; query strings are ignored.
    pub fn parse(database_url: &str) -> Result<Self, ConnectionError> {
        let invalid = || ConnectionError::InvalidDatabaseUrl(database_url.to_string());
        let rest = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .ok_or_else(invalid)?;

        match rest.split('?').next().unwrap_or(rest) {
            "" => Err(invalid()),
            ":memory:" => Ok(Self::Memory),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

/// Pool sizing and lock waits.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// How long a statement waits on a locked database
    pub busy_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            ..Self::default()
        }
    }
}

pub async fn create_pool(database_url: &str, config: Option<PoolConfig>) -> Result<SqlitePool, ConnectionError> {
    let location = DatabaseLocation::parse(database_url)?;
    open_pool(&location, &config.unwrap_or_default()).await
}

/// Open a pool for `location`. File databases run in WAL mode and are created on first use.
pub async fn open_pool(location: &DatabaseLocation, config: &PoolConfig) -> Result<SqlitePool, ConnectionError> {
    let (connect_options, pool_options) = match location {
        DatabaseLocation::Memory => {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(ConnectionError::PoolCreationFailed)?;
            // Every in-memory connection is a separate database: keep exactly one alive.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
            (options, pool)
        }
        DatabaseLocation::File(path) => {
            create_parent_dir(path)?;
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
            let pool = SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(1);
            (options, pool)
        }
    };

    pool_options
        .acquire_timeout(config.acquire_timeout)
        .connect_with(connect_options.foreign_keys(true).busy_timeout(config.busy_timeout))
        .await
        .map_err(ConnectionError::PoolCreationFailed)
}

/// Isolated in-memory pool.
pub async fn create_test_pool() -> Result<SqlitePool, ConnectionError> {
    open_pool(&DatabaseLocation::Memory, &PoolConfig::default()).await
}

fn create_parent_dir(path: &Path) -> Result<(), ConnectionError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|source| ConnectionError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
