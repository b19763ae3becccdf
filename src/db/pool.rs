//! SQLite connection pool with WAL mode.
//!
//! Provides a thread-safe connection pool for SQLite with Write-Ahead Logging (WAL)
//! enabled for concurrent read access during writes. Foreign keys are switched on
//! so the schema constraints are enforced for every connection.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<Sqlite>;

/// Sizing and timeout knobs for the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Create a new connection pool with WAL mode enabled.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
/// * `settings` - Pool sizing
///
/// # Returns
/// A connection pool ready for use
pub async fn create_pool(db_path: &Path, settings: &PoolSettings) -> Result<DbPool, sqlx::Error> {
    let db_url = format!("sqlite:{}", db_path.display());

    let connect_options = SqliteConnectOptions::from_str(&db_url)?
        // Create the database file if it doesn't exist
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        // Uniqueness and references are enforced by the store, not by callers
        .foreign_keys(true)
        // Concurrent writers wait instead of failing immediately
        .busy_timeout(Duration::from_secs(30))
        .pragma("wal_autocheckpoint", "1000");

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(connect_options)
        .await?;

    // Verify WAL mode is enabled
    let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await?;

    debug_assert!(
        mode.0.to_lowercase() == "wal",
        "WAL mode should be enabled, got: {}",
        mode.0
    );

    Ok(pool)
}
