//! Service configuration read from environment variables.

use crate::db::pool::PoolSettings;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    /// `EnvFilter` directive for the log subscriber.
    pub log_level: String,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unset and empty variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = get("SERVER_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid port number")?;

        let database_path = get("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("pr-reviewer.db"));

        let max_connections = get("DB_MAX_CONNS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNS must be a valid number")?;
        if max_connections == 0 {
            bail!("DB_MAX_CONNS must be at least 1");
        }

        let min_connections = get("DB_MIN_CONNS")
            .unwrap_or_else(|| "1".to_string())
            .parse::<u32>()
            .context("DB_MIN_CONNS must be a valid number")?
            .min(max_connections);

        let acquire_timeout = get("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()
            .map(Duration::from_secs)
            .context("DB_ACQUIRE_TIMEOUT_SECS must be a valid number of seconds")?;

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let environment = get("APP_ENV").unwrap_or_else(|| "development".to_string());

        Ok(Config {
            port,
            database_path,
            max_connections,
            min_connections,
            acquire_timeout,
            log_level,
            environment,
        })
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            acquire_timeout: self.acquire_timeout,
        }
    }

    /// Production runs log as JSON lines.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
