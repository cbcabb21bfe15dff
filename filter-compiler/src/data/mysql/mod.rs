//! MySQL database service
//!
//! Owns the connection pool shared by the field catalog and the
//! reservation queries. Schema management belongs to the platform's
//! migration tooling, not to this crate.

pub mod repositories;
mod repository_impl;

pub use repository_impl::MysqlFieldCatalog;
pub use sqlx::MySqlPool;

use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

use crate::core::config::MysqlConfig;
use crate::core::constants::{
    MYSQL_DEFAULT_ACQUIRE_TIMEOUT_SECS, MYSQL_DEFAULT_IDLE_TIMEOUT_SECS,
    MYSQL_DEFAULT_MAX_CONNECTIONS, MYSQL_DEFAULT_MIN_CONNECTIONS,
};
use crate::data::error::DataError;

/// MySQL database service
///
/// Should be created once per process and shared; handlers borrow the pool.
pub struct MysqlService {
    pool: MySqlPool,
}

impl MysqlService {
    /// Initialize the connection pool from configuration
    ///
    /// Zero values in the config fall back to the crate defaults.
    pub async fn init(config: &MysqlConfig) -> Result<Self, DataError> {
        let url = config.url.as_str();
        if url.is_empty() {
            return Err(DataError::Config("MySQL URL is required".into()));
        }

        let max_connections = if config.max_connections > 0 {
            config.max_connections
        } else {
            MYSQL_DEFAULT_MAX_CONNECTIONS
        };

        let min_connections = if config.min_connections > 0 {
            config.min_connections
        } else {
            MYSQL_DEFAULT_MIN_CONNECTIONS
        };

        let acquire_timeout = if config.acquire_timeout_secs > 0 {
            config.acquire_timeout_secs
        } else {
            MYSQL_DEFAULT_ACQUIRE_TIMEOUT_SECS
        };

        let idle_timeout = if config.idle_timeout_secs > 0 {
            config.idle_timeout_secs
        } else {
            MYSQL_DEFAULT_IDLE_TIMEOUT_SECS
        };

        let options: MySqlConnectOptions = url
            .parse()
            .map_err(|e| DataError::Config(format!("Invalid MySQL URL: {}", e)))?;

        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout))
            .idle_timeout(Duration::from_secs(idle_timeout))
            .connect_with(options)
            .await
            .map_err(|e| DataError::backend_unavailable("mysql", e.to_string()))?;

        tracing::debug!(
            max_connections,
            min_connections,
            acquire_timeout_secs = acquire_timeout,
            idle_timeout_secs = idle_timeout,
            "MysqlService initialized"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("MySQL pool closed");
    }
}
