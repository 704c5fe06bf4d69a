use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds and owns the Postgres connection pool
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool using the configured URL or the discrete DB_* settings
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!(
            "Created database pool for {}:{}/{}",
            config.host, config.port, config.name
        );
        Ok(pool)
    }

    fn build_connection_string(config: &DatabaseConfig) -> Result<String, DatabaseError> {
        if let Some(url) = &config.url {
            url::Url::parse(url).map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string()))?;
            return Ok(url.clone());
        }

        let mut url = url::Url::parse("postgres://localhost")
            .map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string()))?;
        url.set_host(Some(&config.host))
            .map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string()))?;
        url.set_port(Some(config.port))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl("cannot set port".to_string()))?;
        url.set_username(&config.user)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl("cannot set user".to_string()))?;
        url.set_password(Some(&config.password))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl("cannot set password".to_string()))?;
        url.set_path(&format!("/{}", config.name));
        Ok(url.into())
    }
}
