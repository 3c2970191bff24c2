use std::time::Duration;

use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

pub type DbPool = PgPool;

#[derive(Debug, Error)]
pub enum DbPoolError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migrate error: {0}")]
    Migrate(#[from] MigrateError),
}

/// Builds the pool without opening a connection; the first query connects.
pub fn connect_lazy(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<DbPool, DbPoolError> {
    debug!(max_connections, ?acquire_timeout, "configuring postgres pool");
    Ok(PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(acquire_timeout)
        .connect_lazy(database_url)?)
}
