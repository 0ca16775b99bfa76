pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod tracing;

pub use config::{DbConfig, Environment};
pub use error::{StoreError, StoreResult};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DbConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    ::tracing::info!(
        max_connections = config.db_max_connections,
        "Database pool created"
    );

    Ok(pool)
}

/// Install tracing for `config.app_env`, then create the pool.
///
/// For processes with no subscriber of their own. An already-installed
/// subscriber is kept.
pub async fn connect(config: &DbConfig) -> anyhow::Result<PgPool> {
    crate::tracing::init_tracing(config.app_env);
    create_pool(config).await
}
