use std::sync::Arc;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::Config;
use crate::store::{PgBackend, Stm};

/// Connects to PostgreSQL, applies migrations and returns a retry runner over
/// the database configured with the config's retry policy
pub async fn connect(config: &Config) -> anyhow::Result<Stm> {
    config.validate()?;

    let pool = create_pool(config).await?;
    tracing::info!("Database connection pool created");

    run_migrations(&pool).await?;

    let backend = Arc::new(PgBackend::new(pool));
    Ok(Stm::new(backend).with_policy(config.retry_policy()))
}

pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // One table holds every collection; the revision guards optimistic commits
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_entries (
            collection VARCHAR(64) NOT NULL,
            key VARCHAR(255) NOT NULL,
            value JSONB NOT NULL,
            revision BIGINT NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (collection, key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_kv_entries_updated_at ON kv_entries(collection, updated_at DESC)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
