use crate::config::DatabaseConfig;
use crate::error::DermachatError;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DermachatError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;
    Ok(pool)
}

/// One trivial round-trip, used by the liveness endpoint.
pub async fn ping(pool: &PgPool) -> Result<(), DermachatError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> Result<String, DermachatError> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

pub async fn check_pgvector(pool: &PgPool) -> Result<String, DermachatError> {
    let row: (String,) =
        sqlx::query_as("SELECT extversion FROM pg_extension WHERE extname = 'vector'")
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}
