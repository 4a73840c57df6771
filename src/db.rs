use anyhow::Context;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

static MIGRATOR: Migrator = sqlx::migrate!();

/// Builds a connection pool against the database at [db_url]. Connections are established
/// lazily, so this only fails if the URL itself can't be understood.
pub fn connect_sqlx(db_url: &str) -> Result<PgPool, anyhow::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy(db_url)
        .context("building the database connection pool")
}

/// Creates or updates the `user` and `todo` tables
pub async fn migrate(pool: &PgPool) -> Result<(), anyhow::Error> {
    MIGRATOR
        .run(pool)
        .await
        .context("running database migrations")?;

    Ok(())
}
