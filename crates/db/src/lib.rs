//! Persistence layer for paired draw sessions.
//!
//! - [`SessionStore`] — the conditional mutation contract the engine uses.
//! - [`MemorySessionStore`] — default store; no database required.
//! - [`PgSessionStore`] — PostgreSQL store; selected when `DATABASE_URL`
//!   is configured.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod store;

pub use store::{MemorySessionStore, PgSessionStore, SessionStore, StoreError};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database answers queries.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply any pending migrations from `crates/db/migrations/`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
