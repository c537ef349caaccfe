//! Database initialization and migration runner.
//!
//! SYSTEM CONTEXT
//! ==============
//! Only used when `DATABASE_URL` is set. Startup creates the shared SQLx
//! pool and applies migrations before `PgUserStore` is handed to routes.
//! Room state is never persisted.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Initialize the `PostgreSQL` connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}
