//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Running database migrations automatically
//! - Seeding the bootstrap admin account

use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each one runs only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}

/// Insert the bootstrap admin if no admin with this email exists yet.
///
/// Admins have no signup endpoint; this is how the first one gets in.
pub async fn seed_admin(pool: &DbPool, email: &str, name: &str) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO admins (name, email)
        VALUES ($1, $2)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(email.trim().to_lowercase())
    .execute(pool)
    .await?
    .rows_affected();

    Ok(inserted > 0)
}

/// Forget revoked tokens that have expired on their own.
pub async fn prune_revoked_tokens(pool: &DbPool) -> Result<u64, sqlx::Error> {
    let pruned = sqlx::query("DELETE FROM expired_tokens WHERE expires_at < NOW()")
        .execute(pool)
        .await?
        .rows_affected();

    Ok(pruned)
}
