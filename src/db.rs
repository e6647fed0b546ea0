//! Database module
//!
//! Pool construction, schema bootstrap and classification of store errors.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool};
use std::str::FromStr;

use crate::config::Config;
use crate::domain::DomainError;

/// Schema applied by `apply_schema`; every statement is idempotent
pub const SCHEMA_SQL: &str = include_str!("../migrations/0001_schema.sql");

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const QUERY_CANCELED: &str = "57014";
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Build the connection pool.
///
/// Every connection carries a `statement_timeout`, so no store call can block
/// a request indefinitely.
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.database_url)?
        .options([("statement_timeout", config.statement_timeout_setting())]);

    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await
}

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Apply the bundled schema.
///
/// Runs over the simple query protocol so the multi-statement file (including
/// the trigger body) executes in one round trip.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(SCHEMA_SQL).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let required_tables = vec![
        "api_keys",
        "users",
        "categories",
        "games",
        "game_images",
        "cart_items",
        "purchases",
        "wishlist_items",
        "reviews",
    ];

    for table in required_tables {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// Unique constraint rejected an insert
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

/// Referenced row (user, game, category) does not exist
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

/// Statement timeout, lock timeout, or no pooled connection in time
pub fn is_timeout(err: &sqlx::Error) -> bool {
    if matches!(err, sqlx::Error::PoolTimedOut) {
        return true;
    }
    matches!(
        sqlstate(err).as_deref(),
        Some(QUERY_CANCELED) | Some(LOCK_NOT_AVAILABLE)
    )
}

/// Collapse a store failure inside a multi-row write into the domain taxonomy.
///
/// The store text is logged here and never reaches the caller.
pub fn transaction_error(operation: &'static str, err: sqlx::Error) -> DomainError {
    if is_timeout(&err) {
        tracing::warn!(operation, error = %err, "Store timeout, transaction rolled back");
        return DomainError::Timeout;
    }
    tracing::error!(operation, error = ?err, "Transaction rolled back");
    DomainError::TransactionFailed
}
