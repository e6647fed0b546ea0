//! Ownership and membership checks
//!
//! Each check takes any Postgres executor, so it can run against the pool
//! or inside an open transaction that already holds the relevant locks.

use sqlx::PgExecutor;

use crate::domain::DomainError;

/// Identifiers are positive; anything else is rejected before touching the store
pub fn ensure_valid_id(id: i64, field: &str) -> Result<(), DomainError> {
    if id <= 0 {
        return Err(DomainError::invalid_input(format!(
            "{} must be a positive integer",
            field
        )));
    }
    Ok(())
}

pub async fn game_exists<'e, E>(executor: E, game_id: i64) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM games WHERE id = $1)")
        .bind(game_id)
        .fetch_one(executor)
        .await
}

/// A purchase exists for the pair
pub async fn owns_game<'e, E>(executor: E, user_id: i64, game_id: i64) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM purchases WHERE user_id = $1 AND game_id = $2)",
    )
    .bind(user_id)
    .bind(game_id)
    .fetch_one(executor)
    .await
}

pub async fn in_cart<'e, E>(executor: E, user_id: i64, game_id: i64) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM cart_items WHERE user_id = $1 AND game_id = $2)",
    )
    .bind(user_id)
    .bind(game_id)
    .fetch_one(executor)
    .await
}

pub async fn in_wishlist<'e, E>(
    executor: E,
    user_id: i64,
    game_id: i64,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM wishlist_items WHERE user_id = $1 AND game_id = $2)",
    )
    .bind(user_id)
    .bind(game_id)
    .fetch_one(executor)
    .await
}

pub async fn cart_count<'e, E>(executor: E, user_id: i64) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

pub async fn wishlist_count<'e, E>(executor: E, user_id: i64) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM wishlist_items WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

/// Take the per-user row lock that serializes cart writes against checkout.
///
/// Returns false when the user row does not exist.
pub async fn lock_user<'e, E>(executor: E, user_id: i64) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(locked.is_some())
}

pub fn user_not_found(user_id: i64) -> DomainError {
    DomainError::NotFound(format!("user {}", user_id))
}
